//! Shared per-format stylesheets.
//!
//! A theme block defines CSS custom properties; format rules only reference
//! the properties, so one set of rules serves both themes.

/// Theme variables for light mode.
const LIGHT: &str = ":root { --q-bg: #ffffff; --q-fg: #1f2328; --q-muted: #656d76; \
--q-accent: #0969da; --q-heading: #4e9a06; --q-code-bg: #f6f8fa; --q-border: #d0d7de; \
--q-warn: #9a6700; --q-error: #cf222e; --q-ok: #1a7f37; }";

/// Theme variables for dark mode.
const DARK: &str = ":root { --q-bg: #0d1117; --q-fg: #e6edf3; --q-muted: #8d96a0; \
--q-accent: #4493f8; --q-heading: #7ee787; --q-code-bg: #161b22; --q-border: #30363d; \
--q-warn: #d29922; --q-error: #f85149; --q-ok: #3fb950; }";

/// Rules used by every document wrapper.
const BASE: &str = ".light, .dark { background: var(--q-bg); color: var(--q-fg); } \
pre, code { font-family: 'SF Mono', Monaco, Consolas, monospace; background: var(--q-code-bg); } \
pre { padding: 12px; overflow-x: auto; border-radius: 6px; } \
a { color: var(--q-accent); text-decoration: none; } \
table { border-collapse: collapse; } th, td { border: 1px solid var(--q-border); padding: 6px 12px; }";

fn rules(format_id: &str) -> &'static str {
    match format_id {
        "markdown" => ".markdown { line-height: 1.6; } .markdown h1, .markdown h2 { border-bottom: 1px solid var(--q-border); } \
.markdown blockquote { border-left: 4px solid var(--q-border); color: var(--q-muted); padding: 0 1em; }",
        "wikitext" => ".wikitext h1, .wikitext h2, .wikitext h3, .wikitext h4, .wikitext h5, .wikitext h6 { color: var(--q-heading); } \
.wikitext .checklist { list-style: none; } .wikitext .checked { color: var(--q-ok); } .wikitext .crossed { color: var(--q-error); text-decoration: line-through; } \
.wikitext .highlight { background: var(--q-warn); }",
        "todotxt" => ".todotxt .task { padding: 4px 0; } .todotxt .done { color: var(--q-muted); text-decoration: line-through; } \
.todotxt .overdue .due-date { color: var(--q-error); } .todotxt .due-today .due-date { color: var(--q-warn); } \
.todotxt .priority { font-weight: bold; } .todotxt .project { color: var(--q-accent); } .todotxt .context { color: var(--q-ok); }",
        "csv" => ".csv-table th { background: var(--q-code-bg); font-weight: 600; }",
        "orgmode" => ".org-heading { color: var(--q-heading); } .org-todo { color: var(--q-error); font-weight: bold; } \
.org-done { color: var(--q-ok); font-weight: bold; } .org-property { color: var(--q-muted); }",
        "creole" | "textile" | "tiddlywiki" => "h1, h2, h3, h4, h5, h6 { color: var(--q-heading); } blockquote { color: var(--q-muted); }",
        "latex" => ".latex-document { font-family: 'Latin Modern Roman', Georgia, serif; line-height: 1.7; } \
.latex-title { text-align: center; } .latex-author, .latex-date { text-align: center; color: var(--q-muted); } \
.latex-math { font-style: italic; color: var(--q-accent); }",
        "asciidoc" => ".asciidoc-document h1, .asciidoc-document h2, .asciidoc-document h3 { color: var(--q-heading); } \
.admonition { border-left: 4px solid var(--q-accent); padding: 8px 12px; margin: 12px 0; } \
.admonition.warning, .admonition.caution { border-color: var(--q-error); } .admonition-title { font-weight: bold; }",
        "restructuredtext" => ".rst-section { color: var(--q-heading); } \
.rst-directive { border: 1px solid var(--q-border); border-radius: 4px; padding: 12px; margin: 12px 0; } \
.rst-directive-header { font-family: monospace; color: var(--q-accent); }",
        "keyvalue" => ".keyvalue .section { color: var(--q-warn); font-weight: bold; } .keyvalue .comment { color: var(--q-ok); } \
.keyvalue .key { font-weight: bold; }",
        "taskpaper" => ".taskpaper-project { font-weight: bold; color: var(--q-heading); } .taskpaper-task-done { color: var(--q-muted); text-decoration: line-through; } \
.taskpaper-note { color: var(--q-muted); font-style: italic; } .taskpaper-tag { color: var(--q-accent); } \
.taskpaper-tag-done { color: var(--q-ok); } .taskpaper-tag-today { color: var(--q-warn); }",
        "jupyter" => ".notebook .cell { border: 1px solid var(--q-border); border-radius: 4px; margin: 12px 0; } \
.notebook .prompt { color: var(--q-muted); font-family: monospace; padding: 4px 8px; } .notebook .output { border-top: 1px dashed var(--q-border); } \
.notebook .error { color: var(--q-error); }",
        "rmarkdown" => ".rmarkdown-header { border-bottom: 1px solid var(--q-border); } .code-chunk { border-left: 3px solid var(--q-accent); } \
.chunk-label { color: var(--q-muted); font-family: monospace; font-size: 0.85em; }",
        "binary" => ".binary-preview { border: 1px solid var(--q-border); border-radius: 8px; padding: 16px; max-width: 480px; } \
.binary-preview dt { color: var(--q-muted); }",
        _ => "",
    }
}

/// Complete `<style>` block for a format and theme.
pub(crate) fn stylesheet(format_id: &str, light_mode: bool) -> String {
    let theme = if light_mode { LIGHT } else { DARK };
    format!("<style>{theme} {BASE} {}</style>", rules(format_id))
}
