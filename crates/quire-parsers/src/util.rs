//! Helpers shared by the dialect parsers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use quire_core::ParseOptions;
use quire_format::TextFormat;
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap());

/// Catalog entry for a built-in format id.
pub(crate) fn builtin(id: &str) -> &'static TextFormat {
    TextFormat::builtin(id).unwrap_or_else(|| unreachable!("'{id}' is a built-in format id"))
}

/// Number of lines, counting a trailing empty line after a final newline.
pub(crate) fn line_count(content: &str) -> usize {
    content.split('\n').count()
}

/// Metadata every parser reports: `extension` and `lines`.
pub(crate) fn base_metadata(content: &str, options: &ParseOptions) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("extension".to_owned(), options.extension());
    metadata.insert("lines".to_owned(), line_count(content).to_string());
    metadata
}

/// CSS class for the theme.
pub(crate) fn theme_class(light_mode: bool) -> &'static str {
    if light_mode { "light" } else { "dark" }
}

/// Format a line diagnostic with a 1-based line number.
pub(crate) fn line_error(index: usize, message: impl std::fmt::Display) -> String {
    format!("Line {}: {message}", index + 1)
}

/// Count occurrences of a character.
pub(crate) fn count_char(s: &str, c: char) -> usize {
    s.chars().filter(|&x| x == c).count()
}

/// Apply `(pattern, replacement)` rewrites in order.
///
/// Replacements use `regex` expansion syntax (`$1`, `${name}`).
pub(crate) fn rewrite(rules: &[(Regex, &str)], text: &str) -> String {
    rules.iter().fold(text.to_owned(), |acc, (pattern, replacement)| {
        pattern.replace_all(&acc, *replacement).into_owned()
    })
}

/// Compile a rewrite table.
pub(crate) fn rules(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), *replacement))
        .collect()
}

/// Open list elements for dialects with marker-depth nesting (`**`, `##`).
#[derive(Default)]
pub(crate) struct ListStack {
    open: Vec<&'static str>,
}

impl ListStack {
    /// Adjust nesting so `depth` lists are open with `tag` innermost.
    pub(crate) fn enter(&mut self, out: &mut String, tag: &'static str, depth: usize) {
        while self.open.len() > depth {
            self.pop(out);
        }
        if self.open.len() == depth && self.open.last().is_some_and(|open| *open != tag) {
            self.pop(out);
        }
        while self.open.len() < depth {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            self.open.push(tag);
        }
    }

    /// Close every open list.
    pub(crate) fn close(&mut self, out: &mut String) {
        while !self.open.is_empty() {
            self.pop(out);
        }
    }

    fn pop(&mut self, out: &mut String) {
        if let Some(tag) = self.open.pop() {
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Inline markup rewriter that protects already-produced HTML.
///
/// Dialect inline syntaxes are applied as regex rewrites. Fragments that must
/// not be touched by later rules (code spans, links) are stashed and replaced
/// by private-use placeholders, then restored at the end.
#[derive(Default)]
pub(crate) struct Stash {
    parts: Vec<String>,
}

impl Stash {
    /// Remove placeholder delimiters from user text before any rule runs.
    pub(crate) fn scrub(text: &str) -> String {
        text.replace(['\u{E000}', '\u{E001}'], "")
    }

    /// Store `html` and return the placeholder standing in for it.
    pub(crate) fn put(&mut self, html: String) -> String {
        self.parts.push(html);
        format!("\u{E000}{}\u{E001}", self.parts.len() - 1)
    }

    /// Replace every placeholder in `text` with its stored HTML.
    pub(crate) fn restore(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.parts.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_owned())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("a"), 1);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count("a\n"), 2);
    }

    #[test]
    fn test_base_metadata() {
        let options = ParseOptions::create().set_filename("Notes.MD").build();
        let metadata = base_metadata("x\ny", &options);
        assert_eq!(metadata["extension"], ".md");
        assert_eq!(metadata["lines"], "2");
    }

    #[test]
    fn test_line_error() {
        assert_eq!(line_error(2, "Unclosed brackets"), "Line 3: Unclosed brackets");
    }

    #[test]
    fn test_rewrite_applies_in_order() {
        let table = rules(&[(r"\*\*([^*]+)\*\*", "<b>$1</b>"), (r"\*([^*]+)\*", "<i>$1</i>")]);
        assert_eq!(rewrite(&table, "**a** *b*"), "<b>a</b> <i>b</i>");
    }

    #[test]
    fn test_list_stack_nesting() {
        let mut out = String::new();
        let mut lists = ListStack::default();
        lists.enter(&mut out, "ul", 1);
        out.push_str("<li>a</li>");
        lists.enter(&mut out, "ul", 2);
        out.push_str("<li>b</li>");
        lists.enter(&mut out, "ol", 1);
        out.push_str("<li>c</li>");
        lists.close(&mut out);
        assert_eq!(
            out,
            "<ul><li>a</li><ul><li>b</li></ul></ul><ol><li>c</li></ol>"
        );
    }

    #[test]
    fn test_stash_roundtrip() {
        let mut stash = Stash::default();
        let a = stash.put("<code>x</code>".to_owned());
        let b = stash.put("<a href='y'>y</a>".to_owned());
        let text = format!("see {a} and {b}.");
        assert_eq!(
            stash.restore(&text),
            "see <code>x</code> and <a href='y'>y</a>."
        );
    }

    #[test]
    fn test_stash_scrub_strips_delimiters() {
        assert_eq!(Stash::scrub("a\u{E000}0\u{E001}b"), "a0b");
        assert_eq!(Stash::scrub("plain"), "plain");
    }

    #[test]
    fn test_stash_ignores_unterminated_marker() {
        let stash = Stash::default();
        assert_eq!(stash.restore("a\u{E000}9"), "a\u{E000}9");
    }
}
