//! Plain text and source files.
//!
//! The filename extension decides how content is shown: raw HTML, a code
//! block tagged with its language, pretty-printed JSON, or preformatted text.

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};

use crate::util::{base_metadata, builtin};

/// How plaintext content is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaintextKind {
    Plain,
    Html,
    Code,
    Json,
    Xml,
    Markdown,
}

impl PlaintextKind {
    /// Classify by lowercase extension (with leading dot).
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".html" | ".htm" => Self::Html,
            ".json" => Self::Json,
            ".xml" | ".xlf" => Self::Xml,
            ".md" | ".markdown" => Self::Markdown,
            _ if code_language(extension).is_some() => Self::Code,
            _ => Self::Plain,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Html => "html",
            Self::Code => "code",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Markdown => "markdown",
        }
    }
}

/// Highlighting language for a source extension.
fn code_language(extension: &str) -> Option<&'static str> {
    let language = match extension {
        ".py" => "python",
        ".js" | ".mjs" => "javascript",
        ".ts" => "typescript",
        ".java" => "java",
        ".kt" => "kotlin",
        ".c" => "c",
        ".cpp" | ".cc" | ".cxx" | ".h" | ".hpp" | ".mm" => "cpp",
        ".cs" => "csharp",
        ".rb" => "ruby",
        ".php" => "php",
        ".swift" => "swift",
        ".rs" => "rust",
        ".go" => "go",
        ".sh" | ".bash" => "bash",
        ".css" => "css",
        ".sql" => "sql",
        ".yaml" | ".yml" => "yaml",
        ".r" => "r",
        ".lua" => "lua",
        ".perl" | ".pl" => "perl",
        ".diff" | ".patch" => "diff",
        ".qml" => "qml",
        ".groovy" => "groovy",
        ".scala" => "scala",
        ".dart" => "dart",
        ".xml" | ".xlf" => "xml",
        ".json" => "json",
        _ => return None,
    };
    Some(language)
}

/// Parser for plain text and source files.
pub struct PlaintextParser {
    format: &'static TextFormat,
}

impl PlaintextParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::PLAINTEXT),
        }
    }
}

impl Default for PlaintextParser {
    fn default() -> Self {
        Self::new()
    }
}

fn preformatted(content: &str) -> String {
    format!(
        "<div class='plaintext'><pre style='white-space: pre-wrap; font-family: monospace;'>{}</pre></div>",
        escape_html(content)
    )
}

/// Code view. `highlighting` marks the block for a client-side highlighter;
/// `line_numbers` prefixes each line with a numbered gutter span.
fn code_block(language: &str, content: &str, options: &ParseOptions) -> String {
    let pre_class = match (options.highlighting(), options.line_numbers()) {
        (true, true) => " class='highlight line-numbers'",
        (true, false) => " class='highlight'",
        (false, true) => " class='line-numbers'",
        (false, false) => "",
    };
    let body = if options.line_numbers() {
        content
            .lines()
            .enumerate()
            .map(|(index, line)| {
                format!("<span class='line-number'>{}</span>{}", index + 1, escape_html(line))
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        escape_html(content)
    };
    format!(
        "<div class='plaintext code-block'><pre{pre_class}><code class='language-{language}'>{body}</code></pre></div>"
    )
}

impl TextParser for PlaintextParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let extension = options.extension();
        let kind = PlaintextKind::from_extension(&extension);
        let mut errors = Vec::new();

        let shown = match kind {
            PlaintextKind::Json => {
                match serde_json::from_str::<serde_json::Value>(content)
                    .and_then(|value| serde_json::to_string_pretty(&value))
                {
                    Ok(pretty) => pretty,
                    Err(err) => {
                        errors.push(format!("Invalid JSON: {err}"));
                        content.to_owned()
                    }
                }
            }
            _ => content.to_owned(),
        };

        let html = match kind {
            PlaintextKind::Html => shown.clone(),
            PlaintextKind::Code | PlaintextKind::Json | PlaintextKind::Xml => {
                code_block(code_language(&extension).unwrap_or("plaintext"), &shown, options)
            }
            PlaintextKind::Plain | PlaintextKind::Markdown => preformatted(&shown),
        };

        let mut metadata = base_metadata(&shown, options);
        metadata.insert("type".to_owned(), kind.as_str().to_owned());
        metadata.insert("characters".to_owned(), shown.chars().count().to_string());

        ParsedDocument::new(self.format.clone(), content, html)
            .with_metadata(metadata)
            .with_errors(errors)
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_as(filename: &str, content: &str) -> ParsedDocument {
        let options = ParseOptions::create().set_filename(filename).build();
        PlaintextParser::new().parse(content, &options)
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(PlaintextKind::from_extension(".txt"), PlaintextKind::Plain);
        assert_eq!(PlaintextKind::from_extension(".htm"), PlaintextKind::Html);
        assert_eq!(PlaintextKind::from_extension(".rs"), PlaintextKind::Code);
        assert_eq!(PlaintextKind::from_extension(".json"), PlaintextKind::Json);
        assert_eq!(PlaintextKind::from_extension(".xml"), PlaintextKind::Xml);
        assert_eq!(PlaintextKind::from_extension(""), PlaintextKind::Plain);
    }

    #[test]
    fn test_plain_is_escaped() {
        let doc = parse_as("notes.txt", "a < b & c");
        assert!(doc.parsed_content().contains("a &lt; b &amp; c"));
        assert_eq!(doc.meta("type"), Some("plain"));
        assert_eq!(doc.meta("characters"), Some("9"));
    }

    #[test]
    fn test_code_block_language() {
        let doc = parse_as("main.rs", "fn main() {}");
        assert!(doc.parsed_content().contains("class='language-rust'"));
        assert_eq!(doc.meta("type"), Some("code"));
    }

    #[test]
    fn test_code_block_honors_rendering_flags() {
        let plain = parse_as("main.rs", "a\nb");
        assert!(plain.parsed_content().contains("<pre><code class='language-rust'>a\nb</code>"));

        let options = ParseOptions::create()
            .set_filename("main.rs")
            .enable_line_numbers(true)
            .enable_highlighting(true)
            .build();
        let doc = PlaintextParser::new().parse("a < b\nc", &options);
        assert!(doc.parsed_content().contains(
            "<pre class='highlight line-numbers'><code class='language-rust'>\
             <span class='line-number'>1</span>a &lt; b\n<span class='line-number'>2</span>c</code>"
        ));
    }

    #[test]
    fn test_json_pretty_printed() {
        let doc = parse_as("data.json", r#"{"a":[1,2]}"#);
        assert_eq!(doc.meta("type"), Some("json"));
        assert!(doc.parsed_content().contains("language-json"));
        assert!(doc.parsed_content().contains("&quot;a&quot;: ["));
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn test_invalid_json_kept_with_error() {
        let doc = parse_as("data.json", "{oops");
        assert!(doc.parsed_content().contains("{oops"));
        assert_eq!(doc.errors().len(), 1);
        assert!(doc.errors()[0].starts_with("Invalid JSON"));
    }

    #[test]
    fn test_html_shown_as_is() {
        let doc = parse_as("page.html", "<p>hi</p>");
        assert_eq!(doc.parsed_content(), "<p>hi</p>");
    }
}
