//! reStructuredText documents.

use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{Stash, base_metadata, builtin, rewrite, rules, theme_class};

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+([\w:+-]+?)::\s*(.*)$").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*+]\s+(.+)$").unwrap());
static ENUMERATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+|#)[.)]\s+(.+)$").unwrap());

static LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"``(.+?)``").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`<]+?)\s*<([^>]+)>`__?").unwrap());
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"\*\*([^*]+)\*\*", "<strong>$1</strong>"),
        (r"\*([^*\s][^*]*)\*", "<em>$1</em>"),
        (r"`([^`]+)`", "<cite>$1</cite>"),
    ])
});

/// A section title with its underline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RstSection {
    pub level: usize,
    pub title: String,
    pub underline: String,
}

/// A `.. name::` directive and its indented body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RstDirective {
    pub name: String,
    pub argument: String,
    pub body: String,
}

/// A run of one repeated punctuation character, at least two long.
fn is_underline(line: &str) -> bool {
    let line = line.trim_end();
    let mut chars = line.chars();
    match chars.next() {
        Some(first) if first.is_ascii_punctuation() => {
            line.len() >= 2 && chars.all(|c| c == first)
        }
        _ => false,
    }
}

fn section_level(underline: &str) -> usize {
    match underline.chars().next() {
        Some('=') => 1,
        Some('-') => 2,
        Some('~') => 3,
        Some('^') => 4,
        Some('"') => 5,
        _ => 6,
    }
}

fn section_at(lines: &[&str], index: usize) -> Option<RstSection> {
    let title = lines.get(index)?.trim();
    let underline = lines.get(index + 1)?.trim_end();
    if title.is_empty() || is_underline(title) || !is_underline(underline) {
        return None;
    }
    Some(RstSection {
        level: section_level(underline),
        title: title.to_owned(),
        underline: underline.to_owned(),
    })
}

/// Every section in document order.
#[must_use]
pub fn sections(content: &str) -> Vec<RstSection> {
    let lines: Vec<&str> = content.lines().collect();
    let mut found = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        if let Some(section) = section_at(&lines, index) {
            found.push(section);
            index += 2;
        } else {
            index += 1;
        }
    }
    found
}

fn indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Every directive in document order.
#[must_use]
pub fn directives(content: &str) -> Vec<RstDirective> {
    let lines: Vec<&str> = content.lines().collect();
    let mut found = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        let Some(caps) = DIRECTIVE.captures(lines[index]) else {
            index += 1;
            continue;
        };
        index += 1;
        let start = index;
        while index < lines.len() && (indented(lines[index]) || lines[index].trim().is_empty()) {
            index += 1;
        }
        let body: Vec<&str> = lines[start..index].iter().map(|l| l.trim()).collect();
        found.push(RstDirective {
            name: caps[1].to_owned(),
            argument: caps[2].trim().to_owned(),
            body: body.join("\n").trim().to_owned(),
        });
    }
    found
}

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = LITERAL.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<code>{}</code>", escape_html(&caps[1])))
    });
    let text = LINK.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!(
            "<a href='{}'>{}</a>",
            escape_html(caps[2].trim()),
            escape_html(caps[1].trim())
        ))
    });
    stash.restore(&rewrite(&EMPHASIS, &escape_html(&text)))
}

fn body_html(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut list: Option<&'static str> = None;
    let mut index = 0;

    let flush = |out: &mut Vec<String>, paragraph: &mut Vec<String>| {
        if !paragraph.is_empty() {
            out.push(format!("<p>{}</p>", paragraph.join(" ")));
            paragraph.clear();
        }
    };
    let close = |out: &mut Vec<String>, list: &mut Option<&'static str>| {
        if let Some(tag) = list.take() {
            out.push(format!("</{tag}>"));
        }
    };

    while index < lines.len() {
        let line = lines[index];

        if let Some(caps) = DIRECTIVE.captures(line) {
            flush(&mut out, &mut paragraph);
            close(&mut out, &mut list);
            index += 1;
            let start = index;
            while index < lines.len() && (indented(lines[index]) || lines[index].trim().is_empty()) {
                index += 1;
            }
            let body: Vec<&str> = lines[start..index].iter().map(|l| l.trim()).collect();
            out.push(format!(
                "<div class='rst-directive rst-{}'><div class='rst-directive-header'>{}</div><div class='rst-directive-content'>{}</div></div>",
                escape_html(&caps[1]),
                escape_html(line.trim()),
                escape_html(body.join("\n").trim())
            ));
            continue;
        }

        if let Some(section) = section_at(&lines, index) {
            flush(&mut out, &mut paragraph);
            close(&mut out, &mut list);
            out.push(format!(
                "<div class='rst-section rst-section-{}'>{}</div>",
                section.level,
                inline(&section.title)
            ));
            index += 2;
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut out, &mut paragraph);
            close(&mut out, &mut list);
            index += 1;
            continue;
        }
        if trimmed.starts_with("..") {
            index += 1;
            continue;
        }

        let item = BULLET
            .captures(line)
            .map(|caps| ("ul", caps[1].to_owned()))
            .or_else(|| ENUMERATED.captures(line).map(|caps| ("ol", caps[1].to_owned())));
        if let Some((tag, text)) = item {
            flush(&mut out, &mut paragraph);
            if list != Some(tag) {
                close(&mut out, &mut list);
                out.push(format!("<{tag}>"));
                list = Some(tag);
            }
            out.push(format!("<li>{}</li>", inline(&text)));
            index += 1;
            continue;
        }

        close(&mut out, &mut list);
        index += 1;
        if let Some(text) = trimmed.strip_suffix("::") {
            if !text.trim().is_empty() {
                paragraph.push(inline(&format!("{}:", text.trim_end())));
            }
            flush(&mut out, &mut paragraph);
            while index < lines.len() && lines[index].trim().is_empty() {
                index += 1;
            }
            let start = index;
            while index < lines.len() && (indented(lines[index]) || lines[index].trim().is_empty()) {
                index += 1;
            }
            let block: Vec<&str> = lines[start..index].iter().map(|l| l.trim()).collect();
            out.push(format!("<pre>{}</pre>", escape_html(block.join("\n").trim_end())));
        } else {
            paragraph.push(inline(trimmed));
        }
    }

    flush(&mut out, &mut paragraph);
    close(&mut out, &mut list);
    out.join("\n")
}

/// Parser for reStructuredText files.
pub struct RestructuredTextParser {
    format: &'static TextFormat,
}

impl RestructuredTextParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::RESTRUCTUREDTEXT),
        }
    }

    fn themed(content: &str, light_mode: bool) -> String {
        format!(
            "<div class='rst-document {}'>{}{}</div>",
            theme_class(light_mode),
            stylesheet(ids::RESTRUCTUREDTEXT, light_mode),
            body_html(content)
        )
    }
}

impl Default for RestructuredTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for RestructuredTextParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let sections = sections(content);
        let mut metadata = base_metadata(content, options);
        metadata.insert("sections".to_owned(), sections.len().to_string());
        metadata.insert("directives".to_owned(), directives(content).len().to_string());
        metadata.insert(
            "max_level".to_owned(),
            sections.iter().map(|s| s.level).max().unwrap_or(0).to_string(),
        );
        ParsedDocument::new(self.format.clone(), content, Self::themed(content, true))
            .with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        sections(content)
            .into_iter()
            .filter(|s| s.underline.chars().count() < s.title.chars().count())
            .map(|s| format!("Section underline too short for '{}'", s.title))
            .collect()
    }

    fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
        Self::themed(document.raw_content(), light_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "Title\n=====\n\nIntro with **bold**, *em* and ``code``.\n\nPart\n----\n\n.. note:: Heads up\n   Indented body.\n\n- one\n- two\n\nExample::\n\n   let x = 1;\n\nSee `Docs <https://docs.rs>`_.\n";

    #[test]
    fn test_sections() {
        let found = sections(DOC);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "Title");
        assert_eq!(found[0].level, 1);
        assert_eq!(found[1].level, 2);
    }

    #[test]
    fn test_directives() {
        let found = directives(DOC);
        assert_eq!(
            found,
            vec![RstDirective {
                name: "note".to_owned(),
                argument: "Heads up".to_owned(),
                body: "Indented body.".to_owned(),
            }]
        );
    }

    #[test]
    fn test_metadata() {
        let doc = RestructuredTextParser::new().parse(DOC, &ParseOptions::default());
        assert_eq!(doc.meta("sections"), Some("2"));
        assert_eq!(doc.meta("directives"), Some("1"));
        assert_eq!(doc.meta("max_level"), Some("2"));
    }

    #[test]
    fn test_html() {
        let html = body_html(DOC);
        assert!(html.contains("<div class='rst-section rst-section-1'>Title</div>"));
        assert!(html.contains("<p>Intro with <strong>bold</strong>, <em>em</em> and <code>code</code>.</p>"));
        assert!(html.contains("<div class='rst-directive-header'>.. note:: Heads up</div>"));
        assert!(html.contains("<div class='rst-directive-content'>Indented body.</div>"));
        assert!(html.contains("<ul>\n<li>one</li>\n<li>two</li>\n</ul>"));
        assert!(html.contains("<p>Example:</p>\n<pre>let x = 1;</pre>"));
        assert!(html.contains("<a href='https://docs.rs'>Docs</a>"));
    }

    #[test]
    fn test_underline_rules() {
        assert!(is_underline("~~"));
        assert!(!is_underline("="));
        assert!(!is_underline("=-="));
        assert!(!is_underline("ab"));
    }

    #[test]
    fn test_validate() {
        let parser = RestructuredTextParser::new();
        assert!(parser.validate(DOC).is_empty());
        assert_eq!(
            parser.validate("Long title\n===="),
            vec!["Section underline too short for 'Long title'"]
        );
    }
}
