//! Emacs Org-mode outlines.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{Stash, base_metadata, builtin, rewrite, rules, theme_class};

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\*+)\s+(.*)$").unwrap());
static TODO_STATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(TODO|DONE)\s+").unwrap());
static KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\+(\w+):\s*(.*)$").unwrap());
static DRAWER_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:([^:\s]+):\s+(.*)$").unwrap());
static DESCRIBED_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\[([^\]]+)\]\]").unwrap());
static BARE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (
            r"(^|[\s(])\*([^\s*](?:[^*]*[^\s*])?)\*",
            "${1}<span class='org-bold'>${2}</span>",
        ),
        (
            r"(^|[\s(])/([^\s/](?:[^/]*[^\s/])?)/",
            "${1}<span class='org-italic'>${2}</span>",
        ),
        (
            r"(^|[\s(])_([^\s_](?:[^_]*[^\s_])?)_",
            "${1}<span class='org-underline'>${2}</span>",
        ),
        (
            r"(^|[\s(])\+([^\s+](?:[^+]*[^\s+])?)\+",
            "${1}<span class='org-strikethrough'>${2}</span>",
        ),
        (
            r"(^|[\s(])=([^\s=](?:[^=]*[^\s=])?)=",
            "${1}<span class='org-verbatim'>${2}</span>",
        ),
        (
            r"(^|[\s(])~([^\s~](?:[^~]*[^\s~])?)~",
            "${1}<span class='org-code'>${2}</span>",
        ),
    ])
});

/// An outline heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgHeading {
    pub level: usize,
    pub title: String,
    pub todo: Option<String>,
}

/// All headings in document order.
#[must_use]
pub fn headings(content: &str) -> Vec<OrgHeading> {
    content
        .lines()
        .filter_map(|line| HEADING.captures(line))
        .map(|caps| {
            let title = caps[2].trim();
            let todo = TODO_STATE.captures(title).map(|t| t[1].to_owned());
            OrgHeading {
                level: caps[1].len(),
                title: title.to_owned(),
                todo,
            }
        })
        .collect()
}

/// `#+KEY: value` keywords and `:KEY: value` drawer properties.
#[must_use]
pub fn properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for line in content.lines() {
        if let Some(caps) = KEYWORD.captures(line) {
            let key = &caps[1];
            if !key.starts_with("BEGIN_") && !key.starts_with("END_") {
                properties.insert(key.to_owned(), caps[2].trim().to_owned());
            }
        } else if let Some(caps) = DRAWER_PROPERTY.captures(line) {
            let key = &caps[1];
            if key != "END" && key != "PROPERTIES" {
                properties.insert(key.to_owned(), caps[2].trim().to_owned());
            }
        }
    }
    properties
}

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = DESCRIBED_LINK.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!(
            "<a href='{}' class='org-link'>{}</a>",
            escape_html(&caps[1]),
            escape_html(&caps[2])
        ))
    });
    let text = BARE_LINK.replace_all(&text, |caps: &Captures<'_>| {
        let url = escape_html(&caps[1]);
        stash.put(format!("<a href='{url}' class='org-link'>{url}</a>"))
    });
    stash.restore(&rewrite(&EMPHASIS, &escape_html(&text)))
}

fn property_html(key: &str, value: &str) -> String {
    format!(
        "<div class='org-property'><span class='org-property-key'>{}:</span> <span class='org-property-value'>{}</span></div>",
        escape_html(key),
        inline(value)
    )
}

fn body_html(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut block: Option<Vec<String>> = None;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(lines) = block.as_mut() {
            if trimmed.to_ascii_uppercase().starts_with("#+END_") {
                out.push(format!("<div class='org-block-content'>{}</div></div>", lines.join("\n")));
                block = None;
            } else {
                lines.push(escape_html(line));
            }
            continue;
        }

        if trimmed.to_ascii_uppercase().starts_with("#+BEGIN_") {
            out.push(format!(
                "<div class='org-block'><div class='org-block-header'>{}</div>",
                escape_html(trimmed)
            ));
            block = Some(Vec::new());
        } else if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len();
            let title = caps[2].trim();
            let (todo, title) = match TODO_STATE.captures(title) {
                Some(state) => {
                    let keyword = state[1].to_owned();
                    (Some(keyword), &title[state[0].len()..])
                }
                None => (None, title),
            };
            let marker = todo.map_or_else(String::new, |state| {
                format!(
                    "<span class='org-todo org-{}'>{state}</span> ",
                    state.to_ascii_lowercase()
                )
            });
            out.push(format!(
                "<div class='org-heading org-heading-{level}'>{marker}{}</div>",
                inline(title)
            ));
        } else if let Some(caps) = KEYWORD.captures(line) {
            out.push(property_html(&caps[1], &caps[2]));
        } else if let Some(caps) = DRAWER_PROPERTY.captures(line) {
            out.push(property_html(&caps[1], &caps[2]));
        } else if trimmed == ":PROPERTIES:" || trimmed == ":END:" {
            continue;
        } else if trimmed.is_empty() {
            out.push("<br>".to_owned());
        } else {
            out.push(format!("<p>{}</p>", inline(line)));
        }
    }

    if let Some(lines) = block {
        out.push(format!("<div class='org-block-content'>{}</div></div>", lines.join("\n")));
    }
    out.join("\n")
}

/// Parser for Org-mode files.
pub struct OrgModeParser {
    format: &'static TextFormat,
}

impl OrgModeParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::ORGMODE),
        }
    }

    fn themed(content: &str, light_mode: bool) -> String {
        format!(
            "<div class='org-mode-document {}'>{}{}</div>",
            theme_class(light_mode),
            stylesheet(ids::ORGMODE, light_mode),
            body_html(content)
        )
    }
}

impl Default for OrgModeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for OrgModeParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let headings = headings(content);
        let mut metadata = base_metadata(content, options);
        metadata.insert("headings".to_owned(), headings.len().to_string());
        metadata.insert(
            "todos".to_owned(),
            headings.iter().filter(|h| h.todo.is_some()).count().to_string(),
        );
        metadata.insert("properties".to_owned(), properties(content).len().to_string());
        metadata.insert(
            "max_level".to_owned(),
            headings.iter().map(|h| h.level).max().unwrap_or(0).to_string(),
        );
        ParsedDocument::new(self.format.clone(), content, Self::themed(content, true))
            .with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let (mut begins, mut ends) = (0usize, 0usize);
        for line in content.lines() {
            let upper = line.trim_start().to_ascii_uppercase();
            if upper.starts_with("#+BEGIN_") {
                begins += 1;
            } else if upper.starts_with("#+END_") {
                ends += 1;
            }
        }
        if begins != ends {
            errors.push("Mismatched block delimiters".to_owned());
        }
        for heading in headings(content) {
            if heading.level > 6 {
                errors.push(format!(
                    "Heading level {} exceeds maximum of 6",
                    heading.level
                ));
            }
        }
        errors
    }

    fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
        Self::themed(document.raw_content(), light_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "#+TITLE: Plans\n* TODO Write docs\n** DONE Outline\n:PROPERTIES:\n:OWNER: ada\n:END:\n*** Notes with *bold* and /italic/\n#+BEGIN_SRC rust\nfn main() {}\n#+END_SRC\n";

    #[test]
    fn test_metadata() {
        let doc = OrgModeParser::new().parse(SAMPLE, &ParseOptions::default());
        assert_eq!(doc.meta("headings"), Some("3"));
        assert_eq!(doc.meta("todos"), Some("2"));
        assert_eq!(doc.meta("properties"), Some("2"));
        assert_eq!(doc.meta("max_level"), Some("3"));
    }

    #[test]
    fn test_headings_and_todo_markers() {
        let html = body_html(SAMPLE);
        assert!(html.contains(
            "<div class='org-heading org-heading-1'><span class='org-todo org-todo'>TODO</span> Write docs</div>"
        ));
        assert!(html.contains("<span class='org-todo org-done'>DONE</span> Outline"));
        assert!(html.contains("<span class='org-bold'>bold</span>"));
        assert!(html.contains("<span class='org-italic'>italic</span>"));
    }

    #[test]
    fn test_blocks_are_escaped() {
        let html = body_html("#+BEGIN_EXAMPLE\n<tag> *x*\n#+END_EXAMPLE");
        assert!(html.contains("<div class='org-block-header'>#+BEGIN_EXAMPLE</div>"));
        assert!(html.contains("<div class='org-block-content'>&lt;tag&gt; *x*</div>"));
    }

    #[test]
    fn test_links() {
        let html = body_html("See [[https://orgmode.org][Org]] and [[file.org]]");
        assert!(html.contains("<a href='https://orgmode.org' class='org-link'>Org</a>"));
        assert!(html.contains("<a href='file.org' class='org-link'>file.org</a>"));
    }

    #[test]
    fn test_theme_switch() {
        let parser = OrgModeParser::new();
        let doc = parser.parse("* A", &ParseOptions::default());
        assert!(parser.to_html(&doc, false).starts_with("<div class='org-mode-document dark'>"));
        assert!(parser.to_html(&doc, true).starts_with("<div class='org-mode-document light'>"));
    }

    #[test]
    fn test_validate() {
        let parser = OrgModeParser::new();
        assert!(parser.validate(SAMPLE).is_empty());
        assert_eq!(
            parser.validate("#+BEGIN_SRC\ncode\n******* deep"),
            vec![
                "Mismatched block delimiters",
                "Heading level 7 exceeds maximum of 6"
            ]
        );
    }
}
