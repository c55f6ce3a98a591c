//! AsciiDoc documents.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{
    ListStack, Stash, base_metadata, builtin, line_error, rewrite, rules, theme_class,
};

const ADMONITIONS: &[&str] = &["NOTE", "TIP", "IMPORTANT", "WARNING", "CAUTION"];

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([\w-]+!?):\s*(.*)$").unwrap());
static TAGGED_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//\s*@([\w-]+):\s*(.*)$").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(={1,6})\s+(.+)$").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\*+)\s+(.+)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\.+)\s+(.+)$").unwrap());
static SOURCE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[source(?:,\s*([\w+#-]+))?.*\]$").unwrap());
static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"include::[^\[\s]+\[[^\]]*\]").unwrap());
static LINK_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"link:[^\[\s]+\[[^\]]*\]").unwrap());

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"image::?([^\[\s]+)\[([^\]]*)\]").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:link:([^\[\s]+)|((?:https?://|ftp://|mailto:)[^\[\s]+))\[([^\]]*)\]").unwrap()
});
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"(^|[\s(])\*([^\s*](?:[^*]*[^\s*])?)\*", "${1}<strong>${2}</strong>"),
        (r"(^|[\s(])_([^\s_](?:[^_]*[^\s_])?)_", "${1}<em>${2}</em>"),
        (r"(^|[\s(])#([^\s#](?:[^#]*[^\s#])?)#", "${1}<mark>${2}</mark>"),
        (r"\^([^\s^]+)\^", "<sup>$1</sup>"),
        (r"~([^\s~]+)~", "<sub>$1</sub>"),
    ])
});

/// Header attributes, the document title and `// @key: value` comments.
#[must_use]
pub fn header_metadata(content: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for line in content.lines() {
        if let Some(caps) = ATTRIBUTE.captures(line) {
            metadata.insert(caps[1].to_owned(), caps[2].trim().to_owned());
        } else if let Some(caps) = TAGGED_COMMENT.captures(line) {
            metadata.insert(caps[1].to_owned(), caps[2].trim().to_owned());
        } else if let Some(title) = line.strip_prefix("= ")
            && !metadata.contains_key("title")
        {
            metadata.insert("title".to_owned(), title.trim().to_owned());
        }
    }
    metadata
}

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = CODE.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<code>{}</code>", escape_html(&caps[1])))
    });
    let text = IMAGE.replace_all(&text, |caps: &Captures<'_>| {
        let src = escape_html(&caps[1]);
        let alt = match caps[2].trim() {
            "" => src.clone(),
            alt => escape_html(alt),
        };
        stash.put(format!("<img src='{src}' alt='{alt}'/>"))
    });
    let text = LINK.replace_all(&text, |caps: &Captures<'_>| {
        let target = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let target = escape_html(target);
        let label = match caps[3].trim() {
            "" => target.clone(),
            label => escape_html(label),
        };
        stash.put(format!("<a href='{target}'>{label}</a>"))
    });
    stash.restore(&rewrite(&EMPHASIS, &escape_html(&text)))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Delimited {
    Listing,
    Literal,
    Comment,
}

impl Delimited {
    fn from_line(line: &str) -> Option<Self> {
        match line {
            "----" => Some(Self::Listing),
            "...." => Some(Self::Literal),
            "////" => Some(Self::Comment),
            _ => None,
        }
    }
}

fn body_html(content: &str) -> String {
    let mut out = String::new();
    let mut lists = ListStack::default();
    let mut paragraph: Vec<String> = Vec::new();
    let mut block: Option<Delimited> = None;
    let mut language: Option<String> = None;

    let flush = |out: &mut String, paragraph: &mut Vec<String>| {
        if !paragraph.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for raw in content.lines() {
        let line = raw.trim_end();

        if let Some(open) = block {
            if Delimited::from_line(line.trim()) == Some(open) {
                if open != Delimited::Comment {
                    out.push_str("</code></pre>\n");
                }
                block = None;
            } else if open != Delimited::Comment {
                out.push_str(&escape_html(raw));
                out.push('\n');
            }
            continue;
        }

        if let Some(kind) = Delimited::from_line(line.trim()) {
            flush(&mut out, &mut paragraph);
            lists.close(&mut out);
            if kind != Delimited::Comment {
                match language.take() {
                    Some(lang) => out.push_str(&format!(
                        "<pre><code class='language-{}'>",
                        escape_html(&lang)
                    )),
                    None => out.push_str("<pre><code>"),
                }
            }
            block = Some(kind);
            continue;
        }

        if line.trim().is_empty() {
            flush(&mut out, &mut paragraph);
            lists.close(&mut out);
            continue;
        }

        if let Some(caps) = SOURCE_ATTR.captures(line) {
            language = caps.get(1).map(|m| m.as_str().to_owned());
            continue;
        }
        if ATTRIBUTE.is_match(line) || line.starts_with("//") {
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            flush(&mut out, &mut paragraph);
            lists.close(&mut out);
            let level = caps[1].len();
            out.push_str(&format!("<h{level}>{}</h{level}>\n", inline(&caps[2])));
        } else if let Some((label, text)) = line.split_once(": ")
            && ADMONITIONS.contains(&label)
        {
            flush(&mut out, &mut paragraph);
            lists.close(&mut out);
            let kind = label.to_ascii_lowercase();
            let mut title = kind.clone();
            if let Some(first) = title.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            out.push_str(&format!(
                "<div class='admonition {kind}'><span class='admonition-title'>{title}:</span> {}</div>\n",
                inline(text.trim())
            ));
        } else if let Some(caps) = BULLET.captures(line) {
            flush(&mut out, &mut paragraph);
            lists.enter(&mut out, "ul", caps[1].len());
            out.push_str(&format!("<li>{}</li>", inline(&caps[2])));
        } else if let Some(caps) = NUMBERED.captures(line) {
            flush(&mut out, &mut paragraph);
            lists.enter(&mut out, "ol", caps[1].len());
            out.push_str(&format!("<li>{}</li>", inline(&caps[2])));
        } else if line.trim() == "'''" {
            flush(&mut out, &mut paragraph);
            lists.close(&mut out);
            out.push_str("<hr>\n");
        } else {
            lists.close(&mut out);
            paragraph.push(inline(line.trim()));
        }
    }

    flush(&mut out, &mut paragraph);
    lists.close(&mut out);
    if block.is_some_and(|open| open != Delimited::Comment) {
        out.push_str("</code></pre>\n");
    }
    out
}

/// Parser for AsciiDoc files.
pub struct AsciidocParser {
    format: &'static TextFormat,
}

impl AsciidocParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::ASCIIDOC),
        }
    }

    fn themed(content: &str, light_mode: bool) -> String {
        format!(
            "<div class='asciidoc-document {}'>{}{}</div>",
            theme_class(light_mode),
            stylesheet(ids::ASCIIDOC, light_mode),
            body_html(content)
        )
    }
}

impl Default for AsciidocParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for AsciidocParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let mut metadata = header_metadata(content);
        metadata.extend(base_metadata(content, options));
        ParsedDocument::new(self.format.clone(), content, Self::themed(content, true))
            .with_metadata(metadata)
            .with_errors(self.validate(content))
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let mut block: Option<Delimited> = None;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if let Some(kind) = Delimited::from_line(trimmed) {
                match block {
                    Some(open) if open == kind => block = None,
                    Some(_) => {}
                    None => block = Some(kind),
                }
                continue;
            }
            if block.is_some() {
                continue;
            }

            if line.contains("include::") && !INCLUDE.is_match(line) {
                errors.push(line_error(index, "Malformed include directive"));
            }
            if line.contains("link:") && !LINK_MACRO.is_match(line) {
                errors.push(line_error(index, "Malformed link directive"));
            }
        }

        match block {
            Some(Delimited::Comment) => errors.push("Unclosed comment block".to_owned()),
            Some(_) => errors.push("Unclosed code block".to_owned()),
            None => {}
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

    const GUIDE: &str = "= User Guide\n:author: Ada\n:version: 1.2\n// @status: review\n\n== Install\n\nRun the *installer* with _care_.\nSee link:docs.html[the docs].\n\nNOTE: Requires admin rights.\n\n* one\n** nested\n. first\n\n[source,rust]\n----\nfn main() {}\n----\n\n////\nhidden\n////\n";

    #[test]
    fn test_header_metadata() {
        let metadata = header_metadata(GUIDE);
        assert_eq!(metadata["title"], "User Guide");
        assert_eq!(metadata["author"], "Ada");
        assert_eq!(metadata["version"], "1.2");
        assert_eq!(metadata["status"], "review");
    }

    #[test]
    fn test_body() {
        let html = body_html(GUIDE);
        assert!(html.contains("<h1>User Guide</h1>"));
        assert!(html.contains("<h2>Install</h2>"));
        assert!(html.contains(
            "<p>Run the <strong>installer</strong> with <em>care</em>. See <a href='docs.html'>the docs</a>.</p>"
        ));
        assert!(html.contains(
            "<div class='admonition note'><span class='admonition-title'>Note:</span> Requires admin rights.</div>"
        ));
        assert!(html.contains("<ul><li>one</li><ul><li>nested</li></ul></ul><ol><li>first</li></ol>"));
        assert!(html.contains("<pre><code class='language-rust'>fn main() {}\n</code></pre>"));
        assert!(!html.contains("hidden"));
        assert!(!html.contains(":author:"));
    }

    #[test]
    fn test_parse_clean_document() {
        let doc = AsciidocParser::new().parse(GUIDE, &ParseOptions::default());
        assert!(doc.errors().is_empty());
        assert!(doc.parsed_content().starts_with("<div class='asciidoc-document light'>"));
        assert_eq!(doc.meta("title"), Some("User Guide"));
    }

    #[test]
    fn test_validate_directives() {
        let errors = AsciidocParser::new().validate("include::chapter.adoc\nlink:http://x\ninclude::ok.adoc[]");
        assert_eq!(
            errors,
            vec![
                "Line 1: Malformed include directive",
                "Line 2: Malformed link directive",
            ]
        );
    }

    #[test]
    fn test_validate_unclosed_blocks() {
        let parser = AsciidocParser::new();
        assert_eq!(parser.validate("----\ncode"), vec!["Unclosed code block"]);
        assert_eq!(parser.validate("////\nnote"), vec!["Unclosed comment block"]);
        assert!(parser.validate("----\ninclude::broken\n----").is_empty());
    }
}
