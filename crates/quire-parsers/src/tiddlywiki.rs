//! TiddlyWiki tiddlers (`.tid`).
//!
//! A tiddler opens with `key: value` fields up to the first blank line,
//! followed by wiki text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{
    ListStack, Stash, base_metadata, builtin, count_char, line_error, rewrite, rules,
};

static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][\w.-]*):\s*(.*)$").unwrap());
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]|(\S+)").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\*+)\s+(.+)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#+)\s+(.+)$").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(!+)\s*(.+)$").unwrap());
static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{3,}$").unwrap());

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static EXTERNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ext\[([^|\]]+)(?:\|([^\]]+))?\]\]").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[img\[([^\]]+)\]\]").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^|\]]+)(?:\|([^\]]+))?\]\]").unwrap());
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"&#39;&#39;(.+?)&#39;&#39;", "<strong>$1</strong>"),
        (r"//([^/]+)//", "<em>$1</em>"),
        (r"__([^_]+)__", "<u>$1</u>"),
        (r"~~([^~]+)~~", "<s>$1</s>"),
        (r"\^\^([^^]+)\^\^", "<sup>$1</sup>"),
        (r",,([^,]+),,", "<sub>$1</sub>"),
    ])
});

/// Header fields of a tiddler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TiddlerFields {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub kind: Option<String>,
    /// Fields other than the well-known ones.
    pub custom: BTreeMap<String, String>,
}

/// Split a tiddler into its header fields and body text.
#[must_use]
pub fn split_fields(content: &str) -> (TiddlerFields, String) {
    let lines: Vec<&str> = content.lines().collect();
    let mut raw = BTreeMap::new();
    let mut start = 0;

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            start = index + 1;
            break;
        }
        match FIELD.captures(line) {
            Some(caps) => {
                raw.insert(caps[1].to_ascii_lowercase(), caps[2].trim().to_owned());
                start = index + 1;
            }
            None => {
                start = index;
                break;
            }
        }
    }

    let tags = raw
        .remove("tags")
        .map(|tags| {
            TAG.captures_iter(&tags)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str().to_owned())
                .collect()
        })
        .unwrap_or_default();
    let fields = TiddlerFields {
        title: raw.remove("title"),
        tags,
        created: raw.remove("created"),
        modified: raw.remove("modified"),
        kind: raw.remove("type"),
        custom: raw,
    };
    (fields, lines[start.min(lines.len())..].join("\n"))
}

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = CODE.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<code>{}</code>", escape_html(&caps[1])))
    });
    let text = EXTERNAL.replace_all(&text, |caps: &Captures<'_>| {
        let url = escape_html(caps[1].trim());
        let label = caps
            .get(2)
            .map_or_else(|| url.clone(), |m| escape_html(m.as_str().trim()));
        stash.put(format!("<a href='{url}' target='_blank'>{label}</a>"))
    });
    let text = IMAGE.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<img src='{}'/>", escape_html(caps[1].trim())))
    });
    let text = LINK.replace_all(&text, |caps: &Captures<'_>| {
        let target = escape_html(caps[1].trim());
        let label = caps
            .get(2)
            .map_or_else(|| target.clone(), |m| escape_html(m.as_str().trim()));
        stash.put(format!("<a href='#{target}'>{label}</a>"))
    });
    stash.restore(&rewrite(&EMPHASIS, &escape_html(&text)))
}

fn fields_html(fields: &TiddlerFields) -> String {
    if fields.title.is_none() && fields.tags.is_empty() {
        return String::new();
    }
    let mut out = String::from("<div class='metadata'>");
    if let Some(title) = &fields.title {
        out.push_str(&format!("<div class='title'>{}</div>", escape_html(title)));
    }
    if !fields.tags.is_empty() {
        out.push_str("<div class='tags'>");
        for tag in &fields.tags {
            out.push_str(&format!("<span class='tag'>{}</span>", escape_html(tag)));
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

fn to_html(fields: &TiddlerFields, body: &str) -> String {
    let mut html = format!(
        "<div class='tiddlywiki'>{}{}",
        stylesheet(ids::TIDDLYWIKI, true),
        fields_html(fields)
    );
    let mut lists = ListStack::default();
    let mut in_code = false;
    let mut in_quote = false;

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            lists.close(&mut html);
            html.push_str(if in_code { "</pre>" } else { "<pre>" });
            in_code = !in_code;
            continue;
        }
        if in_code {
            html.push_str(&escape_html(line));
            html.push('\n');
            continue;
        }
        if trimmed == "<<<" {
            lists.close(&mut html);
            html.push_str(if in_quote { "</blockquote>" } else { "<blockquote>" });
            in_quote = !in_quote;
            continue;
        }

        if let Some(caps) = BULLET.captures(trimmed) {
            lists.enter(&mut html, "ul", caps[1].len());
            html.push_str(&format!("<li>{}</li>", inline(&caps[2])));
            continue;
        }
        if let Some(caps) = NUMBERED.captures(trimmed) {
            lists.enter(&mut html, "ol", caps[1].len());
            html.push_str(&format!("<li>{}</li>", inline(&caps[2])));
            continue;
        }
        lists.close(&mut html);

        if trimmed.is_empty() {
            continue;
        }
        if let Some(caps) = HEADING.captures(trimmed) {
            let level = caps[1].len().min(6);
            html.push_str(&format!("<h{level}>{}</h{level}>", inline(&caps[2])));
        } else if RULE.is_match(trimmed) {
            html.push_str("<hr>");
        } else if let Some(quote) = trimmed.strip_prefix("> ") {
            html.push_str(&format!("<blockquote>{}</blockquote>", inline(quote)));
        } else {
            html.push_str(&format!("<p>{}</p>", inline(trimmed)));
        }
    }

    lists.close(&mut html);
    if in_code {
        html.push_str("</pre>");
    }
    if in_quote {
        html.push_str("</blockquote>");
    }
    html.push_str("</div>");
    html
}

/// Parser for TiddlyWiki tiddlers.
pub struct TiddlyWikiParser {
    format: &'static TextFormat,
}

impl TiddlyWikiParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::TIDDLYWIKI),
        }
    }
}

impl Default for TiddlyWikiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for TiddlyWikiParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let (fields, body) = split_fields(content);
        let mut metadata = base_metadata(content, options);
        if let Some(title) = &fields.title {
            metadata.insert("title".to_owned(), title.clone());
        }
        if !fields.tags.is_empty() {
            metadata.insert("tags".to_owned(), fields.tags.join(", "));
        }
        let html = to_html(&fields, &body);
        ParsedDocument::new(self.format.clone(), content, html).with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let mut in_code = false;

        for (index, line) in content.lines().enumerate() {
            if line.trim().starts_with("```") {
                in_code = !in_code;
                continue;
            }
            if in_code {
                continue;
            }
            if count_char(line, '[') != count_char(line, ']') {
                errors.push(line_error(index, "Unclosed brackets in links"));
            }
            if line.matches("''").count() % 2 != 0 {
                errors.push(line_error(index, "Unclosed quotes (for bold '')"));
            }
        }

        errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TIDDLER: &str =
        "title: Getting Started\ntags: intro [[First Steps]]\ncreated: 20240101\n\n! Welcome\nSome ''bold'' text.";

    #[test]
    fn test_split_fields() {
        let (fields, body) = split_fields(TIDDLER);
        assert_eq!(fields.title.as_deref(), Some("Getting Started"));
        assert_eq!(fields.tags, vec!["intro", "First Steps"]);
        assert_eq!(fields.created.as_deref(), Some("20240101"));
        assert_eq!(body, "! Welcome\nSome ''bold'' text.");
    }

    #[test]
    fn test_no_header() {
        let (fields, body) = split_fields("! Heading only");
        assert_eq!(fields, TiddlerFields::default());
        assert_eq!(body, "! Heading only");
    }

    #[test]
    fn test_parse_metadata_and_html() {
        let doc = TiddlyWikiParser::new().parse(TIDDLER, &ParseOptions::default());
        assert_eq!(doc.meta("title"), Some("Getting Started"));
        assert_eq!(doc.meta("tags"), Some("intro, First Steps"));
        let html = doc.parsed_content();
        assert!(html.contains("<div class='title'>Getting Started</div>"));
        assert!(html.contains("<span class='tag'>First Steps</span>"));
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains("<p>Some <strong>bold</strong> text.</p>"));
    }

    #[test]
    fn test_inline_links() {
        let out = inline("[[Target|see]] [ext[https://x.io|site]] [img[pic.png]] `a<b` //i// ^^up^^ ,,down,,");
        assert!(out.contains("<a href='#Target'>see</a>"));
        assert!(out.contains("<a href='https://x.io' target='_blank'>site</a>"));
        assert!(out.contains("<img src='pic.png'/>"));
        assert!(out.contains("<code>a&lt;b</code>"));
        assert!(out.contains("<em>i</em>"));
        assert!(out.contains("<sup>up</sup>"));
        assert!(out.contains("<sub>down</sub>"));
    }

    #[test]
    fn test_lists_and_quotes() {
        let (fields, _) = split_fields("");
        let out = to_html(&fields, "* a\n** b\n# c\n<<<\nquoted\n<<<\n---");
        assert!(out.contains("<ul><li>a</li><ul><li>b</li></ul></ul><ol><li>c</li></ol>"));
        assert!(out.contains("<blockquote><p>quoted</p></blockquote><hr>"));
    }

    #[test]
    fn test_validate() {
        let parser = TiddlyWikiParser::new();
        assert!(parser.validate("```\n[[ ''\n```\n''ok''").is_empty());
        assert_eq!(
            parser.validate("[[open\n''half"),
            vec![
                "Line 1: Unclosed brackets in links",
                "Line 2: Unclosed quotes (for bold '')",
            ]
        );
    }
}
