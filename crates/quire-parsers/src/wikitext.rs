//! Zim-style wiki text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{Stash, base_metadata, builtin, count_char, line_error, rewrite, rules};

static ZIM_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A\[DocumentAttributes\].*?\n\n").unwrap());
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={2,6})\s+(.+?)\s+(={2,6})$").unwrap());
static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([ x*><])\]\s+(.+)$").unwrap());
static ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9a-zA-Z]\.\s+(.+)$").unwrap());

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"''([^']+)''").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^|\]]+)(?:\|([^\]]+))?\]\]").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"\*\*([^*]+)\*\*", "<strong>$1</strong>"),
        (r"//([^/]+)//", "<em>$1</em>"),
        (r"__([^_]+)__", "<span class='highlight'>$1</span>"),
        (r"~~([^~]+)~~", "<s>$1</s>"),
        (r"\^\{([^}]+)\}", "<sup>$1</sup>"),
        (r"_\{([^}]+)\}", "<sub>$1</sub>"),
    ])
});

#[derive(Clone, Copy, PartialEq, Eq)]
enum List {
    Bullet,
    Numbered,
    Checklist,
}

impl List {
    fn close(self) -> &'static str {
        match self {
            Self::Bullet | Self::Checklist => "</ul>",
            Self::Numbered => "</ol>",
        }
    }

    fn open(self) -> &'static str {
        match self {
            Self::Bullet => "<ul>",
            Self::Numbered => "<ol>",
            Self::Checklist => "<ul class='checklist'>",
        }
    }
}

/// Remove a leading `[DocumentAttributes]` block.
fn strip_zim_header(content: &str) -> &str {
    ZIM_HEADER
        .find(content)
        .map_or(content, |m| &content[m.end()..])
}

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = CODE.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<code>{}</code>", escape_html(&caps[1])))
    });
    let text = LINK.replace_all(&text, |caps: &Captures<'_>| {
        let target = escape_html(&caps[1]);
        let label = caps.get(2).map_or(target.clone(), |m| escape_html(m.as_str()));
        stash.put(format!("<a href='{target}'>{label}</a>"))
    });
    let text = IMAGE.replace_all(&text, |caps: &Captures<'_>| {
        let src = escape_html(&caps[1]);
        stash.put(format!("<img src='{src}' alt='{src}'/>"))
    });
    stash.restore(&rewrite(&EMPHASIS, &escape_html(&text)))
}

fn block(line: &str) -> (Option<List>, String) {
    if let Some(caps) = HEADING.captures(line)
        && caps[1].len() == caps[3].len()
    {
        let level = 7 - caps[1].len();
        return (None, format!("<h{level}>{}</h{level}>", inline(&caps[2])));
    }
    if let Some(caps) = CHECKBOX.captures(line) {
        let class = match &caps[1] {
            "*" => " class='checked'",
            "x" => " class='crossed'",
            ">" => " class='moved'",
            "<" => " class='moved-back'",
            _ => "",
        };
        return (
            Some(List::Checklist),
            format!("<li{class}>{}</li>", inline(&caps[2])),
        );
    }
    if let Some(item) = line.trim_start().strip_prefix("* ") {
        return (Some(List::Bullet), format!("<li>{}</li>", inline(item)));
    }
    if let Some(caps) = ORDERED.captures(line) {
        return (Some(List::Numbered), format!("<li>{}</li>", inline(&caps[1])));
    }
    (None, format!("<p>{}</p>", inline(line)))
}

fn to_html(content: &str) -> String {
    let mut html = format!("<div class='wikitext'>{}", stylesheet(ids::WIKITEXT, true));
    let mut in_code = false;
    let mut open: Option<List> = None;

    for line in content.lines() {
        if line.trim() == "'''" {
            if let Some(list) = open.take() {
                html.push_str(list.close());
            }
            html.push_str(if in_code { "</pre>" } else { "<pre>" });
            in_code = !in_code;
            continue;
        }
        if in_code {
            html.push_str(&escape_html(line));
            html.push('\n');
            continue;
        }
        if line.trim().is_empty() {
            if let Some(list) = open.take() {
                html.push_str(list.close());
            }
            continue;
        }

        let (kind, fragment) = block(line);
        if open != kind {
            if let Some(list) = open.take() {
                html.push_str(list.close());
            }
            if let Some(list) = kind {
                html.push_str(list.open());
            }
            open = kind;
        }
        html.push_str(&fragment);
    }

    if in_code {
        html.push_str("</pre>");
    }
    if let Some(list) = open {
        html.push_str(list.close());
    }
    html.push_str("</div>");
    html
}

/// Parser for Zim wiki pages.
pub struct WikitextParser {
    format: &'static TextFormat,
}

impl WikitextParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::WIKITEXT),
        }
    }
}

impl Default for WikitextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for WikitextParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let body = strip_zim_header(content);
        let mut metadata: BTreeMap<String, String> = base_metadata(content, options);
        metadata.insert(
            "hasZimHeader".to_owned(),
            (body.len() != content.len()).to_string(),
        );
        ParsedDocument::new(self.format.clone(), content, to_html(body)).with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if let Some(caps) = HEADING.captures(line) {
                let (left, right) = (caps[1].len(), caps[3].len());
                if left != right {
                    errors.push(line_error(
                        index,
                        format!("Unbalanced heading markers (left={left}, right={right})"),
                    ));
                }
            }
            if count_char(line, '[') != count_char(line, ']') {
                errors.push(line_error(index, "Unclosed brackets in links"));
            }
            if count_char(line, '{') != count_char(line, '}') {
                errors.push(line_error(index, "Unclosed braces in images"));
            }
        }
        errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}
