//! Textile markup.

use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{Stash, base_metadata, builtin, count_char, line_error, rewrite, rules};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^h([1-6])\.\.?\s+(.+)$").unwrap());
static ANY_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^h([0-9])\.\.?\s+").unwrap());

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([^@]+)@").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)":(\S+)"#).unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!([^!\s]+)!").unwrap());
static PHRASES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"\*\*([^*]+)\*\*", "<strong>$1</strong>"),
        (r"\*([^*]+)\*", "<b>$1</b>"),
        (r"__([^_]+)__", "<em><em>$1</em></em>"),
        (r"(^|[\s(])_([^_\s](?:[^_]*[^_\s])?)_", "${1}<em>${2}</em>"),
        (r"(^|[\s(])-([^\s-](?:[^-]*[^\s-])?)-", "${1}<del>${2}</del>"),
        (r"\^([^^]+)\^", "<sup>$1</sup>"),
        (r"~([^~]+)~", "<sub>$1</sub>"),
    ])
});

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = CODE.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<code>{}</code>", escape_html(&caps[1])))
    });
    let text = LINK.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!(
            "<a href='{}'>{}</a>",
            escape_html(&caps[2]),
            escape_html(&caps[1])
        ))
    });
    let text = IMAGE.replace_all(&text, |caps: &Captures<'_>| {
        let src = escape_html(&caps[1]);
        stash.put(format!("<img src='{src}' alt='{src}'/>"))
    });
    stash.restore(&rewrite(&PHRASES, &escape_html(&text)))
}

fn block(trimmed: &str) -> String {
    if let Some(caps) = HEADING.captures(trimmed) {
        let level = &caps[1];
        return format!("<h{level}>{}</h{level}>", inline(&caps[2]));
    }
    if let Some(quote) = trimmed.strip_prefix("bq. ") {
        return format!("<blockquote>{}</blockquote>", inline(quote));
    }
    format!("<p>{}</p>", inline(trimmed))
}

fn to_html(content: &str) -> String {
    let mut out = format!("<div class='textile'>{}", stylesheet(ids::TEXTILE, true));
    let mut list: Option<&'static str> = None;
    let mut in_pre = false;

    let close = |out: &mut String, list: &mut Option<&'static str>| {
        if let Some(tag) = list.take() {
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("pre.") {
            close(&mut out, &mut list);
            if !in_pre {
                out.push_str("<pre>");
                in_pre = true;
            }
            let first = trimmed.trim_start_matches("pre.").trim_start();
            if !first.is_empty() {
                out.push_str(&escape_html(first));
                out.push('\n');
            }
            continue;
        }
        if in_pre {
            if trimmed.is_empty() {
                out.push_str("</pre>");
                in_pre = false;
            } else {
                out.push_str(&escape_html(line));
                out.push('\n');
            }
            continue;
        }

        let item = trimmed
            .strip_prefix("* ")
            .map(|text| ("ul", text))
            .or_else(|| trimmed.strip_prefix("# ").map(|text| ("ol", text)));
        if let Some((tag, text)) = item {
            if list != Some(tag) {
                close(&mut out, &mut list);
                out.push('<');
                out.push_str(tag);
                out.push('>');
                list = Some(tag);
            }
            out.push_str("<li>");
            out.push_str(&inline(text));
            out.push_str("</li>");
            continue;
        }

        close(&mut out, &mut list);
        if !trimmed.is_empty() {
            out.push_str(&block(trimmed));
        }
    }

    close(&mut out, &mut list);
    if in_pre {
        out.push_str("</pre>");
    }
    out.push_str("</div>");
    out
}

/// Parser for Textile files.
pub struct TextileParser {
    format: &'static TextFormat,
}

impl TextileParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::TEXTILE),
        }
    }
}

impl Default for TextileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for TextileParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        ParsedDocument::new(self.format.clone(), content, to_html(content))
            .with_metadata(base_metadata(content, options))
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if let Some(caps) = ANY_HEADING.captures(trimmed) {
                let level: u32 = caps[1].parse().unwrap_or(0);
                if !(1..=6).contains(&level) {
                    errors.push(line_error(
                        index,
                        format!("Invalid heading level {level} (must be 1-6)"),
                    ));
                }
            }
            if count_char(trimmed, '@') % 2 != 0 {
                errors.push(line_error(index, "Unclosed inline code marker (@)"));
            }
            if count_char(trimmed, '!') % 2 != 0 {
                errors.push(line_error(index, "Unclosed image marker (!)"));
            }
        }
        errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}
