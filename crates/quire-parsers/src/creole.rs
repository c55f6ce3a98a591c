//! WikiCreole 1.0 markup.

use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{ListStack, Stash, base_metadata, builtin, count_char, line_error, rewrite, rules};

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\*+)\s+(.+)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#+)\s+(.+)$").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(=+)\s*(.+?)\s*=*$").unwrap());
static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{4,}$").unwrap());

static NOWIKI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{\{(.+?)\}\}\}").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^|\]]+)(?:\|([^\]]+))?\]\]").unwrap());
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^|}]+)(?:\|([^}]+))?\}\}").unwrap());
static FREE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:https?|ftp)://[^\s<>]+[^\s<>.,;:!?)]").unwrap());
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"\\\\", "<br>"),
        (r"\*\*([^*]+)\*\*", "<strong>$1</strong>"),
        (r"//([^/]+)//", "<em>$1</em>"),
    ])
});

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = NOWIKI.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!("<code>{}</code>", escape_html(&caps[1])))
    });
    let text = LINK.replace_all(&text, |caps: &Captures<'_>| {
        let target = escape_html(caps[1].trim());
        let label = caps
            .get(2)
            .map_or_else(|| target.clone(), |m| escape_html(m.as_str().trim()));
        stash.put(format!("<a href='{target}'>{label}</a>"))
    });
    let text = IMAGE.replace_all(&text, |caps: &Captures<'_>| {
        let src = escape_html(caps[1].trim());
        let alt = caps
            .get(2)
            .map_or_else(|| src.clone(), |m| escape_html(m.as_str().trim()));
        stash.put(format!("<img src='{src}' alt='{alt}'/>"))
    });
    let text = FREE_URL.replace_all(&text, |caps: &Captures<'_>| {
        let url = escape_html(&caps[0]);
        stash.put(format!("<a href='{url}'>{url}</a>"))
    });
    stash.restore(&rewrite(&EMPHASIS, &escape_html(&text)))
}

fn table_row(row: &str) -> String {
    let inner = row.trim().trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let mut out = String::from("<tr>");
    for cell in inner.split('|') {
        let cell = cell.trim();
        match cell.strip_prefix('=') {
            Some(header) => out.push_str(&format!("<th>{}</th>", inline(header.trim()))),
            None => out.push_str(&format!("<td>{}</td>", inline(cell))),
        }
    }
    out.push_str("</tr>");
    out
}

fn to_html(content: &str) -> String {
    let mut html = format!("<div class='creole'>{}", stylesheet(ids::CREOLE, true));
    let mut lists = ListStack::default();
    let mut in_table = false;
    let mut in_pre = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if in_pre {
            if trimmed == "}}}" {
                html.push_str("</pre>");
                in_pre = false;
            } else {
                html.push_str(&escape_html(line));
                html.push('\n');
            }
            continue;
        }

        let is_row = trimmed.starts_with('|') && trimmed.ends_with('|');
        if in_table && !is_row {
            html.push_str("</table>");
            in_table = false;
        }

        if trimmed == "{{{" {
            lists.close(&mut html);
            html.push_str("<pre>");
            in_pre = true;
        } else if is_row {
            lists.close(&mut html);
            if !in_table {
                html.push_str("<table>");
                in_table = true;
            }
            html.push_str(&table_row(trimmed));
        } else if let Some(caps) = BULLET.captures(trimmed) {
            lists.enter(&mut html, "ul", caps[1].len());
            html.push_str(&format!("<li>{}</li>", inline(&caps[2])));
        } else if let Some(caps) = NUMBERED.captures(trimmed) {
            lists.enter(&mut html, "ol", caps[1].len());
            html.push_str(&format!("<li>{}</li>", inline(&caps[2])));
        } else {
            lists.close(&mut html);
            if trimmed.is_empty() {
                continue;
            }
            if let Some(caps) = HEADING.captures(trimmed) {
                let level = caps[1].len().min(6);
                html.push_str(&format!("<h{level}>{}</h{level}>", inline(&caps[2])));
            } else if RULE.is_match(trimmed) {
                html.push_str("<hr>");
            } else {
                html.push_str(&format!("<p>{}</p>", inline(trimmed)));
            }
        }
    }

    lists.close(&mut html);
    if in_table {
        html.push_str("</table>");
    }
    if in_pre {
        html.push_str("</pre>");
    }
    html.push_str("</div>");
    html
}

/// Parser for Creole wiki pages.
pub struct CreoleParser {
    format: &'static TextFormat,
}

impl CreoleParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::CREOLE),
        }
    }
}

impl Default for CreoleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for CreoleParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        ParsedDocument::new(self.format.clone(), content, to_html(content))
            .with_metadata(base_metadata(content, options))
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let mut in_pre = false;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed == "{{{" || (in_pre && trimmed == "}}}") {
                in_pre = trimmed == "{{{";
                continue;
            }
            if in_pre {
                continue;
            }

            if trimmed.starts_with('|') && !trimmed.ends_with('|') {
                errors.push(line_error(index, "Malformed table row (should end with |)"));
            }
            if count_char(trimmed, '[') != count_char(trimmed, ']') {
                errors.push(line_error(index, "Unclosed brackets in links"));
            }
            if count_char(trimmed, '{') != count_char(trimmed, '}') {
                errors.push(line_error(index, "Unclosed braces"));
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

    fn html(content: &str) -> String {
        CreoleParser::new()
            .parse(content, &ParseOptions::default())
            .parsed_content()
            .to_owned()
    }

    #[test]
    fn test_headings_capped() {
        let out = html("= Top =\n=== Third\n======= Deep =======");
        assert!(out.contains("<h1>Top</h1>"));
        assert!(out.contains("<h3>Third</h3>"));
        assert!(out.contains("<h6>Deep</h6>"));
    }

    #[test]
    fn test_nested_lists() {
        let out = html("* a\n** b\n# c");
        assert!(out.contains("<ul><li>a</li><ul><li>b</li></ul></ul><ol><li>c</li></ol>"));
    }

    #[test]
    fn test_table() {
        let out = html("|=Name|=Age|\n|Ada|36|");
        assert!(out.contains(
            "<table><tr><th>Name</th><th>Age</th></tr><tr><td>Ada</td><td>36</td></tr></table>"
        ));
    }

    #[test]
    fn test_inline() {
        let out = html(
            "**bold** //em// line\\\\break {{{a<b}}} [[Home|home page]] {{logo.png|Logo}} https://example.com/x",
        );
        assert!(out.contains("<strong>bold</strong>"));
        assert!(out.contains("<em>em</em>"));
        assert!(out.contains("line<br>break"));
        assert!(out.contains("<code>a&lt;b</code>"));
        assert!(out.contains("<a href='Home'>home page</a>"));
        assert!(out.contains("<img src='logo.png' alt='Logo'/>"));
        assert!(out.contains("<a href='https://example.com/x'>https://example.com/x</a>"));
    }

    #[test]
    fn test_preformatted_and_rule() {
        let out = html("{{{\n**raw** <x>\n}}}\n----");
        assert!(out.contains("<pre>**raw** &lt;x&gt;\n</pre><hr>"));
    }

    #[test]
    fn test_validate() {
        let parser = CreoleParser::new();
        assert!(parser.validate("{{{\n[[ {\n}}}\n|a|b|").is_empty());
        assert_eq!(
            parser.validate("|a|b\n[[link\n{{img"),
            vec![
                "Line 1: Malformed table row (should end with |)",
                "Line 2: Unclosed brackets in links",
                "Line 3: Unclosed braces",
            ]
        );
    }
}
