//! Markdown rendered with pulldown-cmark.

use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use quire_core::{ParseOptions, ParsedDocument, TextParser};
use quire_format::{TextFormat, ids};
use regex::Regex;

use crate::styles::stylesheet;
use crate::util::{base_metadata, builtin, count_char, line_error};

/// Well-formed inline links and images, removed before bracket counting.
static LINK_OR_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[[^\]]*\]\([^)]+\)").unwrap());

/// GitHub-flavored Markdown parser.
pub struct MarkdownParser {
    format: &'static TextFormat,
}

impl MarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::MARKDOWN),
        }
    }

    /// Render Markdown to an HTML fragment.
    ///
    /// Relative link and image targets are prefixed with `base_url` when given.
    #[must_use]
    pub fn render(markdown: &str, base_url: Option<&str>) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;

        let events = Parser::new_ext(markdown, options).map(|event| match (event, base_url) {
            (
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }),
                Some(base),
            ) => Event::Start(Tag::Link {
                link_type,
                dest_url: resolve_url(base, dest_url),
                title,
                id,
            }),
            (
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }),
                Some(base),
            ) => Event::Start(Tag::Image {
                link_type,
                dest_url: resolve_url(base, dest_url),
                title,
                id,
            }),
            (event, _) => event,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefix a relative URL with `base`.
fn resolve_url<'a>(base: &str, url: CowStr<'a>) -> CowStr<'a> {
    let absolute = url.contains("://")
        || url.starts_with('/')
        || url.starts_with('#')
        || url.starts_with("mailto:")
        || url.starts_with("data:");
    if absolute || base.is_empty() {
        return url;
    }
    let base = base.trim_end_matches('/');
    CowStr::from(format!("{base}/{url}"))
}

impl TextParser for MarkdownParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let body = Self::render(content, options.base_url());
        let html = format!(
            "<div class='markdown'>{}{body}</div>",
            stylesheet(ids::MARKDOWN, true)
        );
        ParsedDocument::new(self.format.clone(), content, html)
            .with_metadata(base_metadata(content, options))
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let mut in_fence = false;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
            }
            if in_fence {
                continue;
            }

            let rest = LINK_OR_IMAGE.replace_all(trimmed, "");
            if count_char(&rest, '[') != count_char(&rest, ']') {
                errors.push(line_error(index, "Unclosed brackets"));
            }
            if count_char(&rest, '(') != count_char(&rest, ')') {
                errors.push(line_error(index, "Unclosed parentheses"));
            }
        }

        errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}
