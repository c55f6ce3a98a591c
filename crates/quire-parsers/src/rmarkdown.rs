//! R Markdown: Markdown with YAML front matter and executable code chunks.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::Regex;

use crate::markdown::MarkdownParser;
use crate::styles::stylesheet;
use crate::util::{builtin, theme_class};

static CHUNK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```\{([^}]*)\}\s*$").unwrap());

const FRONT_MATTER_FENCE: &str = "---";

/// An executable code chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChunk {
    pub language: String,
    pub options: String,
    pub code: String,
}

impl CodeChunk {
    fn from_header(header: &str) -> Self {
        let header = header.trim();
        let language = header
            .split([',', ' '])
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            language,
            options: header.to_owned(),
            code: String::new(),
        }
    }

    fn is_r(&self) -> bool {
        self.language.eq_ignore_ascii_case("r")
    }
}

/// Front matter split from the body.
///
/// Returns `None` when the document does not start with a `---` line.
/// An unterminated block takes the rest of the document.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix("---\r\n")
        .or_else(|| content.strip_prefix("---\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Some((rest, ""))
}

fn scalar(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

/// Front-matter keys and values.
///
/// Parsed as YAML; if that fails, plain `key: value` lines are used.
#[must_use]
pub fn front_matter(content: &str) -> BTreeMap<String, String> {
    let Some((yaml, _)) = split_front_matter(content) else {
        return BTreeMap::new();
    };
    match serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(yaml) {
        Ok(map) => map.into_iter().map(|(k, v)| (k, scalar(&v))).collect(),
        Err(err) => {
            tracing::debug!(format = ids::RMARKDOWN, error = %err, "Front matter is not valid YAML");
            yaml.lines()
                .filter_map(|line| line.split_once(':'))
                .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
                .filter(|(k, _)| !k.is_empty())
                .collect()
        }
    }
}

fn body(content: &str) -> &str {
    split_front_matter(content).map_or(content, |(_, body)| body)
}

enum Segment {
    Markdown(String),
    Chunk(CodeChunk),
}

fn segments(body: &str) -> Vec<Segment> {
    let mut found = Vec::new();
    let mut markdown = String::new();
    let mut chunk: Option<CodeChunk> = None;

    for line in body.lines() {
        if let Some(current) = chunk.as_mut() {
            if line.trim_end() == "```" {
                if let Some(done) = chunk.take() {
                    found.push(Segment::Chunk(done));
                }
            } else {
                current.code.push_str(line);
                current.code.push('\n');
            }
        } else if let Some(caps) = CHUNK_START.captures(line) {
            if !markdown.is_empty() {
                found.push(Segment::Markdown(std::mem::take(&mut markdown)));
            }
            chunk = Some(CodeChunk::from_header(&caps[1]));
        } else {
            markdown.push_str(line);
            markdown.push('\n');
        }
    }

    if let Some(open) = chunk {
        found.push(Segment::Chunk(open));
    }
    if !markdown.is_empty() {
        found.push(Segment::Markdown(markdown));
    }
    found
}

/// Every code chunk in the document body.
#[must_use]
pub fn code_chunks(content: &str) -> Vec<CodeChunk> {
    segments(body(content))
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Chunk(chunk) => Some(chunk),
            Segment::Markdown(_) => None,
        })
        .collect()
}

fn chunk_html(out: &mut String, chunk: &CodeChunk) {
    let language = escape_html(&chunk.language.to_lowercase());
    let _ = write!(
        out,
        "<div class='code-chunk {language}-chunk'><div class='chunk-label'>{}</div>\
<pre><code class='language-{language}'>{}</code></pre></div>",
        escape_html(&chunk.options),
        escape_html(chunk.code.trim_end_matches('\n'))
    );
}

/// Parser for R Markdown files.
pub struct RMarkdownParser {
    format: &'static TextFormat,
}

impl RMarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::RMARKDOWN),
        }
    }

    fn themed(content: &str, light_mode: bool) -> String {
        let front = front_matter(content);
        let segments = segments(body(content));
        let chunks: Vec<&CodeChunk> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Chunk(chunk) => Some(chunk),
                Segment::Markdown(_) => None,
            })
            .collect();

        let mut out = format!(
            "<div class='rmarkdown-document {}'>{}",
            theme_class(light_mode),
            stylesheet(ids::RMARKDOWN, light_mode)
        );
        let _ = write!(
            out,
            "<div class='rmarkdown-header'><h1>{}</h1><div class='document-info'>\
<span class='r-chunks'>R chunks: {}</span> <span class='total-chunks'>Total chunks: {}</span></div></div>",
            escape_html(front.get("title").map_or("R Markdown Document", String::as_str)),
            chunks.iter().filter(|c| c.is_r()).count(),
            chunks.len()
        );

        out.push_str("<div class='rmarkdown-content'>");
        for segment in &segments {
            match segment {
                Segment::Markdown(text) => out.push_str(&MarkdownParser::render(text, None)),
                Segment::Chunk(chunk) => chunk_html(&mut out, chunk),
            }
        }
        out.push_str("</div></div>");
        out
    }
}

impl Default for RMarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for RMarkdownParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
        let chunks = code_chunks(content);
        let mut metadata = front_matter(content);
        metadata.insert(
            "has_frontmatter".to_owned(),
            split_front_matter(content).is_some().to_string(),
        );
        metadata.insert("code_chunks".to_owned(), chunks.len().to_string());
        metadata.insert(
            "r_chunks".to_owned(),
            chunks.iter().filter(|c| c.is_r()).count().to_string(),
        );

        ParsedDocument::new(self.format.clone(), content, Self::themed(content, true))
            .with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();

        let mut lines = content.lines();
        let unclosed = lines.next().is_some_and(|first| first.trim_end() == FRONT_MATTER_FENCE)
            && !lines.any(|line| line.trim_end() == FRONT_MATTER_FENCE);
        if unclosed {
            errors.push("Unclosed YAML front matter".to_owned());
        }

        // Plain ``` fences pair with each other; a chunk header inside an
        // open fence, or a fence left open, is a mismatch.
        let scanned = if unclosed { content } else { body(content) };
        let mut open = false;
        let mut mismatched = false;
        for line in scanned.lines() {
            let trimmed = line.trim_end();
            let is_chunk = CHUNK_START.is_match(trimmed);
            if !open {
                open = trimmed.starts_with("```");
            } else if trimmed == "```" {
                open = false;
            } else if is_chunk {
                mismatched = true;
            }
        }
        if mismatched || open {
            errors.push("Mismatched code chunk delimiters".to_owned());
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

    const DOC: &str = "---\ntitle: \"Report\"\nauthor: Ada\noutput: html_document\n---\n\n# Results\n\nSome **bold** text.\n\n```{r setup, echo=FALSE}\nx <- c(1, 2)\n```\n\n```{python}\nprint(1 < 2)\n```\n";

    #[test]
    fn test_front_matter() {
        let front = front_matter(DOC);
        assert_eq!(front.get("title").map(String::as_str), Some("Report"));
        assert_eq!(front.get("author").map(String::as_str), Some("Ada"));
        assert!(front_matter("# no front matter").is_empty());
    }

    #[test]
    fn test_code_chunks() {
        let chunks = code_chunks(DOC);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].language, "r");
        assert_eq!(chunks[0].options, "r setup, echo=FALSE");
        assert_eq!(chunks[0].code, "x <- c(1, 2)\n");
        assert_eq!(chunks[1].language, "python");
    }

    #[test]
    fn test_metadata() {
        let doc = RMarkdownParser::new().parse(DOC, &ParseOptions::default());
        assert_eq!(doc.meta("has_frontmatter"), Some("true"));
        assert_eq!(doc.meta("code_chunks"), Some("2"));
        assert_eq!(doc.meta("r_chunks"), Some("1"));
        assert_eq!(doc.meta("output"), Some("html_document"));

        let plain = RMarkdownParser::new().parse("text", &ParseOptions::default());
        assert_eq!(plain.meta("has_frontmatter"), Some("false"));
        assert_eq!(plain.meta("code_chunks"), Some("0"));
    }

    #[test]
    fn test_html() {
        let parser = RMarkdownParser::new();
        let doc = parser.parse(DOC, &ParseOptions::default());
        let html = doc.parsed_content();
        assert!(html.starts_with("<div class='rmarkdown-document light'>"));
        assert!(html.contains("<h1>Report</h1>"));
        assert!(html.contains("<h1>Results</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<div class='code-chunk r-chunk'><div class='chunk-label'>r setup, echo=FALSE</div>"));
        assert!(html.contains("<code class='language-r'>x &lt;- c(1, 2)</code>"));
        assert!(html.contains("print(1 &lt; 2)"));
        assert!(!html.contains("title: "));
        assert!(parser.to_html(&doc, false).starts_with("<div class='rmarkdown-document dark'>"));
    }

    #[test]
    fn test_validate() {
        let parser = RMarkdownParser::new();
        assert!(parser.validate(DOC).is_empty());
        assert!(parser.validate("```{r}\nx\n```\n\n```\nplain\n```").is_empty());
        assert_eq!(
            parser.validate("---\ntitle: x\n\n```{r}\nx\n"),
            vec!["Unclosed YAML front matter", "Mismatched code chunk delimiters"]
        );
    }
}
