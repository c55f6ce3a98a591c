//! Parsed documents and their HTML cache.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use quire_format::TextFormat;

use crate::registry::ParserRegistry;

/// Characters of raw content shown by the `Debug` summary.
const PREVIEW_CHARS: usize = 50;

/// Error rendering a document to HTML.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No registered parser accepts the document's format.
    #[error("No parser found for format: {0}")]
    NoParser(String),
}

/// Result of parsing: raw input, transformed content, metadata and
/// diagnostics.
///
/// Each document owns a private cache with one cell per theme. Cells fill on
/// the first [`to_html`](Self::to_html) for that theme and empty only through
/// [`clear_html_cache`](Self::clear_html_cache). The cache is ignored by
/// equality and hashing, and clones start with it empty.
pub struct ParsedDocument {
    format: TextFormat,
    raw_content: String,
    parsed_content: String,
    metadata: BTreeMap<String, String>,
    errors: Vec<String>,
    light_html: OnceLock<String>,
    dark_html: OnceLock<String>,
}

impl ParsedDocument {
    /// Create a document with no metadata and no errors.
    #[must_use]
    pub fn new(
        format: TextFormat,
        raw_content: impl Into<String>,
        parsed_content: impl Into<String>,
    ) -> Self {
        Self {
            format,
            raw_content: raw_content.into(),
            parsed_content: parsed_content.into(),
            metadata: BTreeMap::new(),
            errors: Vec::new(),
            light_html: OnceLock::new(),
            dark_html: OnceLock::new(),
        }
    }

    /// Replace the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace the diagnostics list.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// The document's format.
    #[must_use]
    pub fn format(&self) -> &TextFormat {
        &self.format
    }

    /// The input text.
    #[must_use]
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// The parser's transformed output.
    #[must_use]
    pub fn parsed_content(&self) -> &str {
        &self.parsed_content
    }

    /// Format-specific metadata.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// A single metadata value.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Diagnostics collected while parsing.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render to HTML for the given theme, caching the result.
    ///
    /// A cached value is returned verbatim. Otherwise the parser is resolved
    /// through `registry`, its output stored, and returned.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoParser`] if no registered parser accepts the
    /// document's format.
    pub fn to_html(&self, registry: &ParserRegistry, light_mode: bool) -> Result<&str, RenderError> {
        let cell = self.cell(light_mode);
        if let Some(html) = cell.get() {
            return Ok(html);
        }

        let Some(parser) = registry.get_parser(&self.format) else {
            tracing::warn!(format = %self.format.id(), "No parser bound for document format");
            return Err(RenderError::NoParser(self.format.id().to_owned()));
        };

        let html = parser.to_html(self, light_mode);
        tracing::debug!(
            format = %self.format.id(),
            light_mode,
            bytes = html.len(),
            "Rendered document HTML"
        );
        Ok(cell.get_or_init(|| html))
    }

    /// Whether HTML for the given theme is cached. Never renders.
    #[must_use]
    pub fn has_html_cached(&self, light_mode: bool) -> bool {
        self.cell(light_mode).get().is_some()
    }

    /// Drop both cached renderings.
    pub fn clear_html_cache(&mut self) {
        self.light_html.take();
        self.dark_html.take();
    }

    fn cell(&self, light_mode: bool) -> &OnceLock<String> {
        if light_mode {
            &self.light_html
        } else {
            &self.dark_html
        }
    }

    fn content_eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.raw_content == other.raw_content
            && self.parsed_content == other.parsed_content
            && self.metadata == other.metadata
            && self.errors == other.errors
    }
}

impl Clone for ParsedDocument {
    fn clone(&self) -> Self {
        Self {
            format: self.format.clone(),
            raw_content: self.raw_content.clone(),
            parsed_content: self.parsed_content.clone(),
            metadata: self.metadata.clone(),
            errors: self.errors.clone(),
            light_html: OnceLock::new(),
            dark_html: OnceLock::new(),
        }
    }
}

impl PartialEq for ParsedDocument {
    fn eq(&self, other: &Self) -> bool {
        self.content_eq(other)
    }
}

impl Eq for ParsedDocument {}

impl Hash for ParsedDocument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.format.hash(state);
        self.raw_content.hash(state);
        self.parsed_content.hash(state);
        self.metadata.hash(state);
        self.errors.hash(state);
    }
}

impl std::fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut preview: String = self.raw_content.chars().take(PREVIEW_CHARS).collect();
        if self.raw_content.chars().nth(PREVIEW_CHARS).is_some() {
            preview.push_str("...");
        }
        f.debug_struct("ParsedDocument")
            .field("format", &self.format.id())
            .field("raw_content", &preview)
            .field("metadata", &self.metadata)
            .field("errors", &self.errors)
            .field("light_cached", &self.has_html_cached(true))
            .field("dark_cached", &self.has_html_cached(false))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;
    use crate::options::ParseOptions;
    use crate::parser::TextParser;

    /// Renders the theme into the output so light and dark differ.
    struct Themed(TextFormat);

    impl TextParser for Themed {
        fn supported_format(&self) -> &TextFormat {
            &self.0
        }

        fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
            ParsedDocument::new(self.0.clone(), content, content)
        }

        fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
            let theme = if light_mode { "light" } else { "dark" };
            format!("<div class='{theme}'>{}</div>", document.raw_content())
        }
    }

    fn markdown() -> TextFormat {
        TextFormat::builtin("markdown").unwrap().clone()
    }

    fn registry_with_themed() -> ParserRegistry {
        let registry = ParserRegistry::new();
        registry.register(Themed(markdown())).unwrap();
        registry
    }

    fn hash_of(doc: &ParsedDocument) -> u64 {
        let mut hasher = DefaultHasher::new();
        doc.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_to_html_caches_per_theme() {
        let registry = registry_with_themed();
        let doc = ParsedDocument::new(markdown(), "body", "body");

        assert!(!doc.has_html_cached(true));
        let first = doc.to_html(&registry, true).unwrap().to_owned();
        assert!(doc.has_html_cached(true));
        assert!(!doc.has_html_cached(false));

        let second = doc.to_html(&registry, true).unwrap();
        assert_eq!(first, second);

        let dark = doc.to_html(&registry, false).unwrap();
        assert_ne!(first, dark);
        assert!(doc.has_html_cached(false));
    }

    #[test]
    fn test_cached_value_survives_registry_clear() {
        let registry = registry_with_themed();
        let doc = ParsedDocument::new(markdown(), "body", "body");
        let first = doc.to_html(&registry, true).unwrap().to_owned();
        registry.clear();
        assert_eq!(doc.to_html(&registry, true).unwrap(), first);
        assert!(doc.to_html(&registry, false).is_err());
    }

    #[test]
    fn test_clear_html_cache() {
        let registry = registry_with_themed();
        let mut doc = ParsedDocument::new(markdown(), "body", "body");
        let before = doc.to_html(&registry, true).unwrap().to_owned();
        doc.to_html(&registry, false).unwrap();

        doc.clear_html_cache();
        assert!(!doc.has_html_cached(true));
        assert!(!doc.has_html_cached(false));

        doc.clear_html_cache();
        assert!(!doc.has_html_cached(true));

        assert_eq!(doc.to_html(&registry, true).unwrap(), before);
    }

    #[test]
    fn test_missing_parser_names_format() {
        let registry = ParserRegistry::new();
        let doc = ParsedDocument::new(markdown(), "# x", "");
        let err = doc.to_html(&registry, true).unwrap_err();
        assert!(matches!(err, RenderError::NoParser(ref id) if id == "markdown"));
        assert_eq!(err.to_string(), "No parser found for format: markdown");
        assert!(!doc.has_html_cached(true));
    }

    #[test]
    fn test_equality_ignores_cache() {
        let registry = registry_with_themed();
        let a = ParsedDocument::new(markdown(), "x", "x");
        let b = ParsedDocument::new(markdown(), "x", "x");
        a.to_html(&registry, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = b.clone().with_errors(vec!["Line 1: bad".to_owned()]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_clone_has_empty_cache() {
        let registry = registry_with_themed();
        let doc = ParsedDocument::new(markdown(), "x", "x");
        doc.to_html(&registry, true).unwrap();
        let copy = doc.clone();
        assert!(!copy.has_html_cached(true));
        assert_eq!(copy, doc);
    }

    #[test]
    fn test_debug_truncates_raw_content() {
        let long = "a".repeat(80);
        let doc = ParsedDocument::new(markdown(), long, "");
        let debug = format!("{doc:?}");
        assert!(debug.contains(&format!("{}...", "a".repeat(50))));
        assert!(!debug.contains(&"a".repeat(51)));
    }

    #[test]
    fn test_metadata_accessors() {
        let mut metadata = BTreeMap::new();
        metadata.insert("lines".to_owned(), "3".to_owned());
        let doc = ParsedDocument::new(markdown(), "a\nb\nc", "").with_metadata(metadata);
        assert_eq!(doc.meta("lines"), Some("3"));
        assert_eq!(doc.meta("missing"), None);
    }
}
