//! The dialect plugin contract.

use quire_format::TextFormat;

use crate::document::ParsedDocument;
use crate::escape::escape_html;
use crate::options::ParseOptions;

/// A format-specific parser plugin.
///
/// Implementations turn raw text into a [`ParsedDocument`] and render it to
/// HTML. Parsing is total: malformed input produces a best-effort document,
/// with problems reported through [`validate`](Self::validate) or
/// [`ParsedDocument::errors`] rather than panics.
///
/// # Example
///
/// ```
/// use quire_core::{ParseOptions, ParsedDocument, TextParser};
/// use quire_format::TextFormat;
///
/// struct Shout(TextFormat);
///
/// impl TextParser for Shout {
///     fn supported_format(&self) -> &TextFormat {
///         &self.0
///     }
///
///     fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
///         ParsedDocument::new(self.0.clone(), content, content.to_uppercase())
///     }
/// }
///
/// let parser = Shout(TextFormat::new("shout", "Shout", ".shout", &[".shout"], &[]));
/// let doc = parser.parse("hi", &ParseOptions::default());
/// assert_eq!(doc.parsed_content(), "HI");
/// assert_eq!(parser.to_html(&doc, true), "<pre>hi</pre>");
/// ```
pub trait TextParser: Send + Sync {
    /// The format this parser handles primarily.
    fn supported_format(&self) -> &TextFormat;

    /// Whether this parser can handle `format`.
    ///
    /// Defaults to an id match with [`supported_format`](Self::supported_format).
    /// Override to claim additional formats; the registry consults this
    /// during resolution.
    fn can_parse(&self, format: &TextFormat) -> bool {
        format.id() == self.supported_format().id()
    }

    /// Parse raw content into a document.
    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument;

    /// Report problems in `content`, independent of [`parse`](Self::parse).
    ///
    /// Messages cite 1-based line numbers where applicable
    /// (e.g., `"Line 3: Unclosed brackets"`).
    fn validate(&self, content: &str) -> Vec<String> {
        let _ = content;
        Vec::new()
    }

    /// Render a parsed document to HTML.
    ///
    /// The default escapes the raw content into a `<pre>` block and ignores
    /// the theme.
    fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
        let _ = light_mode;
        format!("<pre>{}</pre>", escape_html(document.raw_content()))
    }
}
