//! Parser plugin contract and dispatch for Quire.
//!
//! This crate defines how dialect plugins plug into the engine:
//!
//! - [`TextParser`]: the plugin trait (`parse`, `validate`, `to_html`, `can_parse`)
//! - [`ParserRegistry`]: explicit registry with eager and lazy bindings
//! - [`ParsedDocument`]: parse result with a per-theme HTML cache
//! - [`ParseOptions`]: typed, immutable parse options built fluently
//! - [`escape_html`]: shared escaping primitive
//!
//! # Example
//!
//! ```
//! use quire_core::{ParseOptions, ParsedDocument, ParserRegistry, TextParser};
//! use quire_format::TextFormat;
//!
//! struct Echo(&'static TextFormat);
//!
//! impl TextParser for Echo {
//!     fn supported_format(&self) -> &TextFormat {
//!         self.0
//!     }
//!
//!     fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
//!         ParsedDocument::new(self.0.clone(), content, content)
//!     }
//! }
//!
//! let registry = ParserRegistry::new();
//! registry
//!     .register(Echo(TextFormat::builtin("plaintext").unwrap()))
//!     .unwrap();
//!
//! let format = registry.formats().detect_by_filename("notes.txt").clone();
//! let parser = registry.get_parser(&format).unwrap();
//! let doc = parser.parse("a < b", &ParseOptions::default());
//! assert_eq!(doc.to_html(&registry, true).unwrap(), "<pre>a &lt; b</pre>");
//! ```

mod document;
mod escape;
pub mod options;
mod parser;
mod registry;

pub use document::{ParsedDocument, RenderError};
pub use escape::escape_html;
pub use options::{OptionValue, ParseOptions, ParseOptionsBuilder};
pub use parser::TextParser;
pub use registry::{ParserRegistry, RegistryError};
