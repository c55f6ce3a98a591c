//! Format catalog for Quire.
//!
//! Describes the markup dialects Quire understands and detects which one a
//! document is written in:
//!
//! - [`TextFormat`]: immutable descriptor (id, name, extensions, detection patterns)
//! - [`FormatRegistry`]: ordered catalog with extension, filename and content detection
//!
//! # Example
//!
//! ```
//! use quire_format::{FormatRegistry, DEFAULT_MAX_LINES};
//!
//! let formats = FormatRegistry::new();
//! assert_eq!(formats.detect_by_filename("README.md").id(), "markdown");
//! assert_eq!(formats.detect_by_filename("README").id(), "plaintext");
//!
//! let detected = formats.detect_by_content("(A) Call mom +family", DEFAULT_MAX_LINES);
//! assert_eq!(detected.map(|f| f.id()), Some("todotxt"));
//! ```

mod format;
mod registry;

pub use format::{TextFormat, ids};
pub use registry::{CatalogError, DEFAULT_MAX_LINES, FormatRegistry};
