//! Built-in dialect parsers for Quire.
//!
//! One [`TextParser`](quire_core::TextParser) plugin per catalog format, plus
//! helpers to register them all:
//!
//! - [`create_default_registry`]: a registry with every parser bound eagerly
//! - [`register_all_parsers`] / [`register_all_parsers_lazy`]: add the
//!   built-ins to an existing registry, skipping ids already bound
//! - [`parser_statistics`] / [`initialization_status`]: coverage reports
//!
//! Dialect modules also expose their structural helpers (task lists, headings,
//! front matter) for callers that need more than HTML.
//!
//! # Example
//!
//! ```
//! use quire_core::ParseOptions;
//! use quire_parsers::create_default_registry;
//!
//! let registry = create_default_registry();
//! let format = registry.formats().detect_by_filename("todo.txt").clone();
//! assert_eq!(format.id(), "plaintext");
//!
//! let todo = registry.get_parser_by_id("todotxt").unwrap();
//! let options = ParseOptions::create().set_filename("todo.txt").build();
//! let doc = todo.parse("(A) Call mom +family\nx 2024-01-02 Pay rent", &options);
//! assert_eq!(doc.meta("totalTasks"), Some("2"));
//! assert_eq!(doc.meta("completedTasks"), Some("1"));
//! ```

pub mod asciidoc;
pub mod binary;
pub mod creole;
pub mod csv;
pub mod jupyter;
pub mod keyvalue;
pub mod latex;
pub mod markdown;
pub mod orgmode;
pub mod plaintext;
pub mod restructuredtext;
pub mod rmarkdown;
pub mod taskpaper;
pub mod textile;
pub mod tiddlywiki;
pub mod todotxt;
pub mod wikitext;

mod initializer;
mod styles;
mod util;

pub use crate::asciidoc::AsciidocParser;
pub use crate::binary::BinaryParser;
pub use crate::creole::CreoleParser;
pub use crate::csv::CsvParser;
pub use crate::jupyter::JupyterParser;
pub use crate::keyvalue::KeyValueParser;
pub use crate::latex::LatexParser;
pub use crate::markdown::MarkdownParser;
pub use crate::orgmode::OrgModeParser;
pub use crate::plaintext::PlaintextParser;
pub use crate::restructuredtext::RestructuredTextParser;
pub use crate::rmarkdown::RMarkdownParser;
pub use crate::taskpaper::TaskPaperParser;
pub use crate::textile::TextileParser;
pub use crate::tiddlywiki::TiddlyWikiParser;
pub use crate::todotxt::TodoTxtParser;
pub use crate::wikitext::WikitextParser;
pub use initializer::{
    ParserStatistics, create_default_registry, initialization_status, parser_statistics,
    register_all_parsers, register_all_parsers_lazy,
};
