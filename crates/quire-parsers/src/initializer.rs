//! Registration of the built-in parsers.
//!
//! Registration is idempotent: ids that already have a binding are skipped,
//! so callers may pre-register their own plugin for any built-in id.

use std::collections::BTreeMap;

use quire_core::{ParserRegistry, RegistryError, TextParser};
use quire_format::ids;
use serde::Serialize;

use crate::{
    AsciidocParser, BinaryParser, CreoleParser, CsvParser, JupyterParser, KeyValueParser,
    LatexParser, MarkdownParser, OrgModeParser, PlaintextParser, RMarkdownParser,
    RestructuredTextParser, TaskPaperParser, TextileParser, TiddlyWikiParser, TodoTxtParser,
    WikitextParser,
};

/// Parser coverage of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserStatistics {
    /// Instantiated plus pending lazy parsers.
    pub total_parsers: usize,
    /// Names of catalog formats that have a parser.
    pub supported_formats: Vec<String>,
    /// Names of catalog formats without one.
    pub missing_formats: Vec<String>,
}

/// Bind one built-in parser. Returns whether a binding was added.
fn bind<P, F>(registry: &ParserRegistry, id: &str, lazy: bool, factory: F) -> bool
where
    F: Fn() -> P + Send + Sync + 'static,
    P: TextParser + 'static,
{
    let result = if lazy {
        registry.register_lazy(id, factory)
    } else {
        registry.register(factory())
    };
    match result {
        Ok(()) => true,
        Err(RegistryError::AlreadyRegistered(existing)) => {
            tracing::debug!(format = %existing, "Parser already bound, skipping");
            false
        }
    }
}

fn bind_all(registry: &ParserRegistry, lazy: bool) -> usize {
    let added = [
        bind(registry, ids::PLAINTEXT, lazy, PlaintextParser::new),
        bind(registry, ids::MARKDOWN, lazy, MarkdownParser::new),
        bind(registry, ids::TODOTXT, lazy, TodoTxtParser::new),
        bind(registry, ids::CSV, lazy, CsvParser::new),
        bind(registry, ids::WIKITEXT, lazy, WikitextParser::new),
        bind(registry, ids::KEYVALUE, lazy, KeyValueParser::new),
        bind(registry, ids::ASCIIDOC, lazy, AsciidocParser::new),
        bind(registry, ids::ORGMODE, lazy, OrgModeParser::new),
        bind(registry, ids::LATEX, lazy, LatexParser::new),
        bind(registry, ids::RESTRUCTUREDTEXT, lazy, RestructuredTextParser::new),
        bind(registry, ids::TASKPAPER, lazy, TaskPaperParser::new),
        bind(registry, ids::TEXTILE, lazy, TextileParser::new),
        bind(registry, ids::CREOLE, lazy, CreoleParser::new),
        bind(registry, ids::TIDDLYWIKI, lazy, TiddlyWikiParser::new),
        bind(registry, ids::JUPYTER, lazy, JupyterParser::new),
        bind(registry, ids::RMARKDOWN, lazy, RMarkdownParser::new),
        bind(registry, ids::BINARY, lazy, BinaryParser::new),
    ]
    .into_iter()
    .filter(|&added| added)
    .count();

    tracing::debug!(added, lazy, "Registered built-in parsers");
    added
}

/// Register every built-in parser eagerly.
///
/// Returns the number of parsers added.
pub fn register_all_parsers(registry: &ParserRegistry) -> usize {
    bind_all(registry, false)
}

/// Register every built-in parser as a lazy binding.
///
/// Parsers are constructed on first lookup. Returns the number of bindings
/// added.
pub fn register_all_parsers_lazy(registry: &ParserRegistry) -> usize {
    bind_all(registry, true)
}

/// Whether each catalog format, by name, has a parser.
#[must_use]
pub fn initialization_status(registry: &ParserRegistry) -> BTreeMap<String, bool> {
    registry
        .formats()
        .formats()
        .map(|format| (format.name().to_owned(), registry.has_parser(format)))
        .collect()
}

/// Summarize parser coverage.
#[must_use]
pub fn parser_statistics(registry: &ParserRegistry) -> ParserStatistics {
    let (supported, missing): (Vec<_>, Vec<_>) = registry
        .formats()
        .formats()
        .partition(|format| registry.has_parser(format));

    ParserStatistics {
        total_parsers: registry.instantiated_parser_count() + registry.pending_parser_count(),
        supported_formats: supported.iter().map(|f| f.name().to_owned()).collect(),
        missing_formats: missing.iter().map(|f| f.name().to_owned()).collect(),
    }
}

/// A registry over the built-in catalog with every parser registered.
#[must_use]
pub fn create_default_registry() -> ParserRegistry {
    let registry = ParserRegistry::new();
    register_all_parsers(&registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_core::{ParseOptions, ParsedDocument};
    use quire_format::TextFormat;

    #[test]
    fn test_default_registry_covers_catalog() {
        let registry = create_default_registry();
        assert_eq!(registry.instantiated_parser_count(), 17);

        let stats = parser_statistics(&registry);
        assert_eq!(stats.total_parsers, 17);
        assert_eq!(stats.supported_formats.len(), 17);
        assert!(stats.missing_formats.is_empty());

        for format in registry.formats().formats() {
            let parser = registry.get_parser(format).unwrap();
            assert_eq!(parser.supported_format().id(), format.id());
        }
    }

    #[test]
    fn test_registration_is_idempotent() {
        let registry = ParserRegistry::new();
        assert_eq!(register_all_parsers(&registry), 17);
        assert_eq!(register_all_parsers(&registry), 0);
        assert_eq!(register_all_parsers_lazy(&registry), 0);
        assert_eq!(registry.instantiated_parser_count(), 17);
    }

    #[test]
    fn test_lazy_registration_defers_construction() {
        let registry = ParserRegistry::new();
        assert_eq!(register_all_parsers_lazy(&registry), 17);
        assert_eq!(registry.instantiated_parser_count(), 0);
        assert_eq!(registry.pending_parser_count(), 17);
        assert_eq!(parser_statistics(&registry).total_parsers, 17);

        let markdown = registry.get_parser_by_id(ids::MARKDOWN).unwrap();
        assert_eq!(markdown.supported_format().id(), ids::MARKDOWN);
        assert_eq!(registry.instantiated_parser_count(), 1);
        assert_eq!(registry.pending_parser_count(), 16);
    }

    struct Custom(&'static TextFormat);

    impl TextParser for Custom {
        fn supported_format(&self) -> &TextFormat {
            self.0
        }

        fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
            ParsedDocument::new(self.0.clone(), content, "custom")
        }
    }

    #[test]
    fn test_existing_binding_is_kept() {
        let registry = ParserRegistry::new();
        registry
            .register(Custom(TextFormat::builtin(ids::MARKDOWN).unwrap()))
            .unwrap();
        assert_eq!(register_all_parsers(&registry), 16);

        let parser = registry.get_parser_by_id(ids::MARKDOWN).unwrap();
        let doc = parser.parse("# x", &ParseOptions::default());
        assert_eq!(doc.parsed_content(), "custom");
    }

    #[test]
    fn test_status_and_missing_formats() {
        let registry = ParserRegistry::new();
        registry.register(MarkdownParser::new()).unwrap();

        let status = initialization_status(&registry);
        assert_eq!(status.len(), 17);
        assert_eq!(status.get("Markdown"), Some(&true));
        assert_eq!(status.get("CSV"), Some(&false));

        let stats = parser_statistics(&registry);
        assert_eq!(stats.total_parsers, 1);
        assert_eq!(stats.supported_formats, vec!["Markdown"]);
        assert_eq!(stats.missing_formats.len(), 16);
    }

    #[test]
    fn test_statistics_serialize() {
        let stats = ParserStatistics {
            total_parsers: 1,
            supported_formats: vec!["Markdown".to_owned()],
            missing_formats: Vec::new(),
        };
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"total_parsers":1,"supported_formats":["Markdown"],"missing_formats":[]}"#
        );
    }
}
