//! Parser registry with eager and lazy bindings.
//!
//! A [`ParserRegistry`] binds format ids to [`TextParser`] plugins. Each id
//! is bound at most once, either to a parser instance or to a factory that
//! builds one on first lookup. Resolution honors
//! [`TextParser::can_parse`], so one plugin may serve several formats.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use quire_format::{FormatRegistry, TextFormat};

use crate::parser::TextParser;

/// Deferred parser constructor.
type ParserFactory = Arc<dyn Fn() -> Arc<dyn TextParser> + Send + Sync>;

/// Registration error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The id already has an eager or lazy binding.
    #[error("Parser for format '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Bindings table. Both lists keep registration order.
#[derive(Default)]
struct Bindings {
    eager: Vec<(String, Arc<dyn TextParser>)>,
    lazy: Vec<(String, ParserFactory)>,
}

impl Bindings {
    fn eager(&self, id: &str) -> Option<&Arc<dyn TextParser>> {
        self.eager.iter().find(|(bound, _)| bound == id).map(|(_, p)| p)
    }

    fn lazy(&self, id: &str) -> Option<&ParserFactory> {
        self.lazy.iter().find(|(bound, _)| bound == id).map(|(_, f)| f)
    }

    fn is_bound(&self, id: &str) -> bool {
        self.eager(id).is_some() || self.lazy(id).is_some()
    }
}

/// Registry mapping format ids to parser plugins.
///
/// The registry owns the [`FormatRegistry`] used to resolve ids, and guards
/// its bindings with a lock so it can be shared across threads. Factories
/// run outside the lock.
pub struct ParserRegistry {
    formats: Arc<FormatRegistry>,
    bindings: RwLock<Bindings>,
}

impl ParserRegistry {
    /// Create an empty registry over the built-in format catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_formats(Arc::new(FormatRegistry::new()))
    }

    /// Create an empty registry over a custom format catalog.
    #[must_use]
    pub fn with_formats(formats: Arc<FormatRegistry>) -> Self {
        Self {
            formats,
            bindings: RwLock::new(Bindings::default()),
        }
    }

    /// The format catalog used for id resolution.
    #[must_use]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Bind a parser under its supported format id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the id already has an
    /// eager or lazy binding. The registry is left unchanged.
    pub fn register<P: TextParser + 'static>(&self, parser: P) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(parser))
    }

    /// Bind a shared parser instance under its supported format id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] on a duplicate id.
    pub fn register_arc(&self, parser: Arc<dyn TextParser>) -> Result<(), RegistryError> {
        let id = parser.supported_format().id().to_owned();
        let mut bindings = self.write();
        if bindings.is_bound(&id) {
            tracing::warn!(format = %id, "Rejected duplicate parser registration");
            return Err(RegistryError::AlreadyRegistered(id));
        }
        tracing::debug!(format = %id, "Registered parser");
        bindings.eager.push((id, parser));
        Ok(())
    }

    /// Bind a factory that builds the parser on first lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the id already has an
    /// eager or lazy binding.
    pub fn register_lazy<F, P>(&self, id: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: TextParser + 'static,
    {
        let id = id.into();
        let mut bindings = self.write();
        if bindings.is_bound(&id) {
            tracing::warn!(format = %id, "Rejected duplicate lazy parser registration");
            return Err(RegistryError::AlreadyRegistered(id));
        }
        tracing::debug!(format = %id, "Registered lazy parser");
        let factory: ParserFactory = Arc::new(move || Arc::new(factory()) as Arc<dyn TextParser>);
        bindings.lazy.push((id, factory));
        Ok(())
    }

    /// Resolve the parser for a format.
    ///
    /// Tries the parser bound under the format's id first, materializing a
    /// lazy binding if needed, and accepts it when it can parse the format.
    /// Otherwise returns the first bound parser (eager ones first, then lazy
    /// ones in registration order) whose `can_parse` accepts the format.
    #[must_use]
    pub fn get_parser(&self, format: &TextFormat) -> Option<Arc<dyn TextParser>> {
        if let Some(parser) = self.lookup(format.id())
            && parser.can_parse(format)
        {
            return Some(parser);
        }

        let (eager, pending): (Vec<_>, Vec<_>) = {
            let bindings = self.read();
            (
                bindings.eager.iter().map(|(_, p)| Arc::clone(p)).collect(),
                bindings.lazy.iter().map(|(id, _)| id.clone()).collect(),
            )
        };

        if let Some(parser) = eager.into_iter().find(|p| p.can_parse(format)) {
            return Some(parser);
        }

        pending
            .iter()
            .filter_map(|id| self.lookup(id))
            .find(|p| p.can_parse(format))
    }

    /// Resolve a parser by format id.
    ///
    /// The id must name a format in the catalog; otherwise returns `None`
    /// even if a parser is bound under that string.
    #[must_use]
    pub fn get_parser_by_id(&self, id: &str) -> Option<Arc<dyn TextParser>> {
        let format = self.formats.get_by_id(id)?;
        self.get_parser(format)
    }

    /// Whether some binding can serve the format. Never materializes.
    ///
    /// This is a cheap approximation of [`get_parser`](Self::get_parser) and
    /// can disagree with it in two cases:
    ///
    /// - a pending lazy binding under another id whose parser would claim the
    ///   format through `can_parse` is not seen, so this returns `false` while
    ///   `get_parser` materializes it and returns `Some`;
    /// - a binding under the format's own id counts even if its `can_parse`
    ///   rejects the format, so this returns `true` while `get_parser` may
    ///   return `None`.
    #[must_use]
    pub fn has_parser(&self, format: &TextFormat) -> bool {
        let bindings = self.read();
        bindings.is_bound(format.id()) || bindings.eager.iter().any(|(_, p)| p.can_parse(format))
    }

    /// Snapshot of the instantiated parsers, in registration order.
    #[must_use]
    pub fn get_all_parsers(&self) -> Vec<Arc<dyn TextParser>> {
        self.read().eager.iter().map(|(_, p)| Arc::clone(p)).collect()
    }

    /// Number of lazy bindings not yet materialized.
    #[must_use]
    pub fn pending_parser_count(&self) -> usize {
        self.read().lazy.len()
    }

    /// Number of instantiated parsers.
    #[must_use]
    pub fn instantiated_parser_count(&self) -> usize {
        self.read().eager.len()
    }

    /// Remove every binding, eager and lazy.
    pub fn clear(&self) {
        let mut bindings = self.write();
        bindings.eager.clear();
        bindings.lazy.clear();
        tracing::debug!("Cleared parser registry");
    }

    /// Find the parser bound under `id`, materializing a lazy binding.
    fn lookup(&self, id: &str) -> Option<Arc<dyn TextParser>> {
        let factory = {
            let bindings = self.read();
            if let Some(parser) = bindings.eager(id) {
                return Some(Arc::clone(parser));
            }
            Arc::clone(bindings.lazy(id)?)
        };

        let built = factory();

        let mut bindings = self.write();
        if let Some(pos) = bindings.lazy.iter().position(|(bound, _)| bound == id) {
            let (id, _) = bindings.lazy.remove(pos);
            tracing::debug!(format = %id, "Materialized lazy parser");
            bindings.eager.push((id, Arc::clone(&built)));
            Some(built)
        } else {
            // Another caller materialized it first, or the registry was cleared.
            Some(bindings.eager(id).map_or(built, Arc::clone))
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Bindings> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bindings> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self.read();
        f.debug_struct("ParserRegistry")
            .field(
                "eager",
                &bindings.eager.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field(
                "lazy",
                &bindings.lazy.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::document::ParsedDocument;
    use crate::options::ParseOptions;

    static_assertions::assert_impl_all!(ParserRegistry: Send, Sync);

    /// Test parser tagged so tests can tell instances apart.
    struct Stub {
        format: TextFormat,
        tag: &'static str,
        also: Vec<&'static str>,
    }

    impl Stub {
        fn new(id: &str, tag: &'static str) -> Self {
            Self {
                format: TextFormat::new(id, id, format!(".{id}"), &[], &[]),
                tag,
                also: Vec::new(),
            }
        }

        fn builtin(id: &str, tag: &'static str) -> Self {
            Self {
                format: TextFormat::builtin(id).unwrap().clone(),
                tag,
                also: Vec::new(),
            }
        }

        fn claiming(mut self, ids: &[&'static str]) -> Self {
            self.also = ids.to_vec();
            self
        }
    }

    impl TextParser for Stub {
        fn supported_format(&self) -> &TextFormat {
            &self.format
        }

        fn can_parse(&self, format: &TextFormat) -> bool {
            format.id() == self.format.id() || self.also.contains(&format.id())
        }

        fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
            ParsedDocument::new(self.format.clone(), content, self.tag)
        }
    }

    fn tag_of(parser: &Arc<dyn TextParser>) -> String {
        parser
            .parse("", &ParseOptions::default())
            .parsed_content()
            .to_owned()
    }

    fn format(id: &str) -> TextFormat {
        TextFormat::builtin(id).unwrap().clone()
    }

    #[test]
    fn test_duplicate_eager_rejected_and_first_kept() {
        let registry = ParserRegistry::new();
        registry.register(Stub::new("dup", "first")).unwrap();

        let err = registry.register(Stub::new("dup", "second")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("dup"));
        assert!(message.contains("already registered"));

        let all = registry.get_all_parsers();
        assert_eq!(all.len(), 1);
        assert_eq!(tag_of(&all[0]), "first");
    }

    #[test]
    fn test_duplicate_across_modes_rejected() {
        let registry = ParserRegistry::new();
        registry.register(Stub::builtin("csv", "eager")).unwrap();
        assert!(registry
            .register_lazy("csv", || Stub::builtin("csv", "lazy"))
            .is_err());

        registry
            .register_lazy("latex", || Stub::builtin("latex", "lazy"))
            .unwrap();
        assert!(registry.register(Stub::builtin("latex", "eager")).is_err());
        assert_eq!(registry.pending_parser_count(), 1);
        assert_eq!(registry.instantiated_parser_count(), 1);
    }

    #[test]
    fn test_lazy_materializes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ParserRegistry::new();
        let counter = Arc::clone(&calls);
        registry
            .register_lazy("markdown", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Stub::builtin("markdown", "lazy")
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.has_parser(&format("markdown")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let parser = registry.get_parser(&format("markdown")).unwrap();
        assert_eq!(tag_of(&parser), "lazy");
        registry.get_parser(&format("markdown")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending_parser_count(), 0);
        assert_eq!(registry.instantiated_parser_count(), 1);
    }

    #[test]
    fn test_can_parse_fallback() {
        let registry = ParserRegistry::new();
        registry
            .register(Stub::builtin("markdown", "md").claiming(&["rmarkdown"]))
            .unwrap();

        let parser = registry.get_parser(&format("rmarkdown")).unwrap();
        assert_eq!(tag_of(&parser), "md");
        assert!(registry.has_parser(&format("rmarkdown")));
        assert!(registry.get_parser(&format("csv")).is_none());
    }

    #[test]
    fn test_direct_binding_rejected_by_can_parse_falls_through() {
        struct Picky(TextFormat);
        impl TextParser for Picky {
            fn supported_format(&self) -> &TextFormat {
                &self.0
            }
            fn can_parse(&self, _format: &TextFormat) -> bool {
                false
            }
            fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
                ParsedDocument::new(self.0.clone(), content, "picky")
            }
        }

        let registry = ParserRegistry::new();
        registry.register(Picky(format("textile"))).unwrap();
        registry
            .register(Stub::builtin("creole", "creole").claiming(&["textile"]))
            .unwrap();

        let parser = registry.get_parser(&format("textile")).unwrap();
        assert_eq!(tag_of(&parser), "creole");
    }

    #[test]
    fn test_has_parser_counts_binding_that_rejects_format() {
        struct Refuses(TextFormat);
        impl TextParser for Refuses {
            fn supported_format(&self) -> &TextFormat {
                &self.0
            }
            fn can_parse(&self, _format: &TextFormat) -> bool {
                false
            }
            fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
                ParsedDocument::new(self.0.clone(), content, "refuses")
            }
        }

        let registry = ParserRegistry::new();
        registry.register(Refuses(format("latex"))).unwrap();

        assert!(registry.has_parser(&format("latex")));
        assert!(registry.get_parser(&format("latex")).is_none());
    }

    #[test]
    fn test_lazy_claimant_found_by_scan() {
        let registry = ParserRegistry::new();
        registry
            .register_lazy("orgmode", || {
                Stub::builtin("orgmode", "org").claiming(&["taskpaper"])
            })
            .unwrap();

        assert!(!registry.has_parser(&format("taskpaper")));
        let parser = registry.get_parser(&format("taskpaper")).unwrap();
        assert_eq!(tag_of(&parser), "org");
        assert_eq!(registry.pending_parser_count(), 0);
    }

    #[test]
    fn test_get_parser_by_id_requires_catalog_entry() {
        let registry = ParserRegistry::new();
        registry.register(Stub::new("custom", "custom")).unwrap();
        registry.register(Stub::builtin("csv", "csv")).unwrap();

        assert!(registry.get_parser_by_id("custom").is_none());
        assert!(registry.get_parser_by_id("csv").is_some());
        assert!(registry.get_parser_by_id("CSV").is_none());
    }

    #[test]
    fn test_get_all_parsers_is_snapshot() {
        let registry = ParserRegistry::new();
        registry.register(Stub::builtin("csv", "csv")).unwrap();
        let snapshot = registry.get_all_parsers();
        registry.register(Stub::builtin("latex", "latex")).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.get_all_parsers().len(), 2);
    }

    #[test]
    fn test_clear_removes_everything() {
        let registry = ParserRegistry::new();
        registry.register(Stub::builtin("csv", "csv")).unwrap();
        registry
            .register_lazy("latex", || Stub::builtin("latex", "latex"))
            .unwrap();

        registry.clear();

        assert_eq!(registry.instantiated_parser_count(), 0);
        assert_eq!(registry.pending_parser_count(), 0);
        assert!(!registry.has_parser(&format("csv")));
        assert!(!registry.has_parser(&format("latex")));
        registry.register(Stub::builtin("csv", "again")).unwrap();
    }

    #[test]
    fn test_independent_instances() {
        let a = ParserRegistry::new();
        let b = ParserRegistry::new();
        a.register(Stub::builtin("csv", "a")).unwrap();
        assert!(a.has_parser(&format("csv")));
        assert!(!b.has_parser(&format("csv")));
    }

    #[test]
    fn test_concurrent_lazy_lookup() {
        let registry = Arc::new(ParserRegistry::new());
        registry
            .register_lazy("csv", || Stub::builtin("csv", "csv"))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_parser(&format("csv")).is_some())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.instantiated_parser_count(), 1);
        assert_eq!(registry.pending_parser_count(), 0);
    }
}
