//! Format catalog with extension and content detection.

use std::collections::{BTreeSet, HashSet};

use regex::{Regex, RegexBuilder};

use crate::format::{TextFormat, builtin_catalog, ids};

/// Number of leading lines inspected by content detection by default.
pub const DEFAULT_MAX_LINES: usize = 10;

/// Error raised when a custom catalog violates a catalog invariant.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two entries share the same id.
    #[error("Duplicate format id in catalog: {0}")]
    DuplicateId(String),
    /// An extension does not start with a dot.
    #[error("Extension '{extension}' of format '{format}' must start with '.'")]
    InvalidExtension {
        /// Format the extension belongs to.
        format: String,
        /// Offending extension.
        extension: String,
    },
    /// A detection pattern is not a valid regular expression.
    #[error("Invalid detection pattern for format '{format}': {source}")]
    InvalidPattern {
        /// Format the pattern belongs to.
        format: String,
        /// Underlying regex error.
        source: regex::Error,
    },
    /// The catalog has no plaintext entry to fall back on.
    #[error("Catalog must contain a '{}' format", ids::PLAINTEXT)]
    MissingFallback,
}

/// A catalog entry with its detection patterns compiled.
struct Entry {
    format: TextFormat,
    patterns: Vec<Regex>,
}

/// Ordered catalog of [`TextFormat`]s.
///
/// The catalog never changes after construction, so a registry can be shared
/// across threads without locking. Lookups scan entries in declaration order,
/// which is also the tie-break order for detection.
pub struct FormatRegistry {
    entries: Vec<Entry>,
    plaintext: usize,
}

impl FormatRegistry {
    /// Create a registry holding the built-in catalog.
    #[must_use]
    pub fn new() -> Self {
        match Self::with_formats(builtin_catalog()) {
            Ok(registry) => registry,
            Err(err) => unreachable!("built-in catalog is invalid: {err}"),
        }
    }

    /// Create a registry from a custom catalog.
    ///
    /// Detection patterns are compiled once, with `^` and `$` anchored to
    /// line boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on duplicate ids, extensions without a leading
    /// dot, invalid patterns, or a missing plaintext fallback entry.
    pub fn with_formats(formats: Vec<TextFormat>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(formats.len());

        for format in formats {
            if !seen.insert(format.id().to_owned()) {
                return Err(CatalogError::DuplicateId(format.id().to_owned()));
            }
            if let Some(ext) = format.extensions().iter().find(|e| !e.starts_with('.')) {
                return Err(CatalogError::InvalidExtension {
                    format: format.id().to_owned(),
                    extension: ext.clone(),
                });
            }
            let patterns = format
                .detection_patterns()
                .iter()
                .map(|p| RegexBuilder::new(p).multi_line(true).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CatalogError::InvalidPattern {
                    format: format.id().to_owned(),
                    source,
                })?;
            entries.push(Entry { format, patterns });
        }

        let plaintext = entries
            .iter()
            .position(|e| e.format.id() == ids::PLAINTEXT)
            .ok_or(CatalogError::MissingFallback)?;

        tracing::debug!(formats = entries.len(), "Format catalog built");
        Ok(Self { entries, plaintext })
    }

    /// All formats in declaration order.
    pub fn formats(&self) -> impl Iterator<Item = &TextFormat> {
        self.entries.iter().map(|e| &e.format)
    }

    /// Number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty. Always false for a valid catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The plaintext fallback format.
    #[must_use]
    pub fn plaintext(&self) -> &TextFormat {
        &self.entries[self.plaintext].format
    }

    /// Look up a format by exact, case-sensitive id.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&TextFormat> {
        self.formats().find(|f| f.id() == id)
    }

    /// Whether a format with this id is in the catalog.
    #[must_use]
    pub fn is_supported(&self, id: &str) -> bool {
        self.get_by_id(id).is_some()
    }

    /// Detect a format from a file extension.
    ///
    /// The extension is trimmed, lowercased and given a single leading dot.
    /// The first format in declaration order that lists it wins; unknown
    /// extensions fall back to plaintext.
    #[must_use]
    pub fn detect_by_extension(&self, extension: &str) -> &TextFormat {
        let normalized = normalize_extension(extension);
        self.formats()
            .find(|f| f.has_extension(&normalized))
            .unwrap_or_else(|| self.plaintext())
    }

    /// All formats listing the extension, in declaration order.
    ///
    /// Unlike [`detect_by_extension`](Self::detect_by_extension), an unknown
    /// extension yields an empty list rather than the plaintext fallback.
    #[must_use]
    pub fn get_formats_by_extension(&self, extension: &str) -> Vec<&TextFormat> {
        let normalized = normalize_extension(extension);
        self.formats()
            .filter(|f| f.has_extension(&normalized))
            .collect()
    }

    /// Detect a format from a filename.
    ///
    /// Uses the text after the last `.`; a name without a dot detects as
    /// plaintext.
    #[must_use]
    pub fn detect_by_filename(&self, filename: &str) -> &TextFormat {
        let extension = filename.rsplit_once('.').map_or("", |(_, ext)| ext);
        self.detect_by_extension(extension)
    }

    /// Detect a format from the first `max_lines` lines of content.
    ///
    /// Returns `None` for empty content or when no pattern matches.
    #[must_use]
    pub fn detect_by_content(&self, content: &str, max_lines: usize) -> Option<&TextFormat> {
        if content.is_empty() {
            return None;
        }

        let found = first_match(self.entries.iter(), content, max_lines);

        if let Some(format) = found {
            tracing::trace!(format = %format.id(), "Detected format from content");
        }
        found
    }

    /// Detect a format from an optional filename and the content.
    ///
    /// A filename whose extension belongs to exactly one format decides on its
    /// own. When several formats share the extension (such as `.txt`), only their
    /// own patterns are tried, and the first declared one is the default. Without a
    /// known extension, content detection decides and plaintext is the fallback.
    #[must_use]
    pub fn detect(&self, filename: Option<&str>, content: &str, max_lines: usize) -> &TextFormat {
        let candidates = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| self.get_formats_by_extension(ext))
            .unwrap_or_default();

        let by_content = || self.detect_by_content(content, max_lines);

        match candidates.as_slice() {
            [] => by_content().unwrap_or_else(|| self.plaintext()),
            [only] => *only,
            [first, ..] => {
                let shared = self.entries.iter().filter(|e| candidates.contains(&&e.format));
                first_match(shared, content, max_lines).unwrap_or(*first)
            }
        }
    }

    /// Display names of all formats, one per entry.
    #[must_use]
    pub fn get_format_names(&self) -> Vec<&str> {
        self.formats().map(TextFormat::name).collect()
    }

    /// Every extension known to the catalog.
    #[must_use]
    pub fn get_all_extensions(&self) -> BTreeSet<&str> {
        self.formats()
            .flat_map(|f| f.extensions().iter().map(String::as_str))
            .collect()
    }

    /// Whether any format lists the extension. A missing leading dot is tolerated.
    #[must_use]
    pub fn is_extension_supported(&self, extension: &str) -> bool {
        !self.get_formats_by_extension(extension).is_empty()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.formats().map(TextFormat::id))
            .finish()
    }
}

/// Normalize an extension to lowercase with exactly one leading dot.
fn normalize_extension(extension: &str) -> String {
    let bare = extension.trim().trim_start_matches('.');
    format!(".{}", bare.to_lowercase())
}

/// First entry, in the given order, with a pattern matching the content head.
fn first_match<'a>(
    mut entries: impl Iterator<Item = &'a Entry>,
    content: &str,
    max_lines: usize,
) -> Option<&'a TextFormat> {
    let head = content.lines().take(max_lines).collect::<Vec<_>>().join("\n");
    entries
        .find(|e| e.patterns.iter().any(|p| p.is_match(&head)))
        .map(|e| &e.format)
}
