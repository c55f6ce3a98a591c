//! Format descriptors.

use std::sync::LazyLock;

/// Well-known format identifiers.
///
/// Every built-in catalog entry uses one of these ids. [`UNKNOWN`](ids::UNKNOWN)
/// is reserved and never appears in the catalog.
pub mod ids {
    pub const UNKNOWN: &str = "unknown";
    pub const PLAINTEXT: &str = "plaintext";
    pub const MARKDOWN: &str = "markdown";
    pub const TODOTXT: &str = "todotxt";
    pub const CSV: &str = "csv";
    pub const WIKITEXT: &str = "wikitext";
    pub const KEYVALUE: &str = "keyvalue";
    pub const ASCIIDOC: &str = "asciidoc";
    pub const ORGMODE: &str = "orgmode";
    pub const LATEX: &str = "latex";
    pub const RESTRUCTUREDTEXT: &str = "restructuredtext";
    pub const TASKPAPER: &str = "taskpaper";
    pub const TEXTILE: &str = "textile";
    pub const CREOLE: &str = "creole";
    pub const TIDDLYWIKI: &str = "tiddlywiki";
    pub const JUPYTER: &str = "jupyter";
    pub const RMARKDOWN: &str = "rmarkdown";
    pub const BINARY: &str = "binary";
}

/// Immutable description of one markup dialect.
///
/// Two formats are equal when all of their fields are equal. Formats are
/// built once when a [`FormatRegistry`](crate::FormatRegistry) is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TextFormat {
    id: String,
    name: String,
    default_extension: String,
    extensions: Vec<String>,
    detection_patterns: Vec<String>,
}

impl TextFormat {
    /// Create a format descriptor.
    ///
    /// Extensions are stored as given; the registry checks that each one
    /// starts with a dot.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        default_extension: impl Into<String>,
        extensions: &[&str],
        detection_patterns: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            default_extension: default_extension.into(),
            extensions: extensions.iter().map(|&e| e.to_owned()).collect(),
            detection_patterns: detection_patterns.iter().map(|&p| p.to_owned()).collect(),
        }
    }

    /// Unique identifier (e.g., `markdown`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name (e.g., `Markdown`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension used when creating new files of this format.
    #[must_use]
    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    /// All recognized extensions, in preference order.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Regular expressions used for content detection.
    #[must_use]
    pub fn detection_patterns(&self) -> &[String] {
        &self.detection_patterns
    }

    /// Look up a built-in catalog entry by id.
    ///
    /// Dialect plugins use this to name the format they handle without
    /// building a [`FormatRegistry`](crate::FormatRegistry).
    #[must_use]
    pub fn builtin(id: &str) -> Option<&'static Self> {
        BUILTIN.iter().find(|f| f.id == id)
    }

    /// Whether `extension` (already normalized) belongs to this format.
    #[must_use]
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

impl std::fmt::Display for TextFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

static BUILTIN: LazyLock<Vec<TextFormat>> = LazyLock::new(builtin_formats);

/// A fresh copy of the built-in catalog.
pub(crate) fn builtin_catalog() -> Vec<TextFormat> {
    BUILTIN.clone()
}

/// The built-in catalog, in detection order.
///
/// Order matters: content detection returns the first entry with a matching
/// pattern, so narrower dialects precede broader ones.
fn builtin_formats() -> Vec<TextFormat> {
    vec![
        TextFormat::new(
            ids::MARKDOWN,
            "Markdown",
            ".md",
            &[".md", ".markdown", ".mdown", ".mkd"],
            &[r"^#+ ", r"^\[.*\]\(.*\)", r"^\*\*.*\*\*"],
        ),
        TextFormat::new(
            ids::PLAINTEXT,
            "Plain Text",
            ".txt",
            &[".txt", ".text", ".log"],
            &[],
        ),
        TextFormat::new(
            ids::TODOTXT,
            "Todo.txt",
            ".txt",
            &[".txt"],
            &[r"^\(([A-Z])\) ", r"^x \d{4}-\d{2}-\d{2}"],
        ),
        TextFormat::new(ids::CSV, "CSV", ".csv", &[".csv"], &[r"^.*,.*,.*$"]),
        TextFormat::new(
            ids::WIKITEXT,
            "WikiText",
            ".wiki",
            &[".wiki", ".wikitext"],
            &[r"^==+ .* ==+$", r"^\[\[.*\]\]"],
        ),
        TextFormat::new(ids::ORGMODE, "Org Mode", ".org", &[".org"], &[r"^\* ", r"^#\+"]),
        TextFormat::new(
            ids::CREOLE,
            "Creole",
            ".creole",
            &[".creole"],
            &[r"^=+ ", r"^\*\* "],
        ),
        TextFormat::new(
            ids::TIDDLYWIKI,
            "TiddlyWiki",
            ".tid",
            &[".tid", ".tiddly"],
            &[r"^!+ ", r"^title: "],
        ),
        TextFormat::new(
            ids::LATEX,
            "LaTeX",
            ".tex",
            &[".tex", ".latex"],
            &[r"\\documentclass", r"\\begin\{document\}"],
        ),
        TextFormat::new(
            ids::ASCIIDOC,
            "AsciiDoc",
            ".adoc",
            &[".adoc", ".asciidoc"],
            &[r"^= ", r"^== "],
        ),
        TextFormat::new(
            ids::RESTRUCTUREDTEXT,
            "reStructuredText",
            ".rst",
            &[".rst", ".rest"],
            &[r"^=+$", r"^-+$", r"^\.\. "],
        ),
        TextFormat::new(
            ids::KEYVALUE,
            "Key-Value",
            ".ini",
            &[".keyvalue", ".properties", ".ini"],
            &[r"^[a-zA-Z_]+\s*=", r"^\[.*\]$"],
        ),
        TextFormat::new(
            ids::TASKPAPER,
            "TaskPaper",
            ".taskpaper",
            &[".taskpaper"],
            &[r"^\t- ", r"^.*:$"],
        ),
        TextFormat::new(
            ids::TEXTILE,
            "Textile",
            ".textile",
            &[".textile"],
            &[r"^h[1-6]\. ", r"^\*+ "],
        ),
        TextFormat::new(
            ids::JUPYTER,
            "Jupyter Notebook",
            ".ipynb",
            &[".ipynb"],
            &[r#""nbformat":"#, r#""cell_type":"#],
        ),
        TextFormat::new(
            ids::RMARKDOWN,
            "R Markdown",
            ".rmd",
            &[".rmd", ".rmarkdown"],
            &[r"```\{r", r"^---$"],
        ),
        // Sentinel: never matched by extension or content.
        TextFormat::new(ids::BINARY, "Binary", ".bin", &[], &[]),
    ]
}
