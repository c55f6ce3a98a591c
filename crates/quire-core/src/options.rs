//! Parse options.
//!
//! [`ParseOptions`] is an immutable snapshot handed to
//! [`TextParser::parse`](crate::TextParser::parse). Well-known options are
//! typed fields; anything else lands in an ordered extras map so plugins can
//! accept their own settings.
//!
//! Keys mirror the names used in option maps: `lineNumbers`, `highlighting`,
//! `baseUrl` and `filename`.

use std::collections::BTreeMap;
use std::fmt;

/// Key for the line-numbers flag.
pub const LINE_NUMBERS: &str = "lineNumbers";
/// Key for the syntax-highlighting flag.
pub const HIGHLIGHTING: &str = "highlighting";
/// Key for the base URL used to resolve relative links.
pub const BASE_URL: &str = "baseUrl";
/// Key for the source filename hint.
pub const FILENAME: &str = "filename";

/// Value of a caller-defined option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl OptionValue {
    /// The boolean value, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The text value, if this is a `Text`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Immutable options passed to a parser.
///
/// Built with [`ParseOptions::create`]. `ParseOptions::default()` is the
/// empty option set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    line_numbers: Option<bool>,
    highlighting: Option<bool>,
    base_url: Option<String>,
    filename: Option<String>,
    extras: BTreeMap<String, OptionValue>,
}

impl ParseOptions {
    /// Start building options.
    #[must_use]
    pub fn create() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }

    /// Alias for [`create`](Self::create).
    #[must_use]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }

    /// Whether line numbers were requested. Defaults to `false`.
    #[must_use]
    pub fn line_numbers(&self) -> bool {
        self.line_numbers.unwrap_or(false)
    }

    /// Whether syntax highlighting was requested. Defaults to `false`.
    #[must_use]
    pub fn highlighting(&self) -> bool {
        self.highlighting.unwrap_or(false)
    }

    /// Base URL for relative links, if set.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Filename hint, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Lowercase extension of the filename hint, including the dot.
    ///
    /// Empty when there is no filename or it has no dot.
    #[must_use]
    pub fn extension(&self) -> String {
        self.filename()
            .and_then(|name| name.rfind('.').map(|dot| name[dot..].to_lowercase()))
            .unwrap_or_default()
    }

    /// A caller-defined option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.extras.get(key)
    }

    /// A caller-defined text option.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_str)
    }

    /// Flat view of every option that was set, keyed by option name.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<String, OptionValue> {
        let mut map = self.extras.clone();
        if let Some(v) = self.line_numbers {
            map.insert(LINE_NUMBERS.to_owned(), v.into());
        }
        if let Some(v) = self.highlighting {
            map.insert(HIGHLIGHTING.to_owned(), v.into());
        }
        if let Some(v) = &self.base_url {
            map.insert(BASE_URL.to_owned(), v.as_str().into());
        }
        if let Some(v) = &self.filename {
            map.insert(FILENAME.to_owned(), v.as_str().into());
        }
        map
    }

    /// Whether no option was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_numbers.is_none()
            && self.highlighting.is_none()
            && self.base_url.is_none()
            && self.filename.is_none()
            && self.extras.is_empty()
    }
}

/// Fluent builder for [`ParseOptions`].
///
/// [`build`](Self::build) takes a snapshot; changing the builder afterwards
/// does not affect options already built.
#[derive(Clone, Debug, Default)]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptionsBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request line numbers in rendered code.
    #[must_use]
    pub fn enable_line_numbers(mut self, enable: bool) -> Self {
        self.options.line_numbers = Some(enable);
        self
    }

    /// Request syntax highlighting.
    #[must_use]
    pub fn enable_highlighting(mut self, enable: bool) -> Self {
        self.options.highlighting = Some(enable);
        self
    }

    /// Set the base URL for relative links.
    #[must_use]
    pub fn set_base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = Some(url.into());
        self
    }

    /// Set the filename hint.
    #[must_use]
    pub fn set_filename(mut self, filename: impl Into<String>) -> Self {
        self.options.filename = Some(filename.into());
        self
    }

    /// Set an option by key.
    ///
    /// Well-known keys with a matching value type update the typed field;
    /// every other key is stored as an extra.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let key = key.into();
        match (key.as_str(), value.into()) {
            (LINE_NUMBERS, OptionValue::Bool(b)) => self.options.line_numbers = Some(b),
            (HIGHLIGHTING, OptionValue::Bool(b)) => self.options.highlighting = Some(b),
            (BASE_URL, OptionValue::Text(s)) => self.options.base_url = Some(s),
            (FILENAME, OptionValue::Text(s)) => self.options.filename = Some(s),
            (_, value) => {
                self.options.extras.insert(key, value);
            }
        }
        self
    }

    /// Snapshot the current options.
    #[must_use]
    pub fn build(&self) -> ParseOptions {
        self.options.clone()
    }
}
