//! Configuration management for Quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every section is
//! optional and falls back to defaults.
//!
//! ```toml
//! [detection]
//! max_lines = 10
//!
//! [registry]
//! lazy = false
//!
//! [render]
//! theme = "light"
//!
//! [parse]
//! line_numbers = false
//! highlighting = true
//! base_url = ""
//! ```
//!
//! CLI settings can be applied during load via [`CliSettings`].

use std::path::{Path, PathBuf};

use quire_core::{ParseOptions, ParseOptionsBuilder};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Default number of lines inspected by content detection.
const DEFAULT_MAX_LINES: usize = 10;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the render theme.
    pub theme: Option<Theme>,
    /// Override the detection window.
    pub max_lines: Option<usize>,
    /// Override lazy parser registration.
    pub lazy: Option<bool>,
    /// Override the base URL for relative links.
    pub base_url: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Format detection settings.
    pub detection: DetectionConfig,
    /// Parser registry settings.
    pub registry: RegistryConfig,
    /// HTML rendering settings.
    pub render: RenderConfig,
    /// Parse option defaults.
    pub parse: ParseConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Format detection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Number of leading lines inspected by content detection.
    pub max_lines: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
        }
    }
}

/// Parser registry configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Register built-in parsers lazily.
    pub lazy: bool,
}

/// HTML theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Whether this is the light theme.
    #[must_use]
    pub fn is_light(self) -> bool {
        self == Self::Light
    }
}

/// Rendering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Theme used when none is requested explicitly.
    pub theme: Theme,
}

/// Parse option defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Request line numbers in rendered code.
    pub line_numbers: bool,
    /// Request syntax highlighting.
    pub highlighting: bool,
    /// Base URL for relative links. Empty means unset.
    pub base_url: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            line_numbers: false,
            highlighting: true,
            base_url: String::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in the current directory and
    /// its parents, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is out of range.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(theme) = settings.theme {
            self.render.theme = theme;
        }
        if let Some(max_lines) = settings.max_lines {
            self.detection.max_lines = max_lines;
        }
        if let Some(lazy) = settings.lazy {
            self.registry.lazy = lazy;
        }
        if let Some(base_url) = &settings.base_url {
            self.parse.base_url.clone_from(base_url);
        }
    }

    /// Search for a config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.max_lines == 0 {
            return Err(ConfigError::Validation(
                "detection.max_lines must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Parse options seeded from the `[parse]` section.
    #[must_use]
    pub fn parse_options_builder(&self) -> ParseOptionsBuilder {
        let builder = ParseOptions::create()
            .enable_line_numbers(self.parse.line_numbers)
            .enable_highlighting(self.parse.highlighting);
        if self.parse.base_url.is_empty() {
            builder
        } else {
            builder.set_base_url(self.parse.base_url.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.detection.max_lines, 10);
        assert!(!config.registry.lazy);
        assert_eq!(config.render.theme, Theme::Light);
        assert!(!config.parse.line_numbers);
        assert!(config.parse.highlighting);
        assert!(config.parse.base_url.is_empty());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.detection.max_lines, 10);
        assert_eq!(config.render.theme, Theme::Light);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[detection]
max_lines = 25

[registry]
lazy = true

[render]
theme = "dark"

[parse]
line_numbers = true
highlighting = false
base_url = "https://example.com/docs/"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.detection.max_lines, 25);
        assert!(config.registry.lazy);
        assert_eq!(config.render.theme, Theme::Dark);
        assert!(config.parse.line_numbers);
        assert!(!config.parse.highlighting);
        assert_eq!(config.parse.base_url, "https://example.com/docs/");
    }

    #[test]
    fn test_unknown_theme_rejected() {
        let result: Result<Config, _> = toml::from_str("[render]\ntheme = \"sepia\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_max_lines_zero() {
        let mut config = Config::default();
        config.detection.max_lines = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: detection.max_lines must be at least 1"
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[render]\ntheme = \"dark\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.render.theme, Theme::Dark);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "[detection\nmax_lines = 3").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "[detection]\nmax_lines = 0\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("quire.toml"), "").unwrap();

        let found = Config::discover_from(&nested).unwrap();
        assert_eq!(found, dir.path().join("quire.toml"));
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("quire.toml"), "").unwrap();
        std::fs::write(nested.join("quire.toml"), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested).unwrap(),
            nested.join("quire.toml")
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            theme: Some(Theme::Dark),
            max_lines: Some(3),
            lazy: Some(true),
            base_url: Some("https://x.io/".to_owned()),
        });
        assert_eq!(config.render.theme, Theme::Dark);
        assert_eq!(config.detection.max_lines, 3);
        assert!(config.registry.lazy);
        assert_eq!(config.parse.base_url, "https://x.io/");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.render.theme, Theme::Light);
        assert_eq!(config.detection.max_lines, 10);
    }

    #[test]
    fn test_cli_settings_validated_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            max_lines: Some(0),
            ..CliSettings::default()
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_options_builder() {
        let mut config = Config::default();
        let options = config.parse_options_builder().build();
        assert!(options.highlighting());
        assert!(!options.line_numbers());
        assert_eq!(options.base_url(), None);

        config.parse.base_url = "https://example.com/".to_owned();
        let options = config
            .parse_options_builder()
            .set_filename("notes.md")
            .build();
        assert_eq!(options.base_url(), Some("https://example.com/"));
        assert_eq!(options.extension(), ".md");
    }
}
