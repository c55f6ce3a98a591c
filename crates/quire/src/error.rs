//! CLI error types.

use quire_config::ConfigError;
use quire_core::RenderError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("No parser registered for format '{0}'")]
    NoParser(String),

    #[error("{0}")]
    Validation(String),
}
