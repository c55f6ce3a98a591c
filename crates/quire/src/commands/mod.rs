//! CLI command implementations.

pub(crate) mod detect;
pub(crate) mod formats;
pub(crate) mod render;
pub(crate) mod stats;
pub(crate) mod validate;

pub(crate) use detect::DetectArgs;
pub(crate) use formats::FormatsArgs;
pub(crate) use render::RenderArgs;
pub(crate) use stats::StatsArgs;
pub(crate) use validate::ValidateArgs;

use std::path::Path;
use std::sync::Arc;

use quire_config::{CliSettings, Config};
use quire_core::{OptionValue, ParsedDocument, ParserRegistry, TextParser};
use quire_format::{TextFormat, ids};
use quire_parsers::{binary, register_all_parsers, register_all_parsers_lazy};

use crate::GlobalArgs;
use crate::error::CliError;

/// A file read from disk.
pub(crate) struct Source {
    /// File name used as the filename hint.
    pub name: String,
    /// Content, lossily decoded when the file is not UTF-8.
    pub content: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether the file failed to decode as UTF-8.
    pub is_binary: bool,
}

impl Source {
    /// Read a file. Non-UTF-8 files are flagged as binary.
    pub(crate) fn read(path: &Path) -> Result<Self, CliError> {
        let bytes = std::fs::read(path)?;
        let size = bytes.len() as u64;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let (content, is_binary) = match String::from_utf8(bytes) {
            Ok(text) => (text, false),
            Err(err) => (String::from_utf8_lossy(err.as_bytes()).into_owned(), true),
        };
        tracing::debug!(file = %name, size, is_binary, "Read source file");
        Ok(Self {
            name,
            content,
            size,
            is_binary,
        })
    }
}

/// Load configuration honoring the global `--config` flag.
pub(crate) fn load_config(
    global: &GlobalArgs,
    settings: Option<&CliSettings>,
) -> Result<Config, CliError> {
    Ok(Config::load(global.config.as_deref(), settings)?)
}

/// A registry with the built-in parsers bound as the config requests.
pub(crate) fn build_registry(config: &Config) -> ParserRegistry {
    let registry = ParserRegistry::new();
    if config.registry.lazy {
        register_all_parsers_lazy(&registry);
    } else {
        register_all_parsers(&registry);
    }
    registry
}

/// Format of a source: binary when it is not text, otherwise detected from
/// its name and content.
pub(crate) fn detect_format<'a>(
    registry: &'a ParserRegistry,
    config: &Config,
    source: &Source,
) -> &'a TextFormat {
    let formats = registry.formats();
    if source.is_binary
        && let Some(binary) = formats.get_by_id(ids::BINARY)
    {
        return binary;
    }
    formats.detect(Some(&source.name), &source.content, config.detection.max_lines)
}

/// Parser for `format`.
pub(crate) fn parser_for(
    registry: &ParserRegistry,
    format: &TextFormat,
) -> Result<Arc<dyn TextParser>, CliError> {
    registry
        .get_parser(format)
        .ok_or_else(|| CliError::NoParser(format.id().to_owned()))
}

/// Parse a source with options seeded from the config.
pub(crate) fn parse_source(
    parser: &dyn TextParser,
    config: &Config,
    source: &Source,
) -> ParsedDocument {
    let options = config
        .parse_options_builder()
        .set_filename(source.name.as_str())
        .set(
            binary::FILE_SIZE,
            OptionValue::Int(i64::try_from(source.size).unwrap_or(i64::MAX)),
        )
        .build();
    parser.parse(&source.content, &options)
}
