//! `quire detect` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{Source, build_registry, detect_format, load_config};
use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the detect command.
#[derive(Args)]
pub(crate) struct DetectArgs {
    /// File to inspect.
    file: PathBuf,
}

impl DetectArgs {
    /// Execute the detect command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the file cannot be read.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = load_config(global, None)?;
        let registry = build_registry(&config);
        let formats = registry.formats();
        let source = Source::read(&self.file)?;

        let by_name = formats.detect_by_filename(&source.name);
        let by_content = formats.detect_by_content(&source.content, config.detection.max_lines);
        let detected = detect_format(&registry, &config, &source);

        output.highlight(&self.file.display().to_string());
        output.field("By extension", &by_name.to_string());
        output.field(
            "By content",
            &by_content.map_or_else(|| "no match".to_owned(), ToString::to_string),
        );
        output.field("Detected", &detected.to_string());
        if source.is_binary {
            output.warning("File is not valid UTF-8; treating it as binary");
        }
        Ok(())
    }
}
