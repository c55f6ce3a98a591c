//! `quire render` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Theme};

use super::{Source, build_registry, detect_format, load_config, parse_source, parser_for};
use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// File to render.
    file: PathBuf,

    /// Render with the dark theme (overrides config).
    #[arg(long)]
    dark: bool,

    /// Base URL for relative links (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, no parser handles its
    /// format, or the output cannot be written.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let settings = CliSettings {
            theme: self.dark.then_some(Theme::Dark),
            base_url: self.base_url,
            ..CliSettings::default()
        };
        let config = load_config(global, Some(&settings))?;
        let registry = build_registry(&config);

        let source = Source::read(&self.file)?;
        let format = detect_format(&registry, &config, &source);
        let parser = parser_for(&registry, format)?;
        let document = parse_source(parser.as_ref(), &config, &source);
        let html = document.to_html(&registry, config.render.theme.is_light())?;

        for error in document.errors() {
            output.warning(error);
        }

        if let Some(path) = &self.output {
            std::fs::write(path, html)?;
            output.success(&format!(
                "Rendered {} as {} to {}",
                source.name,
                format.name(),
                path.display()
            ));
        } else {
            output.print(html);
        }
        Ok(())
    }
}
