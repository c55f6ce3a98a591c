//! `quire formats` command implementation.

use clap::Args;
use quire_format::FormatRegistry;

use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the formats command.
#[derive(Args)]
pub(crate) struct FormatsArgs {
    /// Print the catalog as JSON.
    #[arg(long)]
    json: bool,
}

impl FormatsArgs {
    /// Execute the formats command.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub(crate) fn execute(self, _global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let formats = FormatRegistry::new();

        if self.json {
            let catalog: Vec<_> = formats.formats().collect();
            output.print(&serde_json::to_string_pretty(&catalog)?);
            return Ok(());
        }

        output.highlight(&format!("{} formats", formats.len()));
        for format in formats.formats() {
            let extensions = if format.extensions().is_empty() {
                "-".to_owned()
            } else {
                format.extensions().join(" ")
            };
            output.print(&format!("{:<18} {:<20} {extensions}", format.id(), format.name()));
        }
        Ok(())
    }
}
