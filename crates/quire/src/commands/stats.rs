//! `quire stats` command implementation.

use clap::Args;
use quire_parsers::{ParserStatistics, parser_statistics};

use super::{build_registry, load_config};
use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the stats command.
#[derive(Args)]
pub(crate) struct StatsArgs {
    /// Print statistics as JSON.
    #[arg(long)]
    json: bool,
}

impl StatsArgs {
    /// Execute the stats command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or JSON
    /// serialization fails.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = load_config(global, None)?;
        let registry = build_registry(&config);
        let stats = parser_statistics(&registry);

        if self.json {
            output.print(&serde_json::to_string_pretty(&stats)?);
        } else {
            print_summary(&output, &stats);
        }
        Ok(())
    }
}

fn print_summary(output: &Output, stats: &ParserStatistics) {
    output.highlight("Parser statistics");
    output.field("Total parsers", &stats.total_parsers.to_string());
    output.field(
        "Supported formats",
        &format!("{} ({})", stats.supported_formats.len(), stats.supported_formats.join(", ")),
    );
    if stats.missing_formats.is_empty() {
        output.success("Every format has a parser");
    } else {
        output.warning(&format!("Missing parsers: {}", stats.missing_formats.join(", ")));
    }
}
