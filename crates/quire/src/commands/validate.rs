//! `quire validate` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{Source, build_registry, detect_format, load_config, parse_source, parser_for};
use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the validate command.
#[derive(Args)]
pub(crate) struct ValidateArgs {
    /// File to validate.
    file: PathBuf,
}

/// Validator diagnostics followed by parse errors not already reported.
fn diagnostics(mut problems: Vec<String>, parse_errors: &[String]) -> Vec<String> {
    for error in parse_errors {
        if !problems.contains(error) {
            problems.push(error.clone());
        }
    }
    problems
}

impl ValidateArgs {
    /// Execute the validate command.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Validation` when any problem is found, so the
    /// process exits with a failure status.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = load_config(global, None)?;
        let registry = build_registry(&config);

        let source = Source::read(&self.file)?;
        let format = detect_format(&registry, &config, &source);
        let parser = parser_for(&registry, format)?;
        let document = parse_source(parser.as_ref(), &config, &source);
        let problems = diagnostics(parser.validate(&source.content), document.errors());

        if problems.is_empty() {
            output.success(&format!("{}: no problems found ({})", source.name, format.name()));
            return Ok(());
        }

        for problem in &problems {
            output.print(&format!("{}: {problem}", source.name));
        }
        Err(CliError::Validation(format!(
            "{} problem(s) found in {}",
            problems.len(),
            source.name
        )))
    }
}
