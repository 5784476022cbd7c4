//! Show command implementation: print a saved match record.

use std::path::Path;

use noise_before_defeat::MatchRecord;

use super::output::format_record;
use super::{CliError, OutputFormat};

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if the record cannot be loaded.
pub(crate) fn execute(record: &Path, format: OutputFormat) -> Result<(), CliError> {
    let record = MatchRecord::load(record)?;
    match format {
        OutputFormat::Text => print!("{}", format_record(&record)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}
