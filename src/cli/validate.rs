//! Validate command implementation

use std::path::Path;

use crate::cli::GlobalOptions;
use crate::error::{InputError, Result};
use crate::output;
use crate::postman::validate::validate_dir;

/// Validate every Postman file under `dir`, failing if any has issues
pub fn run(opts: &GlobalOptions, dir: &Path) -> Result<()> {
    let report = validate_dir(dir)?;
    output::print(&report, opts.format)?;

    if report.is_valid() {
        Ok(())
    } else {
        Err(InputError::SchemaViolation {
            count: report.invalid_count(),
        }
        .into())
    }
}
