//! Sanitize command implementation

use std::path::Path;

use crate::cli::GlobalOptions;
use crate::error::{InputError, Result};
use crate::output;
use crate::postman::sanitize::sanitize_dir;

/// Sanitize every Postman file under `dir`.
///
/// With `check`, nothing is written and any file that would change is an
/// error, so CI can reject exports that were committed unsanitized.
pub fn run(opts: &GlobalOptions, dir: &Path, check: bool) -> Result<()> {
    let report = sanitize_dir(dir, !check)?;
    output::print(&report, opts.format)?;

    let changed = report.changed_count();
    if check && changed > 0 {
        return Err(InputError::DriftDetected { count: changed }.into());
    }
    Ok(())
}
