//! Static shell completions

use std::io::Write;

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::Cli;
use crate::error::Result;

/// Write completions for `shell` to `out`
pub fn write_completions<W: Write>(shell: Shell, out: &mut W) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(shell, &mut command, name, out);
}

/// Run the completion command, printing to stdout
pub fn run(shell: Shell) -> Result<()> {
    let mut stdout = std::io::stdout();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}
