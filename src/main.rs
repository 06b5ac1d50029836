//! udns-postman - Postman collection tooling for the UltraDNS API

use clap::Parser;
use log::LevelFilter;

mod cli;
mod client;
mod config;
mod error;
mod openapi;
mod output;
mod postman;
mod release;

use cli::{Cli, CommandContext, Commands, GlobalOptions};
use error::Result;
use release::ReleaseVersion;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Logs go to stderr. `--debug` raises this crate to debug; RUST_LOG wins
/// over both.
fn init_logging(debug: bool) {
    let crate_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_CRATE_NAME"), crate_level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let opts = GlobalOptions::from_cli(&cli);
    init_logging(opts.debug);

    match cli.command {
        Commands::Validate { dir } => cli::validate::run(&opts, &dir),
        Commands::Sanitize { dir, check } => cli::sanitize::run(&opts, &dir, check),
        Commands::Publish { dir } => {
            let version = ReleaseVersion::resolve(opts.release_version_ref())?;
            let ctx = CommandContext::new(&opts)?;
            cli::publish::run(&ctx, &dir, &version).await
        }
        Commands::Convert { output } => {
            let version = ReleaseVersion::resolve(opts.release_version_ref())?;
            let ctx = CommandContext::new(&opts)?.with_output(output);
            cli::convert::run(&ctx, &version).await
        }
        Commands::Release { dir, output } => {
            let version = ReleaseVersion::resolve(opts.release_version_ref())?;
            let ctx = CommandContext::new(&opts)?.with_output(output);
            cli::release::run(&ctx, &dir, &version).await
        }
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("udns-postman version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completion { shell } => cli::completions::run(shell),
    }
}
