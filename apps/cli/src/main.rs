#![allow(clippy::print_stdout)]

mod args;
mod handlers;

use crate::args::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use fileformats::{Formats, LoggingConfig, load_config};
use fileformats_logger::{Logger, parse_level};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref()).context("Critical: Configuration is malformed")?;
    let _log = init_logging(&config.logging, cli.verbose)?;

    let formats = Formats::bootstrap(&config).context("Failed to build the format catalog")?;

    match cli.command {
        Commands::Detect { paths, any_namespace } => handlers::detect(&formats, &paths, any_namespace)?,
        Commands::Mime { mime } => handlers::mime(&formats, &mime)?,
        Commands::Subtype { candidate, target } => handlers::subtype(&formats, &candidate, &target)?,
        Commands::Formats { namespace } => handlers::list(&formats, namespace.as_deref())?,
    }

    Ok(())
}

fn init_logging(settings: &LoggingConfig, verbose: u8) -> Result<Logger> {
    let builder = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .level(parse_level(&settings.level)?)
        .verbosity(verbose);

    let logger = match &settings.directory {
        Some(directory) => builder.directory(directory).json(settings.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}
