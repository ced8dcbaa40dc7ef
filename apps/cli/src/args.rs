//! Command-line interface of the `fileformats` binary.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fileformats")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect file formats: detect, name and compare them")]
pub(crate) struct Cli {
    /// Configuration file (TOML, JSON or YAML); `./fileformats.*` is used when present
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace); logs go to stderr
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// List the formats the given paths match
    Detect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Search every namespace instead of the standard ones
        #[arg(long)]
        any_namespace: bool,
    },
    /// Resolve a MIME-like identifier and print its canonical form
    Mime {
        /// e.g. `image/png+directory`
        mime: String,
    },
    /// Check whether one format can be used where another is expected
    Subtype { candidate: String, target: String },
    /// List base formats
    Formats {
        /// Only list formats of this namespace
        #[arg(long)]
        namespace: Option<String>,
    },
}
