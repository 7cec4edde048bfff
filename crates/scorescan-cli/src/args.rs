//! Command-line argument definitions for the Scorescan CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects the processing core to run; the
//! configuration file and logging verbosity are shared by both.

use clap::{Parser, Subcommand, ValueEnum};

use scorescan::sig::ReductionMode;

/// Command-line arguments for the Scorescan tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Retrieve the staves of a sheet image
    Grid {
        /// Path to the sheet image (PNG or JPEG)
        input: String,

        /// Path to the output JSON file
        #[arg(short, long, default_value = "staves.json")]
        output: String,
    },

    /// Reduce the interpretation graphs of a JSON document
    Reduce {
        /// Path to the input JSON document
        input: String,

        /// Path to the output JSON document
        #[arg(short, long, default_value = "reduced.json")]
        output: String,

        /// Reduction mode, overriding the configuration
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
}

/// Reduction mode as written on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Strict,
    Relaxed,
}

impl From<ModeArg> for ReductionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => ReductionMode::Strict,
            ModeArg::Relaxed => ReductionMode::Relaxed,
        }
    }
}
