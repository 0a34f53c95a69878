//! Command-line interface for requesttracker.
//!
//! This module provides the CLI structure for the `reqtrack` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DeleteCommand, ListCommand, OutputFormat, RecordArgs, ShowCommand,
    StatsCommand, StatusArg, UpdateCommand,
};

/// reqtrack - Track requests in a flat JSON file
///
/// Create, search, filter, update and delete request records. Every change is
/// written to the data file before the command returns.
#[derive(Debug, Parser)]
#[command(name = "reqtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the JSON data file (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a request
    Add(RecordArgs),

    /// List requests, optionally filtered
    List(ListCommand),

    /// Show one request
    Show(ShowCommand),

    /// Update a request
    Update(UpdateCommand),

    /// Delete a request
    Delete(DeleteCommand),

    /// Show record counts and data file details
    Stats(StatsCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
