//! Command-line argument parsing for PensionBot
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::chat::ChatMode;

/// PensionBot - plain vs retrieval-augmented answers on Defined Benefit Pension Plans
#[derive(Parser, Debug)]
#[command(name = "pensionbot")]
#[command(version)]
#[command(about = "Compare a plain LLM against a retrieval-augmented one on DB pension questions", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only replies and errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand (defaults to the interactive REPL)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive REPL mode
    Start,

    /// Ask one question on one lane
    Ask {
        /// Question text
        #[arg(value_name = "QUERY")]
        query: String,

        /// plain or augmented
        #[arg(long, default_value = "augmented", value_parser = parse_mode)]
        mode: ChatMode,

        /// Model name (configured default when omitted)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask one question in plain and augmented mode side by side
    Compare {
        /// Question text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Model name (configured default when omitted)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Check keys, index host and service reachability
    Doctor,

    /// Display current configuration
    Config,
}

fn parse_mode(s: &str) -> Result<ChatMode, String> {
    s.parse()
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Whether to show the waiting spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Whether to print the retrieved reference after augmented replies
    pub fn show_reference(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
