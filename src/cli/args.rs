//! Command-line argument parsing for profilerag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// profilerag - answer employer questions from a candidate profile, with cited evidence
#[derive(Parser, Debug)]
#[command(name = "profilerag")]
#[command(version)]
#[command(about = "Evidence-cited answers about a candidate profile", long_about = None)]
pub struct Args {
    /// Configuration file path (defaults to ~/.profilerag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only in the log)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask one question about a profile
    Ask {
        /// The employer's question
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Profile JSON file exported by the profile builder
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Provider to answer with (gemini, openai, anthropic)
        #[arg(long)]
        provider: Option<String>,

        /// Omit the cited evidence from the output
        #[arg(long)]
        no_evidence: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,

        /// Restrict retrieval by metadata, e.g. '{"source_kind": {"$in": ["skill"]}}'
        #[arg(long, value_name = "JSON")]
        filter: Option<String>,
    },

    /// Interactive question session over one profile
    Chat {
        /// Profile JSON file exported by the profile builder
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Provider to start with
        #[arg(long)]
        provider: Option<String>,
    },

    /// List providers, their models and whether a credential is available
    Providers,

    /// Display current configuration
    Config,
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
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Log level the flags ask for; `None` defers to the config file
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("info"),
            Verbosity::VeryVerbose => Some("debug"),
        }
    }

    /// Show similarity scores next to evidence
    pub fn show_scores(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
