use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::types::{ReportKind, ScanMode};

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(about = "Client for the Sentinel web security scan backend")]
pub struct Cli {
    /// Scan backend base URL (overrides SENTINEL_API_BASE and the config file)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Request timeout in seconds, 0 disables it
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a target URL and print the report
    Scan {
        /// Target URL, sent to the backend as given
        url: String,

        /// Run the slower deep scan
        #[arg(long)]
        deep: bool,

        /// Print the raw report JSON instead of the formatted view
        #[arg(long)]
        json: bool,

        /// Also write the report JSON to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Export a PDF of this kind after a successful scan
        #[arg(long, value_enum)]
        download: Option<ReportKind>,

        /// Directory for exported documents
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Export a PDF from a previously saved report JSON
    Download {
        /// Report JSON written by `scan --save`
        report: PathBuf,

        #[arg(long, value_enum, default_value_t = ReportKind::Technical)]
        kind: ReportKind,

        /// Directory for exported documents
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let output_dir = match &self.command {
            Command::Scan { output_dir, .. } | Command::Download { output_dir, .. } => {
                output_dir.clone()
            }
        };

        Overrides {
            api_base: self.api_base.clone(),
            timeout_secs: self.timeout,
            output_dir,
        }
    }
}

pub fn scan_mode(deep: bool) -> ScanMode {
    if deep { ScanMode::Deep } else { ScanMode::Quick }
}

pub fn parse() -> Cli {
    Cli::parse()
}
