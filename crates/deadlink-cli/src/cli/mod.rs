//! CLI for the deadlink checker.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use deadlink_core::config;
use std::path::PathBuf;

use commands::{run_check, run_proxy, run_sanitize, CheckArgs};

/// Top-level CLI for the deadlink checker.
#[derive(Debug, Parser)]
#[command(name = "deadlink")]
#[command(about = "deadlink: concurrent dead-link checker for HTTP, FTP, RTSP and MMS", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/deadlink/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check URLs and report each one as ALIVE, DEAD or UNKNOWN.
    Check {
        /// URLs to check.
        urls: Vec<String>,

        /// Also read URLs from a file, one per line (# starts a comment).
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Print verdicts, errors and request details as JSON.
        #[arg(long)]
        json: bool,

        /// Send every URL at once instead of one per host per wave.
        #[arg(long)]
        no_queue: bool,

        /// Enable libcurl verbose output.
        #[arg(long)]
        verbose: bool,
    },

    /// Report whether the SOCKS5 proxy can reach onion addresses.
    Proxy,

    /// Print the request-ready form of a URL.
    Sanitize {
        /// URL to sanitize.
        url: String,

        /// Keep the #fragment.
        #[arg(long)]
        keep_fragment: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Check {
                urls,
                file,
                json,
                no_queue,
                verbose,
            } => {
                let args = CheckArgs {
                    urls,
                    file,
                    json,
                    no_queue,
                    verbose,
                };
                run_check(cfg, args).await?;
            }
            CliCommand::Proxy => run_proxy(cfg).await?,
            CliCommand::Sanitize { url, keep_fragment } => run_sanitize(&url, keep_fragment)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
