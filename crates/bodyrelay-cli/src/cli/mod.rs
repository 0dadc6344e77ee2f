//! CLI for bodyrelay.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use bodyrelay_core::config::{self, RelayConfig};
use bodyrelay_core::submit::FileType;
use std::path::PathBuf;

use commands::{run_classify, run_completions, run_man, run_send, run_submit, SendArgs};

/// Top-level CLI for bodyrelay.
#[derive(Debug, Parser)]
#[command(name = "bodyrelay")]
#[command(about = "bodyrelay: chunked, retrying delivery of captured HTTP response bodies", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/bodyrelay/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Relay a captured body to the collection endpoint in chunks.
    Send {
        /// File holding the body (reads stdin when omitted).
        file: Option<PathBuf>,
        /// URL of the intercepted request (sent as X-Original-Url).
        #[arg(long, default_value = "")]
        url: String,
        /// Path of the intercepted request (sent as X-Request-Path).
        #[arg(long, default_value = "")]
        path: String,
        /// Override the configured upload endpoint.
        #[arg(long, value_name = "URL")]
        upload_url: Option<String>,
        /// Override the configured chunk size in bytes.
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,
    },

    /// Show the format tag and chunk plan for a body without sending it.
    Classify {
        /// File holding the body (reads stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Submit a captured file to the local API as a multipart form.
    Submit {
        /// Path to the file.
        file: PathBuf,
        /// Kind of capture: mysekai or suite.
        #[arg(long)]
        filetype: FileType,
        /// Game region the capture belongs to.
        #[arg(long)]
        region: String,
        /// Override the configured submission endpoint.
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },

    /// Print shell completions.
    Completions {
        shell: Shell,
    },

    /// Print the man page.
    Man,
}

fn load_config(path: Option<&PathBuf>) -> Result<RelayConfig> {
    let cfg = match path {
        Some(p) => config::load_from(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Send {
                file,
                url,
                path,
                upload_url,
                chunk_size,
            } => {
                let cfg = load_config(cli.config.as_ref())?;
                let args = SendArgs {
                    file,
                    url,
                    path,
                    upload_url,
                    chunk_size,
                };
                run_send(&cfg, args).await?;
            }
            CliCommand::Classify { file } => {
                let cfg = load_config(cli.config.as_ref())?;
                run_classify(&cfg, file.as_deref()).await?;
            }
            CliCommand::Submit {
                file,
                filetype,
                region,
                endpoint,
            } => {
                let cfg = load_config(cli.config.as_ref())?;
                run_submit(&cfg, &file, filetype, &region, endpoint).await?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
