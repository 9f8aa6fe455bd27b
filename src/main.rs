//! Remotely control a VC-500W label printer over TCP/IP.

#![deny(missing_docs)]

mod commands;
mod config;
mod report;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use commands::PrintOptions;
use config::Config;
use report::StatusReport;
use tracing_subscriber::prelude::*;
use vc500w::{Client, CutMode, PrintMode};

/// This doc string acts as a help message when the user runs '--help'
/// as do all doc strings on fields.
#[derive(Parser, Debug, Clone)]
#[clap(version = clap::crate_version!(), author = clap::crate_authors!("\n"))]
pub struct Opts {
    /// Print debug info
    #[clap(short, long)]
    pub debug: bool,

    /// Print logs as json
    #[clap(long)]
    pub json_logs: bool,

    /// Path to config file.
    #[clap(short, long, default_value = "labelprinter.toml")]
    pub config: PathBuf,

    /// The printer's hostname or IP address [default: 192.168.0.1]
    #[clap(short = 'H', long, env = "LABELPRINTER_HOST")]
    pub host: Option<String>,

    /// The printer's port number [default: 9100]
    #[clap(short, long, env = "LABELPRINTER_PORT")]
    pub port: Option<u16>,

    /// The subcommand to run.
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

/// A subcommand for our cli.
#[derive(Parser, Debug, Clone)]
pub enum SubCommand {
    /// Connect to the printer and show its status.
    Status {
        /// Return the status information in JSON format
        #[clap(short, long)]
        json: bool,
    },

    /// Print a JPEG image.
    Print {
        /// The JPEG file to print.
        file: PathBuf,

        /// Print mode, defaults to vivid
        #[clap(long)]
        mode: Option<PrintMode>,

        /// Cut mode after printing, defaults to full
        #[clap(long)]
        cut: Option<CutMode>,

        /// Hold the printer lock while printing
        #[clap(long)]
        lock: bool,

        /// Wait for the printer to turn idle after printing before returning
        #[clap(long)]
        wait_after_print: bool,
    },

    /// Release the printer from a lock left behind by an earlier job.
    Release {
        /// The job token holding the lock.
        job_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    let (json, plain) = if opts.json_logs {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
    };

    let default_level = if opts.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Initialize tracing.
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();

    let config = Config::load_or_default(&opts.config)?;

    if let Err(err) = run_cmd(&opts, &config).await {
        bail!("running cmd `{:?}` failed: {:?}", &opts.subcmd, err);
    }

    Ok(())
}

async fn run_cmd(opts: &Opts, config: &Config) -> Result<()> {
    let host = config.host(opts.host.as_deref());
    let port = config.port(opts.port);
    let mut stdout = std::io::stdout();

    match &opts.subcmd {
        SubCommand::Status { json: true } => {
            let report = match status_report(&host, port).await {
                Ok(report) => report,
                Err(err) => {
                    tracing::warn!(error = %err, "could not read the printer status");
                    StatusReport::disconnected()
                }
            };

            println!("{}", serde_json::to_string(&report)?);
        }
        SubCommand::Status { json: false } => {
            let mut client = Client::connect(&host, port).await?;
            commands::status(&mut client, &mut stdout).await?;
            client.close().await?;
        }
        SubCommand::Print {
            file,
            mode,
            cut,
            lock,
            wait_after_print,
        } => {
            let defaults = config.print();
            let options = PrintOptions {
                mode: mode.or(defaults.mode).unwrap_or_default(),
                cut: cut.or(defaults.cut).unwrap_or_default(),
                lock: *lock || defaults.lock.unwrap_or_default(),
                wait_after_print: *wait_after_print || defaults.wait_after_print.unwrap_or_default(),
                idle_timeout: config.idle_timeout(),
            };

            let mut client = Client::connect(&host, port).await?;
            commands::print(&mut client, file, &options, &mut stdout).await?;
            client.close().await?;
        }
        SubCommand::Release { job_id } => {
            let mut client = Client::connect(&host, port).await?;
            commands::release(&mut client, job_id, &mut stdout).await?;
            client.close().await?;
        }
    }

    Ok(())
}

async fn status_report(host: &str, port: u16) -> Result<StatusReport> {
    let mut client = Client::connect(host, port).await?;
    let report = commands::status_report(&mut client).await?;
    client.close().await?;

    Ok(report)
}
