//! Code for the configuration of the application.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vc500w::{CutMode, PrintMode};

/// Host used when neither the command line nor the config file names one.
pub const DEFAULT_HOST: &str = "192.168.0.1";

/// How long to wait for a busy printer by default.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// The configuration of the application.
#[derive(Default, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// The printer's hostname or IP address.
    pub host: Option<String>,
    /// The printer's port.
    pub port: Option<u16>,
    /// How many seconds to wait for a busy printer to turn idle.
    pub idle_timeout_secs: Option<u64>,
    /// Defaults for printing.
    pub print: Option<PrintConfig>,
}

impl Config {
    /// Parse a configuration from a toml file.
    pub fn from_file(file: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(file)?;
        Self::from_str(&config).with_context(|| format!("parsing config file {}", file.display()))
    }

    /// Parse a configuration from a toml file, falling back to the defaults
    /// when the file does not exist.
    pub fn load_or_default(file: &Path) -> Result<Self> {
        if !file.exists() {
            tracing::debug!(path = %file.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        Self::from_file(file)
    }

    /// Parse a configuration from a toml string.
    pub fn from_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }

    /// The host to connect to, preferring `flag` over the config file.
    pub fn host(&self, flag: Option<&str>) -> String {
        flag.or(self.host.as_deref()).unwrap_or(DEFAULT_HOST).to_string()
    }

    /// The port to connect to, preferring `flag` over the config file.
    pub fn port(&self, flag: Option<u16>) -> u16 {
        flag.or(self.port).unwrap_or(vc500w::DEFAULT_PORT)
    }

    /// How long to wait for the printer to turn idle.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS))
    }

    /// The print defaults, empty when the file has no `[print]` table.
    pub fn print(&self) -> PrintConfig {
        self.print.unwrap_or_default()
    }
}

/// Defaults for the `print` command.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrintConfig {
    /// Print quality.
    pub mode: Option<PrintMode>,
    /// Cut mode.
    pub cut: Option<CutMode>,
    /// Take the printer lock around each print.
    pub lock: Option<bool>,
    /// Wait for the printer to turn idle after printing.
    pub wait_after_print: Option<bool>,
}
