//! Configuration file management.
//!
//! Settings come from three layers with clear precedence:
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file given with `--config`
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! in = "30d"
//! verbose = true
//! port = 443
//! timeout = 10
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::duration::parse_duration;
use crate::error::CheckError;
use crate::{Check, DEFAULT_PORT};

/// Default offset from now at which the chain must still be valid.
pub const DEFAULT_IN: &str = "7d";

/// Configuration structure.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Offset from now to check validity at, e.g. "7d"
    #[serde(rename = "in")]
    pub in_duration: Option<String>,
    /// Print per-certificate progress
    pub verbose: Option<bool>,
    /// TLS port to connect to
    pub port: Option<u16>,
    /// Connect/read/write timeout in seconds; unset means no timeout
    pub timeout: Option<u64>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use is_tls_expiring::config::Config;
    /// let config = Config::from_file("is-tls-expiring.toml")?;
    /// # Ok::<(), is_tls_expiring::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Creates a configuration with the built-in defaults:
    /// `in = "7d"`, not verbose, port 443, no timeout.
    pub fn default() -> Self {
        Config {
            in_duration: Some(DEFAULT_IN.to_string()),
            verbose: Some(false),
            port: Some(DEFAULT_PORT),
            timeout: None,
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.in_duration.is_some() {
            self.in_duration = other.in_duration;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Only provided arguments (Some values) override the other layers.
    pub fn from_cli_args(in_duration: Option<String>, verbose: Option<bool>) -> Self {
        Config {
            in_duration,
            verbose,
            port: None,
            timeout: None,
        }
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            in_duration: Some("30d".to_string()),
            verbose: Some(true),
            port: Some(DEFAULT_PORT),
            timeout: Some(10),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }

    /// Turns the merged configuration and the positional arguments into a [`Check`].
    ///
    /// Exactly one hostname is accepted. The duration is parsed here, so every
    /// argument problem surfaces before any connection is attempted.
    pub fn into_check(self, hosts: Vec<String>) -> Result<Check, CheckError> {
        let host = match <[String; 1]>::try_from(hosts) {
            Ok([host]) => host,
            Err(hosts) if hosts.is_empty() => {
                return Err(CheckError::invalid_input(
                    "hostname",
                    "missing argument for hostname to check",
                ))
            }
            Err(hosts) => {
                return Err(CheckError::invalid_input(
                    "hostname",
                    format!(
                        "too many arguments; expecting exactly one, but got {}",
                        hosts.len()
                    ),
                ))
            }
        };
        if host.trim().is_empty() {
            return Err(CheckError::invalid_input("hostname", "cannot be empty"));
        }

        let offset = parse_duration(self.in_duration.as_deref().unwrap_or(DEFAULT_IN))?;

        Ok(Check {
            host,
            port: self.port.unwrap_or(DEFAULT_PORT),
            offset,
            timeout: self.timeout.map(Duration::from_secs),
        })
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
