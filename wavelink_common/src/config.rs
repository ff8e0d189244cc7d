//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for the display and producer sides of a link. A configuration names the
//! transport to use and the control parameters (name, kind, initial value)
//! that populate a freshly created batch record before it is published.
//!
//! # Usage
//!
//! ```rust,no_run
//! use wavelink_common::config::{ConfigLoader, LinkConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = LinkConfig::load(Path::new("wavelink.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_LISTEN_BACKLOG, DEFAULT_PORT, DEFAULT_SEGMENT_NAME, DEFAULT_TIMEOUT_MS,
    PARAM_NAME_CAPACITY,
};
use crate::kind::ParameterKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared by every wavelink application.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "walker-sim"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Transport used to exchange batch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Named shared-memory segment.
    #[default]
    SharedMemory,
    /// Point-to-point TCP connection.
    Socket,
}

/// Transport section of a link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Which transport to use.
    #[serde(default)]
    pub mode: TransportMode,
    /// Shared-memory segment name.
    #[serde(default = "default_segment")]
    pub segment: String,
    /// TCP port of the display side.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address the producer connects to.
    #[serde(default = "default_address")]
    pub address: String,
    /// Connect/listen handshake timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Listen queue length.
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Number of waveform parameters the producer publishes.
    #[serde(default)]
    pub wave_params: usize,
}

fn default_segment() -> String {
    DEFAULT_SEGMENT_NAME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_backlog() -> i32 {
    DEFAULT_LISTEN_BACKLOG
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::default(),
            segment: default_segment(),
            port: default_port(),
            address: default_address(),
            timeout_ms: default_timeout_ms(),
            backlog: default_backlog(),
            wave_params: 0,
        }
    }
}

/// Initial value of a configured parameter.
///
/// Accepts `value = 3`, `value = 1.5` or `value = [1.0, 2.0, 3.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    /// Integer literal.
    Integer(i64),
    /// Floating-point literal.
    Float(f64),
    /// Three-component array.
    Vector([f64; 3]),
}

impl InitialValue {
    /// Whether this literal can initialize a parameter of `kind`.
    pub fn fits(&self, kind: ParameterKind) -> bool {
        match (self, kind) {
            (Self::Vector(_), k) => k.is_vector(),
            (Self::Integer(_), ParameterKind::S64) => true,
            (Self::Float(_), ParameterKind::S64) => false,
            (_, k) => !k.is_vector(),
        }
    }
}

/// One `[[control]]` entry: a parameter to declare in a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    /// Parameter name, 1 to 16 bytes.
    pub name: String,
    /// Value kind.
    pub kind: ParameterKind,
    /// Initial value; an absent value leaves the parameter unset.
    #[serde(default)]
    pub value: Option<InitialValue>,
}

impl ParameterSpec {
    /// Validate name length and value shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() || self.name.len() > PARAM_NAME_CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "parameter name {:?} must be 1..={} bytes",
                self.name, PARAM_NAME_CAPACITY
            )));
        }
        if let Some(value) = &self.value {
            if !value.fits(self.kind) {
                return Err(ConfigError::ValidationError(format!(
                    "parameter {:?}: value {:?} does not fit kind {}",
                    self.name, value, self.kind
                )));
            }
        }
        Ok(())
    }
}

/// Complete configuration of one end of a link.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "walker-sim"
///
/// [transport]
/// mode = "socket"
/// port = 5230
/// wave_params = 2
///
/// [[control]]
/// name = "kp"
/// kind = "DOUBLE"
/// value = 12.5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Transport selection and handshake settings.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Control parameters, in record order.
    #[serde(default)]
    pub control: Vec<ParameterSpec>,
}

impl LinkConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Number of control parameters declared.
    pub fn num_control_params(&self) -> usize {
        self.control.len()
    }

    /// Number of waveform parameters declared.
    pub fn num_wave_params(&self) -> usize {
        self.transport.wave_params
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - a control parameter has an invalid name or mismatched value
    /// - two control parameters share a name
    /// - no control and no waveform parameters are declared
    /// - the listen backlog is not positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let mut seen = HashSet::new();
        for spec in &self.control {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate control parameter {:?}",
                    spec.name
                )));
            }
        }

        if self.control.is_empty() && self.transport.wave_params == 0 {
            return Err(ConfigError::ValidationError(
                "at least one control or waveform parameter is required".to_string(),
            ));
        }

        if self.transport.backlog <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "backlog must be positive, got {}",
                self.transport.backlog
            )));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        tracing::debug!("loaded configuration from {}", path.display());
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
