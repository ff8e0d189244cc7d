//! Prelude module for common re-exports.
//!
//! ```rust
//! use wavelink_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, InitialValue, LinkConfig, ParameterSpec, SharedConfig,
    TransportConfig, TransportMode,
};

// ─── Parameters ─────────────────────────────────────────────────────
pub use crate::consts::{PARAM_NAME_CAPACITY, PARAMETER_SIZE};
pub use crate::kind::{PARAMETER_KINDS, ParameterKind};

/// Default exchange tick period as Duration.
pub const DEFAULT_TICK: Duration = Duration::from_micros(crate::consts::DEFAULT_TICK_US);
