//! Wavelink Common Library
//!
//! This crate provides the types, constants and configuration loading
//! utilities shared by every wavelink crate.
//!
//! # Module Structure
//!
//! - [`kind`] - Parameter kind tag and its textual spelling
//! - [`consts`] - Layout limits and transport defaults
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! wavelink = { package = "wavelink_common", path = "../wavelink_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use wavelink_common::consts::*;
//! use wavelink_common::config::{ConfigLoader, LinkConfig};
//! ```

pub mod config;
pub mod consts;
pub mod kind;
pub mod prelude;
