//! # Wavelink driver
//!
//! The two ends of a link, driven from one configuration file:
//!
//! - [`display::DisplayEnd`] owns the exchange. It creates the shared segment
//!   (or listens for the producer), publishes the configured control
//!   parameters and reports waveform channels once the producer has
//!   published them.
//! - [`producer::ProducerEnd`] joins an exchange, reads the control
//!   parameters each tick and echoes them back as waveform parameters.
//!
//! Both ends are stepped by [`ticker::run_loop`] until Ctrl-C or a tick
//! limit.

pub mod display;
pub mod producer;
pub mod ticker;
