//! Platform back ends
//!
//! Segment and socket code call these free functions only; every back end
//! exposes the same names with the same contracts.

#[cfg(unix)]
mod posix;

#[cfg(unix)]
pub use posix::*;

#[cfg(not(unix))]
compile_error!("wavelink_core supports Unix targets only");
