//! # Wavelink Core
//!
//! Typed parameter exchange between a producer (simulator, robot controller)
//! and an operator display, over a named shared-memory segment or a
//! point-to-point TCP connection.
//!
//! ## Building blocks
//!
//! - [`Parameter`]: 48-byte cell holding a name, a kind tag, a 24-byte value
//!   and a "has been written" flag. Accessors check the kind and never
//!   reinterpret the value.
//! - [`ParameterCollection`]: name-based lookup over parameters borrowed
//!   from a record.
//! - Batch records: a header ([`SharedHeader`], [`FromDisplayHeader`],
//!   [`ToDisplayHeader`]) followed by a parameter array whose length the
//!   header records. [`BatchRecord`] owns one; [`RecordView`] and
//!   [`RecordViewMut`] borrow one from any aligned byte region.
//! - [`SharedMemory`]: create, attach, detach and remove a segment holding
//!   exactly one record.
//! - [`SocketConnect`]: non-blocking single-peer TCP transport that ships
//!   one whole record per call.
//!
//! ## Data flow
//!
//! ```text
//! ┌──────────────┐  control params  ┌──────────────────┐  control params  ┌──────────────┐
//! │   Display    ├─────────────────►│ segment / socket ├─────────────────►│   Producer   │
//! │              │◄─────────────────┤  [Header|Params] │◄─────────────────┤              │
//! └──────────────┘   wave params    └──────────────────┘   wave params    └──────────────┘
//! ```
//!
//! ## Shared memory
//!
//! ```rust,no_run
//! use wavelink_core::{SharedHeader, SharedMemory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut display = SharedMemory::<SharedHeader>::create_record("demo", 2, 0, true)?;
//! {
//!     let mut view = display.get_mut()?;
//!     view.parameter_mut(0)?.set_name("pf");
//!     view.parameter_mut(1)?.set_name("pd");
//! }
//!
//! let mut producer = SharedMemory::<SharedHeader>::attach_record("demo", 2, 0)?;
//! let mut view = producer.get_mut()?;
//! view.connect();
//! let mut params = view.collect_parameters("producer");
//! params.lookup_mut("pf")?.set_value(1.5f32);
//! params.lookup_mut("pd")?.set_value(2.5f64);
//! # Ok(())
//! # }
//! ```
//!
//! ## Socket
//!
//! ```rust,no_run
//! use wavelink_core::ProducerSocket;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sock = ProducerSocket::new();
//! sock.init_for(1, 1, false)?;
//! sock.connect_to_server("127.0.0.1", 5230, 2000)?;
//! sock.get_send_mut()?.parameter_mut(0)?.set_value(3.0f32);
//! while sock.send(false).is_none() {}
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Nothing here spawns threads or takes locks. Shared segments can be
//! mapped by several processes at once and a value read mid-write may be
//! torn; the `connected` counter is a plain integer. A socket transport
//! serves one peer and is not reentrant.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod detect;
pub mod error;
pub mod gamepad;
pub mod parameter;
pub mod platform;
pub mod populate;
pub mod record;
pub mod shm;
pub mod socket;

pub use collection::ParameterCollection;
pub use detect::{detect_waveforms, waveform_channels};
pub use error::{LinkError, LinkResult};
pub use gamepad::{GamepadButton, GamepadCommand};
pub use parameter::{Parameter, ParameterValue};
pub use populate::{initial_value, parameter_from_spec, populate_controls};
pub use record::{
    BatchRecord, FromDisplayHeader, RecordLayout, RecordView, RecordViewMut, SharedHeader,
    SharedParameters, SocketFromDisplay, SocketToDisplay, ToDisplayHeader, checked_record_size,
    param_capacity, record_size,
};
pub use shm::{SegmentState, SharedMemory};
pub use socket::{DisplaySocket, ProducerSocket, SocketConnect};
pub use wavelink::kind::{PARAMETER_KINDS, ParameterKind};

/// Initialize tracing with an `EnvFilter` read from `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
