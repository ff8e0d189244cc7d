//! Error types for parameter, record, segment and socket operations

use thiserror::Error;
use wavelink::config::ConfigError;
use wavelink::kind::ParameterKind;

/// Errors that can occur while building, sharing or exchanging records
#[derive(Error, Debug)]
pub enum LinkError {
    /// Bad size, name, port or count
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument
        reason: String,
    },

    /// Segment already exists
    #[error("Segment already exists: {name}")]
    AlreadyExists {
        /// Segment name
        name: String,
    },

    /// Segment or parameter not found
    #[error("Not found: {name}")]
    NotFound {
        /// Segment or parameter name
        name: String,
    },

    /// Existing region size disagrees with the requested size
    #[error("Size mismatch on {name}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Segment name
        name: String,
        /// Size requested by the caller
        expected: usize,
        /// Size of the existing region
        actual: usize,
    },

    /// No segment is mapped by this handle
    #[error("No shared memory attached - create or attach first")]
    NotAttached,

    /// Transport buffers were never allocated
    #[error("Socket transport not initialized - call init first")]
    NotInitialized,

    /// Parameter accessed through the wrong kind
    #[error("Parameter type mismatch: expected {expected}, stored {actual}")]
    TypeMismatch {
        /// Kind the accessor expects
        expected: ParameterKind,
        /// Kind stored in the parameter
        actual: ParameterKind,
    },

    /// Vector component or parameter slot out of range
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of valid slots
        len: usize,
    },

    /// Handshake did not complete in time
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        /// Operation that timed out
        operation: &'static str,
        /// Configured timeout
        timeout_ms: u64,
    },

    /// Client connect failed
    #[error("Connect to {address} failed: {source}")]
    ConnectError {
        /// Peer address
        address: String,
        /// Source IO error
        source: std::io::Error,
    },

    /// Server bind failed
    #[error("Bind on port {port} failed: {source}")]
    BindError {
        /// Local port
        port: u16,
        /// Source IO error
        source: std::io::Error,
    },

    /// Server listen failed
    #[error("Listen on port {port} failed: {source}")]
    ListenError {
        /// Local port
        port: u16,
        /// Source IO error
        source: std::io::Error,
    },

    /// Server accept failed
    #[error("Accept failed: {source}")]
    AcceptError {
        /// Source IO error
        source: std::io::Error,
    },

    /// Record memory holds a kind tag outside the five known kinds
    #[error("Corrupt kind tag {raw} in record memory")]
    CorruptKind {
        /// Raw tag value
        raw: u16,
    },

    /// Configuration could not be applied
    #[error("Configuration error: {source}")]
    Config {
        /// Source config error
        #[from]
        source: ConfigError,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Nix system call error
    #[error("System call error: {source}")]
    Nix {
        /// Source nix error
        #[from]
        source: nix::Error,
    },
}

impl LinkError {
    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Result type for wavelink operations
pub type LinkResult<T> = Result<T, LinkError>;
