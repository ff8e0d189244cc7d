//! System-wide constants for the wavelink workspace.
//!
//! Single source of truth for layout limits and transport defaults.
//! Both ends of a segment or socket must be built against the same values.

/// Capacity of a parameter name buffer in bytes (no terminator guaranteed).
pub const PARAM_NAME_CAPACITY: usize = 16;

/// Size of the raw value union carried by every parameter.
pub const PARAM_VALUE_SIZE: usize = 24;

/// Size of one serialized parameter: set flag, name, kind tag, padding, value.
pub const PARAMETER_SIZE: usize = 48;

/// Alignment every batch record buffer must honor.
pub const RECORD_ALIGN: usize = 8;

/// Number of button flags in the gamepad block.
pub const GAMEPAD_BUTTON_COUNT: usize = 12;

/// Default shared-memory segment name used by the demo driver.
pub const DEFAULT_SEGMENT_NAME: &str = "demo";

/// Default TCP port of the display side.
pub const DEFAULT_PORT: u16 = 5230;

/// Default connect/listen handshake timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default pending-connection queue length for the listening side.
pub const DEFAULT_LISTEN_BACKLOG: i32 = 5;

/// Default exchange tick period in microseconds (1 kHz).
pub const DEFAULT_TICK_US: u64 = 1000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "wavelink.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_size_covers_fields() {
        // flag + name + kind tag, padded to the value's 8-byte alignment
        let head = 1 + PARAM_NAME_CAPACITY + 2;
        let padded = head.div_ceil(RECORD_ALIGN) * RECORD_ALIGN;
        assert_eq!(padded + PARAM_VALUE_SIZE, PARAMETER_SIZE);
    }

    #[test]
    fn parameter_size_is_record_aligned() {
        assert_eq!(PARAMETER_SIZE % RECORD_ALIGN, 0);
    }

    #[test]
    fn transport_defaults_are_sane() {
        assert!(DEFAULT_PORT > 0);
        assert!(DEFAULT_TIMEOUT_MS > 0);
        assert!(DEFAULT_LISTEN_BACKLOG > 0);
        assert!(!DEFAULT_SEGMENT_NAME.is_empty());
    }
}
