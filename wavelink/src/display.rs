//! Display end of a link
//!
//! The display owns the exchange: it creates the shared segment (or listens
//! for the producer), publishes the configured control parameters, and
//! watches the waveform parameters until the producer has published all of
//! them.

use tracing::{debug, info};
use wavelink_common::config::{LinkConfig, TransportMode};
use wavelink_core::{
    DisplaySocket, LinkError, LinkResult, Parameter, ParameterCollection, ParameterValue,
    RecordLayout, RecordViewMut, SharedHeader, SharedMemory, detect_waveforms, populate_controls,
    waveform_channels,
};

/// Ticks between two channel value reports.
const REPORT_EVERY: u64 = 1000;

enum DisplayTransport {
    Shared(SharedMemory<SharedHeader>),
    Socket(DisplaySocket),
}

/// Display side of one link.
pub struct DisplayEnd {
    transport: DisplayTransport,
    channels: Option<Vec<String>>,
    frames: u64,
}

impl DisplayEnd {
    /// Create the exchange described by `config` and publish its controls.
    ///
    /// In socket mode this blocks until a producer connects or the
    /// configured timeout expires.
    pub fn open(config: &LinkConfig, allow_overwrite: bool) -> LinkResult<Self> {
        config.validate()?;
        let num_control = config.num_control_params();
        let num_wave = config.num_wave_params();

        let transport = match config.transport.mode {
            TransportMode::SharedMemory => {
                let mut shm = SharedMemory::<SharedHeader>::create_record(
                    &config.transport.segment,
                    num_control,
                    num_wave,
                    allow_overwrite,
                )?;
                populate_controls(&mut shm.get_mut()?, &config.control)?;
                info!(
                    "display published {} controls on segment {} ({} waveform slots)",
                    num_control,
                    shm.name(),
                    num_wave
                );
                DisplayTransport::Shared(shm)
            }
            TransportMode::Socket => {
                if num_control == 0 || num_wave == 0 {
                    return Err(LinkError::invalid(
                        "socket links need at least one control and one waveform parameter",
                    ));
                }
                let mut socket = DisplaySocket::new();
                socket.init_for(num_control, num_wave, true)?;
                populate_controls(&mut socket.get_send_mut()?, &config.control)?;
                info!(
                    "display waiting for producer on port {} ({} ms)",
                    config.transport.port, config.transport.timeout_ms
                );
                socket.listen_to_client(
                    config.transport.port,
                    config.transport.backlog,
                    config.transport.timeout_ms,
                )?;
                DisplayTransport::Socket(socket)
            }
        };

        Ok(Self {
            transport,
            channels: None,
            frames: 0,
        })
    }

    /// Exchange one record and refresh waveform detection.
    pub fn step(&mut self, tick: u64) -> LinkResult<()> {
        let detected = match &mut self.transport {
            DisplayTransport::Shared(shm) => detect_waveforms(&shm.get()?),
            DisplayTransport::Socket(socket) => {
                socket.send(false);
                if socket.read(false).is_some() {
                    self.frames += 1;
                }
                waveform_channels(socket.get_read()?.wave_parameters())
            }
        };

        match (&self.channels, &detected) {
            (None, Some(channels)) => info!("waveforms published: {}", channels.join(", ")),
            (Some(_), None) => info!("waveforms withdrawn"),
            _ => {}
        }
        self.channels = detected;

        if self.channels.is_some() && tick % REPORT_EVERY == 0 {
            debug!("tick {} waveform values {:?}", tick, self.wave_values()?);
        }
        Ok(())
    }

    /// Detected waveform channel names, if the producer has published.
    pub fn channels(&self) -> Option<&[String]> {
        self.channels.as_deref()
    }

    /// Current waveform values, one entry per channel.
    pub fn wave_values(&self) -> LinkResult<Vec<f64>> {
        match &self.transport {
            DisplayTransport::Shared(shm) => channel_values(shm.get()?.wave_parameters()),
            DisplayTransport::Socket(socket) => {
                channel_values(socket.get_read()?.wave_parameters())
            }
        }
    }

    /// Update a published control parameter by name, keeping its kind.
    pub fn set_control(&mut self, name: &str, value: ParameterValue) -> LinkResult<()> {
        match &mut self.transport {
            DisplayTransport::Shared(shm) => refresh_control(&mut shm.get_mut()?, name, value),
            DisplayTransport::Socket(socket) => {
                refresh_control(&mut socket.get_send_mut()?, name, value)
            }
        }
    }

    /// Whether the producer side is present.
    pub fn is_connected(&self) -> bool {
        match &self.transport {
            DisplayTransport::Shared(shm) => shm.get().is_ok_and(|v| v.connected() > 0),
            DisplayTransport::Socket(socket) => socket.is_connected(),
        }
    }

    /// Whether a socket producer has disconnected.
    ///
    /// A shared segment outlives its producers, so this is always false in
    /// shared-memory mode.
    pub fn peer_gone(&self) -> bool {
        match &self.transport {
            DisplayTransport::Shared(_) => false,
            DisplayTransport::Socket(socket) => !socket.is_connected(),
        }
    }

    /// Whole records received over the socket so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn refresh_control<H: RecordLayout>(
    view: &mut RecordViewMut<'_, H>,
    name: &str,
    value: ParameterValue,
) -> LinkResult<()> {
    let mut collection = ParameterCollection::from_slice("controls", view.control_parameters_mut());
    collection.lookup_mut(name)?.refresh_value(value)
}

/// Flatten waveform parameters into plottable values, vectors as three
/// consecutive channels.
pub fn channel_values(params: &[Parameter]) -> LinkResult<Vec<f64>> {
    let mut values = Vec::with_capacity(params.len());
    for param in params {
        match param.value()? {
            ParameterValue::Float(v) => values.push(f64::from(v)),
            ParameterValue::Double(v) => values.push(v),
            ParameterValue::S64(v) => values.push(v as f64),
            ParameterValue::Vec3Float(v) => values.extend(v.map(f64::from)),
            ParameterValue::Vec3Double(v) => values.extend(v),
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_values_flatten_vectors() {
        let params = [
            Parameter::new("a", 1.5f32),
            Parameter::new("b", [1.0f64, 2.0, 3.0]),
            Parameter::new("c", -4i64),
        ];
        assert_eq!(
            channel_values(&params).unwrap(),
            vec![1.5, 1.0, 2.0, 3.0, -4.0]
        );
    }
}
