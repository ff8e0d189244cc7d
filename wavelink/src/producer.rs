//! Producer end of a link
//!
//! Joins an exchange created by a display, then on every tick reads the
//! control parameters and echoes them back as waveform parameters. Waveform
//! slots without a matching control carry the tick counter.

use tracing::info;
use wavelink_common::config::{LinkConfig, TransportMode};
use wavelink_core::{
    LinkError, LinkResult, Parameter, ProducerSocket, SharedHeader, SharedMemory,
};

enum ProducerTransport {
    Shared(SharedMemory<SharedHeader>),
    Socket(ProducerSocket),
}

/// Producer side of one link.
pub struct ProducerEnd {
    transport: ProducerTransport,
}

impl ProducerEnd {
    /// Join the exchange described by `config`.
    ///
    /// Shared memory: attach to the segment and raise its connected counter.
    /// Socket: connect to the display, retrying until the configured timeout.
    pub fn open(config: &LinkConfig) -> LinkResult<Self> {
        config.validate()?;
        let num_control = config.num_control_params();
        let num_wave = config.num_wave_params();

        let transport = match config.transport.mode {
            TransportMode::SharedMemory => {
                let mut shm = SharedMemory::<SharedHeader>::attach_record(
                    &config.transport.segment,
                    num_control,
                    num_wave,
                )?;
                let connected = shm.get_mut()?.connect();
                info!(
                    "producer attached to segment {} ({} connected)",
                    shm.name(),
                    connected
                );
                ProducerTransport::Shared(shm)
            }
            TransportMode::Socket => {
                if num_control == 0 || num_wave == 0 {
                    return Err(LinkError::invalid(
                        "socket links need at least one control and one waveform parameter",
                    ));
                }
                let mut socket = ProducerSocket::new();
                socket.init_for(num_wave, num_control, false)?;
                socket.connect_to_server(
                    &config.transport.address,
                    config.transport.port,
                    config.transport.timeout_ms,
                )?;
                info!(
                    "producer connected to {}:{}",
                    config.transport.address, config.transport.port
                );
                ProducerTransport::Socket(socket)
            }
        };
        Ok(Self { transport })
    }

    /// Read controls, echo them into the waveform parameters and publish.
    pub fn step(&mut self, tick: u64) -> LinkResult<()> {
        match &mut self.transport {
            ProducerTransport::Shared(shm) => {
                let mut view = shm.get_mut()?;
                let control = view.control_parameters().len();
                let wave = view.wave_parameters().len();
                let (controls, rest) = view.parameters_mut().split_at_mut(control);
                echo_controls(controls, &mut rest[..wave], tick);
            }
            ProducerTransport::Socket(socket) => {
                socket.read(false);
                let controls: Vec<Parameter> = socket.get_read()?.control_parameters().to_vec();
                echo_controls(&controls, socket.get_send_mut()?.wave_parameters_mut(), tick);
                socket.send(false);
            }
        }
        Ok(())
    }

    /// Whether the display side is still reachable.
    pub fn is_connected(&self) -> bool {
        match &self.transport {
            ProducerTransport::Shared(shm) => shm.is_mapped(),
            ProducerTransport::Socket(socket) => socket.is_connected(),
        }
    }
}

impl Drop for ProducerEnd {
    fn drop(&mut self) {
        if let ProducerTransport::Shared(shm) = &mut self.transport {
            if let Ok(mut view) = shm.get_mut() {
                let connected = view.disconnect();
                info!("producer detached ({} connected)", connected);
            }
        }
    }
}

/// Fill `waves` from `controls`, slot by slot.
///
/// Wave `i` takes the name and value of control `i` when that control is
/// named and set; otherwise it is named `tick{i}` and holds `tick`.
pub fn echo_controls(controls: &[Parameter], waves: &mut [Parameter], tick: u64) {
    for (i, wave) in waves.iter_mut().enumerate() {
        let source = controls
            .get(i)
            .filter(|c| c.has_name() && c.is_set())
            .and_then(|c| c.value().ok().map(|v| (c.name(), v)));
        match source {
            Some((name, value)) => {
                if wave.name() != name {
                    wave.set_name(name);
                }
                wave.set_value(value);
            }
            None => {
                let name = format!("tick{}", i);
                if wave.name() != name {
                    wave.set_name(&name);
                }
                wave.set_value(tick as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavelink_core::{ParameterKind, ParameterValue};

    #[test]
    fn test_echo_copies_named_set_controls() {
        let controls = [
            Parameter::new("kp", 12.5f64),
            Parameter::new("pvec3f", [1.0f32, 2.0, 3.0]),
        ];
        let mut waves = [Parameter::declare("x", ParameterKind::Double); 2];
        echo_controls(&controls, &mut waves, 7);

        assert_eq!(waves[0].name(), "kp");
        assert_eq!(waves[0].double().unwrap(), 12.5);
        assert_eq!(waves[1].name(), "pvec3f");
        assert_eq!(waves[1].vec3f().unwrap(), [1.0, 2.0, 3.0]);
        assert!(waves.iter().all(Parameter::is_set));
    }

    #[test]
    fn test_echo_fills_extra_slots_with_tick() {
        let controls = [
            Parameter::new("kp", 1.0f64),
            Parameter::declare("unset", ParameterKind::S64),
        ];
        let mut waves = [Parameter::declare("x", ParameterKind::Double); 3];
        echo_controls(&controls, &mut waves, 42);

        assert_eq!(waves[1].name(), "tick1");
        assert_eq!(waves[1].value().unwrap(), ParameterValue::Double(42.0));
        assert_eq!(waves[2].name(), "tick2");
        assert_eq!(waves[2].double().unwrap(), 42.0);
    }
}
