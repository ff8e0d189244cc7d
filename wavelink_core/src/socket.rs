//! Single-peer TCP transport exchanging one raw record per direction
//!
//! Each side owns a send buffer holding a record with header `S` and a read
//! buffer holding a record with header `R`. Records go over the wire as
//! their exact byte image, with no length prefix; both ends agree on the
//! sizes beforehand.
//!
//! The handshake (`connect_to_server` / `listen_to_client`) is bounded by a
//! timeout. Steady-state `send` and `read` never block and report "nothing
//! transferred" as `None`.
//!
//! A record is only ever delivered whole: `read` accumulates partial
//! receives until `read_size` bytes have arrived, and `send` finishes a
//! partially written record before it snapshots the next one.

use crate::error::{LinkError, LinkResult};
use crate::platform;
use crate::record::{
    FromDisplayHeader, RecordLayout, RecordView, RecordViewMut, ToDisplayHeader,
    checked_record_size, param_capacity,
};
use bytemuck::Zeroable;
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::mem::size_of;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::os::unix::io::AsRawFd;
use std::time::{Duration, Instant};

/// Pause between refused connection attempts during the handshake.
const CONNECT_RETRY: Duration = Duration::from_millis(10);

/// Display end: sends control records, reads waveform records.
pub type DisplaySocket = SocketConnect<FromDisplayHeader, ToDisplayHeader>;
/// Producer end: sends waveform records, reads control records.
pub type ProducerSocket = SocketConnect<ToDisplayHeader, FromDisplayHeader>;

/// Non-blocking point-to-point record channel.
pub struct SocketConnect<S: RecordLayout, R: RecordLayout> {
    send_buf: Vec<u64>,
    read_buf: Vec<u64>,
    outgoing: Vec<u8>,
    sent: Option<usize>,
    incoming: Vec<u8>,
    received: usize,
    send_size: usize,
    read_size: usize,
    is_server: bool,
    initialized: bool,
    stream: Option<TcpStream>,
    _layout: PhantomData<(S, R)>,
}

impl<S: RecordLayout, R: RecordLayout> Default for SocketConnect<S, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RecordLayout, R: RecordLayout> SocketConnect<S, R> {
    /// Uninitialized transport.
    pub fn new() -> Self {
        Self {
            send_buf: Vec::new(),
            read_buf: Vec::new(),
            outgoing: Vec::new(),
            sent: None,
            incoming: Vec::new(),
            received: 0,
            send_size: 0,
            read_size: 0,
            is_server: false,
            initialized: false,
            stream: None,
            _layout: PhantomData,
        }
    }

    /// Allocate zeroed send/read buffers of the given byte sizes.
    ///
    /// Each size must be a header plus a whole, non-zero number of
    /// parameters. The send buffer's header counts are filled in from its
    /// capacity. On error the transport stays uninitialized.
    pub fn init(&mut self, send_size: usize, read_size: usize, is_server: bool) -> LinkResult<()> {
        self.close();

        let send_count = Self::checked_capacity::<S>("send", send_size)?;
        Self::checked_capacity::<R>("read", read_size)?;

        let mut header = S::zeroed();
        let (control, wave) = S::split_total(send_count);
        header.write_counts(control, wave)?;

        self.send_buf = vec![0u64; send_size / size_of::<u64>()];
        self.read_buf = vec![0u64; read_size / size_of::<u64>()];
        bytemuck::cast_slice_mut::<u64, u8>(&mut self.send_buf)[..size_of::<S>()]
            .copy_from_slice(bytemuck::bytes_of(&header));
        self.outgoing = vec![0u8; send_size];
        self.incoming = vec![0u8; read_size];
        self.send_size = send_size;
        self.read_size = read_size;
        self.is_server = is_server;
        self.initialized = true;

        tracing::debug!(
            "socket initialized as {} (send {} bytes, read {} bytes)",
            if is_server { "server" } else { "client" },
            send_size,
            read_size
        );
        Ok(())
    }

    /// [`init`](Self::init) with buffers sized from parameter counts.
    pub fn init_for(&mut self, send_count: usize, read_count: usize, is_server: bool) -> LinkResult<()> {
        self.init(
            checked_record_size::<S>(send_count, 0)?,
            checked_record_size::<R>(read_count, 0)?,
            is_server,
        )
    }

    fn checked_capacity<H: RecordLayout>(which: &str, size: usize) -> LinkResult<usize> {
        let capacity = param_capacity::<H>(size).filter(|n| *n > 0);
        capacity.ok_or_else(|| {
            tracing::warn!("rejected {} buffer size {} for {}", which, size, H::NAME);
            LinkError::invalid(format!(
                "{} size {} is not a {} header plus at least one parameter",
                which,
                size,
                H::NAME
            ))
        })
    }

    /// Connect to a listening peer, retrying refused attempts until
    /// `timeout_ms` has elapsed.
    pub fn connect_to_server(&mut self, address: &str, port: u16, timeout_ms: u64) -> LinkResult<()> {
        self.ensure_initialized()?;
        if self.is_server {
            return Err(LinkError::invalid("server transport cannot connect"));
        }
        if port == 0 {
            return Err(LinkError::invalid("port must be non-zero"));
        }
        let target = format!("{}:{}", address, port);
        let addr = (address, port)
            .to_socket_addrs()
            .map_err(|e| LinkError::invalid(format!("cannot resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| LinkError::invalid(format!("no address for {}", target)))?;

        self.drop_peer();
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let timeout = || LinkError::Timeout {
            operation: "connect",
            timeout_ms,
        };
        let stream = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout());
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => break stream,
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    return Err(timeout());
                }
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    tracing::trace!("connect to {} refused, retrying", target);
                    std::thread::sleep(CONNECT_RETRY.min(remaining));
                }
                Err(source) => {
                    return Err(LinkError::ConnectError {
                        address: target,
                        source,
                    });
                }
            }
        };

        let configured = stream
            .set_nonblocking(true)
            .and_then(|()| stream.set_nodelay(true));
        if let Err(source) = configured {
            return Err(LinkError::ConnectError {
                address: target,
                source,
            });
        }
        tracing::info!("connected to {}", target);
        self.stream = Some(stream);
        Ok(())
    }

    /// Bind `port` on all interfaces, wait up to `timeout_ms` for a peer and
    /// accept exactly one.
    pub fn listen_to_client(&mut self, port: u16, backlog: i32, timeout_ms: u64) -> LinkResult<()> {
        self.ensure_initialized()?;
        if !self.is_server {
            return Err(LinkError::invalid("client transport cannot listen"));
        }
        if port == 0 {
            return Err(LinkError::invalid("port must be non-zero"));
        }
        if backlog <= 0 {
            return Err(LinkError::invalid(format!(
                "backlog must be positive, got {}",
                backlog
            )));
        }

        self.drop_peer();
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|source| LinkError::BindError { port, source })?;
        platform::listen(&listener, backlog)
            .map_err(|source| LinkError::ListenError { port, source })?;
        tracing::info!("listening on port {} (backlog {})", port, backlog);

        let ready = platform::wait_readable(listener.as_raw_fd(), Duration::from_millis(timeout_ms))
            .map_err(|source| LinkError::AcceptError { source })?;
        if !ready {
            return Err(LinkError::Timeout {
                operation: "listen",
                timeout_ms,
            });
        }

        let (stream, peer) = listener
            .accept()
            .map_err(|source| LinkError::AcceptError { source })?;
        stream
            .set_nonblocking(true)
            .and_then(|()| stream.set_nodelay(true))
            .map_err(|source| LinkError::AcceptError { source })?;
        tracing::info!("accepted peer {}", peer);
        self.stream = Some(stream);
        Ok(())
    }

    /// Transmit the send buffer.
    ///
    /// Returns the record size once a whole record has been written, or
    /// `None` if nothing completed (not connected, socket not ready, peer
    /// gone). A record cut short by a full socket is finished by the next
    /// call before a new snapshot is taken.
    pub fn send(&mut self, verbose: bool) -> Option<usize> {
        let stream = self.stream.as_mut()?;
        let mut offset = match self.sent {
            Some(offset) => offset,
            None => {
                self.outgoing
                    .copy_from_slice(bytemuck::cast_slice(&self.send_buf));
                0
            }
        };

        while offset < self.send_size {
            match stream.write(&self.outgoing[offset..]) {
                Ok(0) => {
                    self.sent = Some(offset);
                    return None;
                }
                Ok(n) => offset += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.sent = Some(offset);
                    if verbose {
                        tracing::debug!("send paused at {}/{} bytes", offset, self.send_size);
                    }
                    return None;
                }
                Err(e) => {
                    tracing::warn!("send failed: {}", e);
                    self.drop_peer();
                    return None;
                }
            }
        }

        self.sent = None;
        if verbose {
            tracing::debug!("sent {} bytes", self.send_size);
        }
        Some(self.send_size)
    }

    /// Receive into the read buffer.
    ///
    /// Returns the record size when a whole record has arrived and been
    /// copied over the read buffer, `None` otherwise. Partial receives are
    /// kept until the rest of the record arrives.
    pub fn read(&mut self, verbose: bool) -> Option<usize> {
        let stream = self.stream.as_mut()?;
        loop {
            match stream.read(&mut self.incoming[self.received..]) {
                Ok(0) => {
                    tracing::info!("peer closed the connection");
                    self.drop_peer();
                    return None;
                }
                Ok(n) => {
                    self.received += n;
                    if self.received == self.read_size {
                        bytemuck::cast_slice_mut::<u64, u8>(&mut self.read_buf)
                            .copy_from_slice(&self.incoming);
                        self.received = 0;
                        if verbose {
                            tracing::debug!("read {} bytes", self.read_size);
                        }
                        return Some(self.read_size);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if verbose && self.received > 0 {
                        tracing::debug!(
                            "partial record {}/{} bytes",
                            self.received,
                            self.read_size
                        );
                    }
                    return None;
                }
                Err(e) => {
                    tracing::warn!("read failed: {}", e);
                    self.drop_peer();
                    return None;
                }
            }
        }
    }

    /// Typed view of the send buffer.
    pub fn get_send(&self) -> LinkResult<RecordView<'_, S>> {
        self.ensure_initialized()?;
        RecordView::from_bytes(bytemuck::cast_slice(&self.send_buf))
    }

    /// Mutable typed view of the send buffer.
    pub fn get_send_mut(&mut self) -> LinkResult<RecordViewMut<'_, S>> {
        self.ensure_initialized()?;
        RecordViewMut::from_bytes(bytemuck::cast_slice_mut(&mut self.send_buf))
    }

    /// Typed view of the last complete record received.
    pub fn get_read(&self) -> LinkResult<RecordView<'_, R>> {
        self.ensure_initialized()?;
        RecordView::from_bytes(bytemuck::cast_slice(&self.read_buf))
    }

    /// Mutable typed view of the read buffer.
    pub fn get_read_mut(&mut self) -> LinkResult<RecordViewMut<'_, R>> {
        self.ensure_initialized()?;
        RecordViewMut::from_bytes(bytemuck::cast_slice_mut(&mut self.read_buf))
    }

    /// Release the connection and both buffers. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.initialized || self.stream.is_some() {
            tracing::debug!("closing socket transport");
        }
        self.drop_peer();
        self.send_buf = Vec::new();
        self.read_buf = Vec::new();
        self.outgoing = Vec::new();
        self.incoming = Vec::new();
        self.send_size = 0;
        self.read_size = 0;
        self.initialized = false;
    }

    /// Whether `init` succeeded and `close` has not been called since.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a peer is connected.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    /// Whether this end listens rather than connects.
    pub fn is_server(&self) -> bool {
        self.is_server
    }

    /// Bytes per outgoing record.
    pub fn send_size(&self) -> usize {
        self.send_size
    }

    /// Bytes per incoming record.
    pub fn read_size(&self) -> usize {
        self.read_size
    }

    fn ensure_initialized(&self) -> LinkResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(LinkError::NotInitialized)
        }
    }

    fn drop_peer(&mut self) {
        self.stream = None;
        self.sent = None;
        self.received = 0;
    }
}

impl<S: RecordLayout, R: RecordLayout> Drop for SocketConnect<S, R> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record_size;

    #[test]
    fn test_init_rejects_bad_sizes() {
        let mut sock = DisplaySocket::new();
        assert!(matches!(
            sock.init(0, record_size::<ToDisplayHeader>(1).unwrap(), false),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            sock.init(record_size::<FromDisplayHeader>(1).unwrap(), 0, false),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            sock.init(record_size::<FromDisplayHeader>(0).unwrap(), 56, false),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            sock.init(record_size::<FromDisplayHeader>(1).unwrap() + 1, 56, false),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(!sock.is_initialized());
        assert!(matches!(sock.get_send(), Err(LinkError::NotInitialized)));
        assert!(matches!(sock.get_read(), Err(LinkError::NotInitialized)));
    }

    #[test]
    fn test_init_for_rejects_oversized_counts() {
        let mut sock = ProducerSocket::new();
        assert!(matches!(
            sock.init_for(usize::MAX / 40, 1, false),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            sock.init_for(1, usize::MAX, false),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(!sock.is_initialized());
    }

    #[test]
    fn test_init_writes_send_counts() {
        let mut sock = ProducerSocket::new();
        sock.init_for(3, 2, true).unwrap();
        assert_eq!(sock.send_size(), 8 + 3 * 48);
        assert_eq!(sock.read_size(), 72 + 2 * 48);
        assert_eq!(sock.get_send().unwrap().parameters().len(), 3);
        assert_eq!(sock.get_read().unwrap().parameters().len(), 0);
        assert_eq!(sock.get_read().unwrap().capacity(), 2);
    }

    #[test]
    fn test_unconnected_io_is_soft() {
        let mut sock = DisplaySocket::new();
        assert_eq!(sock.send(true), None);
        assert_eq!(sock.read(true), None);
        sock.init_for(1, 1, false).unwrap();
        assert_eq!(sock.send(false), None);
        assert_eq!(sock.read(false), None);
        assert!(!sock.is_connected());
        assert!(sock.peer_addr().is_none());
    }

    #[test]
    fn test_role_and_argument_checks() {
        let mut client = DisplaySocket::new();
        assert!(matches!(
            client.connect_to_server("127.0.0.1", 1, 10),
            Err(LinkError::NotInitialized)
        ));
        client.init_for(1, 1, false).unwrap();
        assert!(matches!(
            client.listen_to_client(5230, 5, 10),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            client.connect_to_server("127.0.0.1", 0, 10),
            Err(LinkError::InvalidArgument { .. })
        ));

        let mut server = ProducerSocket::new();
        server.init_for(1, 1, true).unwrap();
        assert!(matches!(
            server.listen_to_client(5230, 0, 10),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            server.connect_to_server("127.0.0.1", 5230, 10),
            Err(LinkError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut sock = DisplaySocket::new();
        sock.init_for(2, 2, false).unwrap();
        sock.close();
        sock.close();
        assert!(!sock.is_initialized());
        assert!(matches!(sock.get_send_mut(), Err(LinkError::NotInitialized)));
    }
}
