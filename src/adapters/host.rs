//! Host-side adapters
//!
//! These let the unmodified measurement cycle run on a PC: frames leave as
//! UDP broadcast datagrams, log lines go to the `log` crate, the
//! "display" is the terminal and delays park the calling thread.

use std::io::{self, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::thread;
use std::time::Duration as StdDuration;

use embedded_hal_async::delay::DelayNs;

use crate::domain::Measurement;
use crate::ports::communication::{BroadcastPort, CommunicationError};
use crate::ports::display::DisplayPort;
use crate::ports::log::LogPort;
use crate::telemetry_protocol::TelemetryFrame;

/// Default UDP port for telemetry datagrams
pub const DEFAULT_UDP_PORT: u16 = 4210;

/// UDP broadcast transport
///
/// Fire-and-forget like the radio it replaces: the socket is non-blocking
/// and a datagram the OS will not take right now counts as a failed send.
pub struct UdpBroadcast {
    /// Local address to bind
    bind: SocketAddr,
    /// Where datagrams are sent
    target: SocketAddr,
    /// Socket, available after `initialize()`
    socket: Option<UdpSocket>,
}

impl UdpBroadcast {
    /// Broadcast to 255.255.255.255 on `port`
    pub fn new(port: u16) -> Self {
        Self::with_target(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, port)))
    }

    /// Send to an explicit address instead (unicast or directed broadcast)
    pub fn with_target(target: SocketAddr) -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            target,
            socket: None,
        }
    }

    /// Destination of every datagram
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Whether `initialize()` succeeded
    pub fn is_initialized(&self) -> bool {
        self.socket.is_some()
    }

    fn open(&self) -> io::Result<UdpSocket> {
        let socket = UdpSocket::bind(self.bind)?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }
}

impl BroadcastPort for UdpBroadcast {
    async fn initialize(&mut self) -> Result<(), CommunicationError> {
        let socket = self.open().map_err(|e| {
            error!("udp: cannot open socket: {}", e);
            CommunicationError::InitFailed
        })?;
        debug!("udp: broadcasting to {}", self.target);
        self.socket = Some(socket);
        Ok(())
    }

    async fn send(&mut self, frame: &TelemetryFrame) -> Result<(), CommunicationError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or(CommunicationError::NotInitialized)?;

        let payload = frame.encode();
        match socket.send_to(&payload, self.target) {
            Ok(n) if n == payload.len() => Ok(()),
            Ok(n) => {
                warn!("udp: short send ({} of {} bytes)", n, payload.len());
                Err(CommunicationError::SendFailed)
            }
            Err(e) => {
                warn!("udp: send failed: {}", e);
                Err(CommunicationError::SendFailed)
            }
        }
    }
}

/// Delay that sleeps the calling thread
///
/// Every future it returns is ready on first poll, so a plain polling
/// executor never spins while the node waits out its interval.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    async fn delay_ns(&mut self, ns: u32) {
        thread::sleep(StdDuration::from_nanos(ns.into()));
    }

    async fn delay_us(&mut self, us: u32) {
        thread::sleep(StdDuration::from_micros(us.into()));
    }

    async fn delay_ms(&mut self, ms: u32) {
        thread::sleep(StdDuration::from_millis(ms.into()));
    }
}

/// Log sink writing through the `log` crate at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct StdLog;

impl LogPort for StdLog {
    fn log(&self, line: &str) {
        log::info!(target: "windnode", "{}", line);
    }
}

/// Terminal stand-in for the on-device screen
///
/// Shows the latest value with one decimal, the way the device screen does.
pub struct TerminalDisplay<W: Write> {
    out: W,
}

impl TerminalDisplay<io::Stdout> {
    /// Display on standard output
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Display on any writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Release the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplayPort for TerminalDisplay<W> {
    fn show_measurement(&mut self, measurement: Measurement) {
        // Presentation only; a broken terminal must not disturb the cycle
        let _ = writeln!(self.out, "{:>6.1} m/s", measurement.meters_per_second());
        let _ = self.out.flush();
    }
}
