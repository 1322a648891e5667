//! Broadcast port - abstraction for the wireless transport
//!
//! The transport is fire-and-forget: it either accepts a frame for
//! transmission or reports an immediate failure. It never waits for a
//! remote peer to confirm delivery.

use core::fmt;
use core::future::Future;

use crate::telemetry_protocol::TelemetryFrame;

/// Error type for transport operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommunicationError {
    /// Wireless stack could not be brought up
    InitFailed,
    /// `send` was called before a successful `initialize`
    NotInitialized,
    /// Broadcast peer could not be registered
    PeerRegistrationFailed,
    /// Frame was rejected for transmission
    SendFailed,
}

impl fmt::Display for CommunicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CommunicationError::InitFailed => "transport initialization failed",
            CommunicationError::NotInitialized => "transport not initialized",
            CommunicationError::PeerRegistrationFailed => "broadcast peer registration failed",
            CommunicationError::SendFailed => "broadcast send failed",
        };
        f.write_str(text)
    }
}

/// Port for best-effort delivery of frames to every listener
///
/// # Example Implementation
///
/// ```ignore
/// struct EspNowAdapter<'d> {
///     esp_now: EspNow<'d>,
/// }
///
/// impl BroadcastPort for EspNowAdapter<'_> {
///     async fn initialize(&mut self) -> Result<(), CommunicationError> {
///         let peer = PeerInfo {
///             peer_address: BROADCAST_ADDRESS,
///             channel: None,
///             encrypt: false,
///             ..
///         };
///         self.esp_now.add_peer(peer).map_err(|_| CommunicationError::PeerRegistrationFailed)
///     }
///
///     async fn send(&mut self, frame: &TelemetryFrame) -> Result<(), CommunicationError> {
///         self.esp_now
///             .send(&BROADCAST_ADDRESS, &frame.encode())
///             .map_err(|_| CommunicationError::SendFailed)?;
///         Ok(())
///     }
/// }
/// ```
pub trait BroadcastPort {
    /// Bring up the wireless stack and register a broadcast-capable peer
    fn initialize(&mut self) -> impl Future<Output = Result<(), CommunicationError>>;

    /// Hand one frame to the radio
    ///
    /// Must return promptly; a slow transport stretches the cycle period.
    fn send(
        &mut self,
        frame: &TelemetryFrame,
    ) -> impl Future<Output = Result<(), CommunicationError>>;
}
