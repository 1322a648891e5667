//! Shared wire protocol for wind telemetry broadcasts
//!
//! This module defines the fixed-layout frame exchanged between a wind
//! sensor node and any listener (boat-side primary transmitter, host
//! tooling). There are no variable-length fields and no checksum; integrity
//! relies on the transport's own link-layer framing.
//!
//! # Layout
//!
//! All scalars are little-endian, fields are packed:
//!
//! | offset | field          | size | notes                                  |
//! |--------|----------------|------|----------------------------------------|
//! | 0      | kind           | 1    | `i8`, see [`DeviceKind`]               |
//! | 1      | source label   | 18   | ASCII "AA:BB:CC:DD:EE:FF", NUL-padded  |
//! | 19     | source address | 6    | raw hardware address                   |
//! | 25     | measurement    | 4    | IEEE-754 `f32`, wind speed in m/s      |

use core::fmt;

use crate::domain::{DeviceIdentity, DeviceKind, MacAddress, MacLabel, Measurement};

/// Size of the label field, including its NUL terminator
pub const LABEL_FIELD_LEN: usize = 18;

/// Offset of the kind byte
pub const KIND_OFFSET: usize = 0;
/// Offset of the label field
pub const LABEL_OFFSET: usize = 1;
/// Offset of the address field
pub const ADDRESS_OFFSET: usize = LABEL_OFFSET + LABEL_FIELD_LEN;
/// Offset of the measurement field
pub const MEASUREMENT_OFFSET: usize = ADDRESS_OFFSET + 6;

/// Encoded frame size in bytes
pub const FRAME_LEN: usize = MEASUREMENT_OFFSET + 4;

/// Errors when decoding a received frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload is not exactly `FRAME_LEN` bytes
    InvalidLength(usize),
    /// Kind byte is not a known `DeviceKind`
    UnknownKind(i8),
    /// Label field has no NUL terminator
    UnterminatedLabel,
    /// Label is not a canonical address rendering
    MalformedLabel,
    /// Label and address fields describe different addresses
    LabelMismatch,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidLength(len) => {
                write!(f, "frame is {} bytes, expected {}", len, FRAME_LEN)
            }
            FrameError::UnknownKind(code) => write!(f, "unknown device kind {}", code),
            FrameError::UnterminatedLabel => write!(f, "source label is not NUL-terminated"),
            FrameError::MalformedLabel => write!(f, "source label is not an address"),
            FrameError::LabelMismatch => write!(f, "source label does not match source address"),
        }
    }
}

/// One broadcast describing one measurement event
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryFrame {
    /// Kind of node that produced the frame
    pub kind: DeviceKind,
    /// Human-readable rendering of `source_address`
    pub source_label: MacLabel,
    /// Hardware address of the producing node
    pub source_address: MacAddress,
    /// Measured value (m/s)
    pub measurement: f32,
}

impl TelemetryFrame {
    /// Build a frame for `identity` carrying `measurement`
    pub fn build(kind: DeviceKind, identity: DeviceIdentity, measurement: Measurement) -> Self {
        Self {
            kind,
            source_label: identity.label(),
            source_address: identity,
            measurement: measurement.meters_per_second(),
        }
    }

    /// Encode into the fixed wire layout
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[KIND_OFFSET] = self.kind.code() as u8;

        let label = self.source_label.as_bytes();
        buf[LABEL_OFFSET..LABEL_OFFSET + label.len()].copy_from_slice(label);

        buf[ADDRESS_OFFSET..MEASUREMENT_OFFSET].copy_from_slice(&self.source_address.octets());
        buf[MEASUREMENT_OFFSET..FRAME_LEN].copy_from_slice(&self.measurement.to_le_bytes());
        buf
    }

    /// Decode a received payload
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() != FRAME_LEN {
            return Err(FrameError::InvalidLength(payload.len()));
        }

        let code = payload[KIND_OFFSET] as i8;
        let kind = DeviceKind::from_code(code).ok_or(FrameError::UnknownKind(code))?;

        let field = &payload[LABEL_OFFSET..ADDRESS_OFFSET];
        let end = field
            .iter()
            .position(|&b| b == 0)
            .ok_or(FrameError::UnterminatedLabel)?;
        let text = core::str::from_utf8(&field[..end]).map_err(|_| FrameError::MalformedLabel)?;
        let labelled = MacAddress::parse(text).map_err(|_| FrameError::MalformedLabel)?;

        let mut octets = [0u8; 6];
        octets.copy_from_slice(&payload[ADDRESS_OFFSET..MEASUREMENT_OFFSET]);
        let source_address = MacAddress::new(octets);
        if labelled != source_address {
            return Err(FrameError::LabelMismatch);
        }

        let mut value = [0u8; 4];
        value.copy_from_slice(&payload[MEASUREMENT_OFFSET..FRAME_LEN]);

        Ok(Self {
            kind,
            source_label: source_address.label(),
            source_address,
            measurement: f32::from_le_bytes(value),
        })
    }
}
