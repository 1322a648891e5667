//! Node identity domain types
//!
//! Every frame a node emits carries its own hardware address twice: as raw
//! bytes and as a human-readable label. This module owns both renderings.

use core::fmt::{self, Write};
use heapless::String;

/// Length of a rendered address label ("AA:BB:CC:DD:EE:FF")
pub const MAC_LABEL_LEN: usize = 17;

/// Rendered address label
pub type MacLabel = String<MAC_LABEL_LEN>;

/// 6-byte hardware address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; 6]);

/// Error returned when a label is not a canonical address rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacParseError {
    /// Label is not exactly 17 characters
    InvalidLength,
    /// Expected ':' at this byte offset
    MissingSeparator(usize),
    /// Not an uppercase hex digit at this byte offset
    InvalidDigit(usize),
}

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacParseError::InvalidLength => write!(f, "address label must be 17 characters"),
            MacParseError::MissingSeparator(at) => write!(f, "expected ':' at offset {}", at),
            MacParseError::InvalidDigit(at) => write!(f, "invalid hex digit at offset {}", at),
        }
    }
}

impl MacAddress {
    /// Link-layer broadcast address
    pub const BROADCAST: Self = Self([0xFF; 6]);

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Render as six two-digit uppercase hex octets joined by colons
    pub fn label(&self) -> MacLabel {
        let mut label = MacLabel::new();
        // 17 characters always fit
        let _ = write!(label, "{}", self);
        label
    }

    /// Parse a canonical label back into an address
    ///
    /// Only the exact rendering produced by [`MacAddress::label`] is accepted:
    /// uppercase digits, colon separators, no surrounding whitespace.
    pub fn parse(label: &str) -> Result<Self, MacParseError> {
        let bytes = label.as_bytes();
        if bytes.len() != MAC_LABEL_LEN {
            return Err(MacParseError::InvalidLength);
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let at = i * 3;
            if i > 0 && bytes[at - 1] != b':' {
                return Err(MacParseError::MissingSeparator(at - 1));
            }
            let hi = hex_value(bytes[at]).ok_or(MacParseError::InvalidDigit(at))?;
            let lo = hex_value(bytes[at + 1]).ok_or(MacParseError::InvalidDigit(at + 1))?;
            *octet = (hi << 4) | lo;
        }

        Ok(Self(octets))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

/// The node's own address, resolved once at startup
pub type DeviceIdentity = MacAddress;

/// Kind of node that emitted a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i8)]
pub enum DeviceKind {
    /// Not set
    Unknown = 0,
    /// Boat-side primary transmitter
    PrimaryTransmitter = 1,
    /// Wind sensor node
    WindSensor = 2,
}

impl DeviceKind {
    /// Wire value
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Decode a wire value
    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(DeviceKind::Unknown),
            1 => Some(DeviceKind::PrimaryTransmitter),
            2 => Some(DeviceKind::WindSensor),
            _ => None,
        }
    }

    /// Short name for log lines
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Unknown => "unknown",
            DeviceKind::PrimaryTransmitter => "primary_transmitter",
            DeviceKind::WindSensor => "wind_sensor",
        }
    }
}
