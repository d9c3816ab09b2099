//! Decoded beacon record.

use crate::mac_address::MacAddress;
use std::fmt;

/// Beacon family of a decoded record, with the integer codes the collector expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Pebblebee,
    RuuviTag,
    UriBeacon,
    Unknown,
}

impl DeviceType {
    pub fn code(self) -> u8 {
        match self {
            DeviceType::Pebblebee => 0,
            DeviceType::RuuviTag => 1,
            DeviceType::UriBeacon => 2,
            DeviceType::Unknown => 3,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Pebblebee => write!(f, "Pebblebee"),
            DeviceType::RuuviTag => write!(f, "RuuviTag"),
            DeviceType::UriBeacon => write!(f, "UriBeacon"),
            DeviceType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Format-specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Button state, 0 or 1
    Pebblebee { button: u8 },
    /// Encoded sensor data following `ruu.vi/#`
    RuuviTag { data: String },
    /// Expanded URL
    UriBeacon { url: String },
    /// No registered signature matched
    Unknown { raw: Vec<u8> },
}

/// A decoded advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconRecord {
    pub mac: MacAddress,
    /// Calibrated TX power in dBm
    pub tx_power: i8,
    /// Received signal strength in dBm
    pub rssi: i8,
    /// Identifier of the forwarding node
    pub sender: String,
    pub payload: Payload,
    /// The byte sequence the record was decoded from
    pub bytes: Vec<u8>,
}

impl BeaconRecord {
    pub fn device_type(&self) -> DeviceType {
        match self.payload {
            Payload::Pebblebee { .. } => DeviceType::Pebblebee,
            Payload::RuuviTag { .. } => DeviceType::RuuviTag,
            Payload::UriBeacon { .. } => DeviceType::UriBeacon,
            Payload::Unknown { .. } => DeviceType::Unknown,
        }
    }
}
