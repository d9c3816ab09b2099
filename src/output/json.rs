//! Structured-text (JSON) record encoder.
//!
//! Produces the object layout collectors of the first deployment consumed:
//!
//! ```json
//! {"device_type":0,"mac_address":"0C:0B:0A:09:08:07","tx_power":14,"rssi":-75,"sender":"7","addons":{"button":0}}
//! ```

use super::{EncodeError, RecordEncoder};
use crate::mac_address::MacAddress;
use crate::record::{BeaconRecord, Payload};
use serde::Serialize;

/// Format-specific fields, serialized as a nested object.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Addons<'a> {
    Pebblebee { button: u8 },
    RuuviTag { data: &'a str },
    UriBeacon { url: &'a str },
    Unknown { raw: String },
}

impl<'a> From<&'a Payload> for Addons<'a> {
    fn from(payload: &'a Payload) -> Self {
        match payload {
            Payload::Pebblebee { button } => Addons::Pebblebee { button: *button },
            Payload::RuuviTag { data } => Addons::RuuviTag { data },
            Payload::UriBeacon { url } => Addons::UriBeacon { url },
            Payload::Unknown { raw } => Addons::Unknown {
                raw: raw.iter().map(|b| format!("{b:02X}")).collect(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    device_type: u8,
    mac_address: &'a MacAddress,
    tx_power: i8,
    rssi: i8,
    sender: &'a str,
    addons: Addons<'a>,
}

impl<'a> From<&'a BeaconRecord> for JsonRecord<'a> {
    fn from(record: &'a BeaconRecord) -> Self {
        Self {
            device_type: record.device_type().code(),
            mac_address: &record.mac,
            tx_power: record.tx_power,
            rssi: record.rssi,
            sender: &record.sender,
            addons: Addons::from(&record.payload),
        }
    }
}

/// Encodes records as one JSON object per datagram.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl RecordEncoder for JsonEncoder {
    fn encode(&self, record: &BeaconRecord) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(&JsonRecord::from(record))?)
    }
}
