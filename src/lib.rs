//! `beacon-forwarder` library.
//!
//! The binary (`src/main.rs`) is responsible for logging setup and process exit
//! codes. Decoding lives in [`crate::decoder`] and is pure; [`crate::session`]
//! drives it with an injected capture [`Source`] and [`Transport`] so the whole
//! loop can be tested without a Bluetooth controller or a collector.

pub mod app;
pub mod capture;
pub mod decoder;
pub mod distance;
pub mod mac_address;
pub mod output;
pub mod record;
pub mod sender;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use capture::{Backend, CaptureConfig, CaptureError, Source, SystemSource};
pub use decoder::signature::Family;
pub use decoder::{DecodeError, Decoder, DecoderPolicy, TxPowerPolicy};
pub use mac_address::MacAddress;
pub use output::{EncodeError, Encoding, RecordEncoder};
pub use record::{BeaconRecord, DeviceType, Payload};
pub use session::{Pipeline, SessionError, SessionState, run_session};
pub use transport::{Transport, TransportError, UdpTransport};
