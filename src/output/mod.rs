//! Record encoders.
//!
//! A [`RecordEncoder`] turns a decoded record into one datagram payload. The
//! length-prefixed [`envelope`] is the default wire format; [`json`] is the
//! structured-text alternative older collectors expect.

pub mod envelope;
pub mod json;

use crate::record::BeaconRecord;
use thiserror::Error;

/// Errors returned while encoding a record.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A length-prefixed section does not fit its 16-bit length field
    #[error("{section} is {len} bytes, at most {max} fit in an envelope")]
    TooLarge {
        section: &'static str,
        len: usize,
        max: usize,
    },
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes a decoded record into a transport payload.
pub trait RecordEncoder: Send + Sync {
    fn encode(&self, record: &BeaconRecord) -> Result<Vec<u8>, EncodeError>;
}

/// Available wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Encoding {
    /// Length-prefixed sender + raw advertisement bytes
    #[default]
    Envelope,
    /// Self-describing JSON object
    Json,
}

impl Encoding {
    pub fn encoder(self) -> Box<dyn RecordEncoder> {
        match self {
            Encoding::Envelope => Box::new(envelope::EnvelopeEncoder),
            Encoding::Json => Box::new(json::JsonEncoder),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Envelope => write!(f, "envelope"),
            Encoding::Json => write!(f, "json"),
        }
    }
}
