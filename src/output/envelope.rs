//! Length-prefixed binary envelope.
//!
//! ```text
//! +-------------+--------------+--------------+---------------+
//! | u16 LE      | sender bytes | u16 LE       | payload bytes |
//! | sender len  |              | payload len  |               |
//! +-------------+--------------+--------------+---------------+
//! ```
//!
//! The payload is the raw advertisement byte sequence; the collector runs its
//! own decoder over it. There is no checksum and no fragmentation.

use super::{EncodeError, RecordEncoder};
use crate::record::BeaconRecord;
use thiserror::Error;

/// Size of each length prefix.
pub const LENGTH_PREFIX: usize = 2;

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    pub payload: Vec<u8>,
}

/// Errors returned when parsing an envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Envelope truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    #[error("Envelope has {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("Envelope sender is not valid UTF-8")]
    InvalidSender,
}

fn section_len(section: &'static str, len: usize) -> Result<[u8; 2], EncodeError> {
    u16::try_from(len)
        .map(u16::to_le_bytes)
        .map_err(|_| EncodeError::TooLarge {
            section,
            len,
            max: usize::from(u16::MAX),
        })
}

/// Frame `sender` and `payload` into one envelope.
pub fn encode_envelope(sender: &str, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let sender_len = section_len("sender", sender.len())?;
    let payload_len = section_len("payload", payload.len())?;

    let mut frame = Vec::with_capacity(2 * LENGTH_PREFIX + sender.len() + payload.len());
    frame.extend_from_slice(&sender_len);
    frame.extend_from_slice(sender.as_bytes());
    frame.extend_from_slice(&payload_len);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read one length-prefixed section starting at `offset`.
fn read_section(frame: &[u8], offset: usize) -> Result<(&[u8], usize), EnvelopeError> {
    let truncated = |needed| EnvelopeError::Truncated {
        needed,
        got: frame.len(),
    };

    let prefix_end = offset + LENGTH_PREFIX;
    let prefix = frame.get(offset..prefix_end).ok_or(truncated(prefix_end))?;
    let len = usize::from(u16::from_le_bytes([prefix[0], prefix[1]]));

    let end = prefix_end + len;
    let section = frame.get(prefix_end..end).ok_or(truncated(end))?;
    Ok((section, end))
}

/// Parse an envelope produced by [`encode_envelope`].
pub fn decode_envelope(frame: &[u8]) -> Result<Envelope, EnvelopeError> {
    let (sender, offset) = read_section(frame, 0)?;
    let (payload, end) = read_section(frame, offset)?;

    if end != frame.len() {
        return Err(EnvelopeError::TrailingBytes(frame.len() - end));
    }

    let sender = std::str::from_utf8(sender).map_err(|_| EnvelopeError::InvalidSender)?;
    Ok(Envelope {
        sender: sender.to_string(),
        payload: payload.to_vec(),
    })
}

/// Encodes records as envelopes carrying the raw advertisement bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeEncoder;

impl RecordEncoder for EnvelopeEncoder {
    fn encode(&self, record: &BeaconRecord) -> Result<Vec<u8>, EncodeError> {
        encode_envelope(&record.sender, &record.bytes)
    }
}
