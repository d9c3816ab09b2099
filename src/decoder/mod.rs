//! Advertisement decoding pipeline.
//!
//! A raw HCI dump line goes through [`hex::tokenize`], is scanned for known
//! format signatures by [`signature::find_matches`], classified by a
//! configurable priority order and finally handed to the per-format field
//! extractors in [`fields`] and [`uri`].

pub mod fields;
pub mod hex;
pub mod signature;
pub mod uri;

use crate::record::{BeaconRecord, DeviceType, Payload};
use signature::{Family, Match, SIGNATURES, UriAnchor};
use thiserror::Error;

/// Errors produced while decoding a single record.
///
/// All of them are per-record: the session drops the record and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A token was not exactly two hexadecimal digits.
    #[error("Malformed token '{token}' at position {position}")]
    MalformedToken { token: String, position: usize },
    /// The sequence is too short for a required field offset.
    #[error("Offset {offset} out of range for sequence of length {len}")]
    OutOfRange { offset: usize, len: usize },
    /// URI scheme prefix code outside the known table.
    #[error("Unknown URI scheme code {0:#04x}")]
    UnknownScheme(u8),
    /// URL suffix code outside the known table.
    #[error("Unknown URL suffix code {0:#04x}")]
    UnknownSuffix(u8),
}

/// Legacy fixed offset of the TX power byte.
pub const LEGACY_TX_POWER_OFFSET: usize = 26;

/// Where Pebblebee and RuuviTag records read their TX power from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TxPowerPolicy {
    /// Fixed offset 26 regardless of format
    #[default]
    Legacy,
    /// Offset derived from where the format signature matched
    Signature,
}

/// Configurable decoding and forwarding policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderPolicy {
    /// Classification order when more than one signature matches.
    pub priority: Vec<Family>,
    pub tx_power: TxPowerPolicy,
    pub uri_anchor: UriAnchor,
    /// Forward RuuviTag records after classification.
    pub forward_ruuvitag: bool,
    /// Forward records no signature claimed.
    pub forward_unknown: bool,
}

impl Default for DecoderPolicy {
    fn default() -> Self {
        Self {
            priority: Family::DEFAULT_PRIORITY.to_vec(),
            tx_power: TxPowerPolicy::default(),
            uri_anchor: UriAnchor::default(),
            forward_ruuvitag: true,
            forward_unknown: false,
        }
    }
}

impl DecoderPolicy {
    /// Whether a decoded record should be handed to the transport.
    pub fn accepts(&self, record: &BeaconRecord) -> bool {
        match record.device_type() {
            DeviceType::RuuviTag => self.forward_ruuvitag,
            DeviceType::Unknown => self.forward_unknown,
            DeviceType::Pebblebee | DeviceType::UriBeacon => true,
        }
    }
}

/// Stateless per-record decoder.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    policy: DecoderPolicy,
}

impl Decoder {
    pub fn new(policy: DecoderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DecoderPolicy {
        &self.policy
    }

    /// Decode one reassembled dump line into a [`BeaconRecord`].
    pub fn decode(&self, raw: &str, sender: &str) -> Result<BeaconRecord, DecodeError> {
        let bytes = hex::tokenize(raw)?;
        self.decode_bytes(bytes, sender)
    }

    /// Decode an already tokenized byte sequence.
    pub fn decode_bytes(&self, bytes: Vec<u8>, sender: &str) -> Result<BeaconRecord, DecodeError> {
        let matches = signature::find_matches(&bytes, SIGNATURES, self.policy.uri_anchor);
        let family = signature::classify(&matches, &self.policy.priority);

        let mac = fields::mac_address(&bytes)?;
        let rssi = fields::rssi(&bytes)?;

        let (tx_power, payload) = match family.and_then(|f| first_match(&matches, f)) {
            Some(m) => self.extract(&bytes, m)?,
            None => self.unknown(&bytes)?,
        };

        Ok(BeaconRecord {
            mac,
            tx_power,
            rssi,
            sender: sender.to_string(),
            payload,
            bytes,
        })
    }

    fn extract(&self, bytes: &[u8], m: &Match) -> Result<(i8, Payload), DecodeError> {
        match m.family {
            Family::Pebblebee => match fields::pebblebee_button(bytes) {
                Some(button) => {
                    let offset = self.tx_offset(m, 5);
                    Ok((fields::tx_power(bytes, offset)?, Payload::Pebblebee { button }))
                }
                None => self.unknown(bytes),
            },
            Family::RuuviTag => {
                // Eddystone-URL: TX byte, scheme byte, then the URL text.
                let offset = match self.policy.tx_power {
                    TxPowerPolicy::Legacy => LEGACY_TX_POWER_OFFSET,
                    TxPowerPolicy::Signature => m.start.checked_sub(2).ok_or(
                        DecodeError::OutOfRange {
                            offset: m.start,
                            len: bytes.len(),
                        },
                    )?,
                };
                let data = fields::ruuvi_data(bytes, m.end());
                Ok((fields::tx_power(bytes, offset)?, Payload::RuuviTag { data }))
            }
            Family::UriBeacon => {
                let block_start = m.end();
                let ad_length = *bytes.get(block_start).ok_or(DecodeError::OutOfRange {
                    offset: block_start,
                    len: bytes.len(),
                })?;
                let url = uri::decode_uri(bytes, block_start, usize::from(ad_length))?;
                let tx_power = fields::tx_power(bytes, block_start + 5)?;
                Ok((tx_power, Payload::UriBeacon { url }))
            }
        }
    }

    fn unknown(&self, bytes: &[u8]) -> Result<(i8, Payload), DecodeError> {
        let tx_power = fields::tx_power(bytes, LEGACY_TX_POWER_OFFSET)?;
        Ok((
            tx_power,
            Payload::Unknown {
                raw: bytes.to_vec(),
            },
        ))
    }

    fn tx_offset(&self, m: &Match, relative: usize) -> usize {
        match self.policy.tx_power {
            TxPowerPolicy::Legacy => LEGACY_TX_POWER_OFFSET,
            TxPowerPolicy::Signature => m.start + relative,
        }
    }
}

fn first_match(matches: &[Match], family: Family) -> Option<&Match> {
    matches.iter().find(|m| m.family == family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        PEBBLEBEE_LINE, RUUVITAG_LINE, URIBEACON_FLAGGED_LINE, URIBEACON_LINE,
    };

    #[test]
    fn test_decode_pebblebee() {
        let record = Decoder::default().decode(PEBBLEBEE_LINE, "7").unwrap();
        assert_eq!(record.device_type(), DeviceType::Pebblebee);
        assert_eq!(record.mac.to_string(), "0C:0B:0A:09:08:07");
        assert_eq!(record.payload, Payload::Pebblebee { button: 0 });
        assert_eq!(record.tx_power, 14);
        assert_eq!(record.rssi, -75);
        assert_eq!(record.sender, "7");
        assert_eq!(record.bytes.len(), 35);
    }

    #[test]
    fn test_decode_pebblebee_signature_tx_power() {
        let policy = DecoderPolicy {
            tx_power: TxPowerPolicy::Signature,
            ..DecoderPolicy::default()
        };
        let record = Decoder::new(policy).decode(PEBBLEBEE_LINE, "7").unwrap();
        assert_eq!(record.tx_power, 6);
    }

    #[test]
    fn test_decode_pebblebee_invalid_button_is_unknown() {
        // third-from-last byte 0x00 -> 0x02
        let line = PEBBLEBEE_LINE.replace("04 00 55 B5", "04 02 55 B5");
        let record = Decoder::default().decode(&line, "7").unwrap();
        assert_eq!(record.device_type(), DeviceType::Unknown);
        assert!(!Decoder::default().policy().accepts(&record));
    }

    #[test]
    fn test_decode_uribeacon() {
        let record = Decoder::default().decode(URIBEACON_LINE, "node-1").unwrap();
        assert_eq!(record.device_type(), DeviceType::UriBeacon);
        assert_eq!(record.mac.to_string(), "00:02:5B:03:E3:E3");
        assert_eq!(
            record.payload,
            Payload::UriBeacon {
                url: "http://csr.com".to_string()
            }
        );
        assert_eq!(record.tx_power, 20);
        assert_eq!(record.rssi, -89);
    }

    #[test]
    fn test_decode_uribeacon_with_flags_needs_scan_anchor() {
        let fixed = Decoder::default().decode(URIBEACON_FLAGGED_LINE, "n").unwrap();
        assert_eq!(fixed.device_type(), DeviceType::Unknown);

        let policy = DecoderPolicy {
            uri_anchor: UriAnchor::Scan,
            ..DecoderPolicy::default()
        };
        let record = Decoder::new(policy).decode(URIBEACON_FLAGGED_LINE, "n").unwrap();
        assert_eq!(
            record.payload,
            Payload::UriBeacon {
                url: "http://csr.com".to_string()
            }
        );
        assert_eq!(record.tx_power, 20);
    }

    #[test]
    fn test_decode_uribeacon_unknown_scheme() {
        let line = URIBEACON_LINE.replace("00 14 02 63", "00 14 09 63");
        assert_eq!(
            Decoder::default().decode(&line, "n"),
            Err(DecodeError::UnknownScheme(0x09))
        );
    }

    #[test]
    fn test_decode_uribeacon_corrupt_block_length() {
        // service data length 0D -> 03, shorter than the block header
        let line = URIBEACON_LINE.replace("FE 0D", "FE 03");
        assert_eq!(
            Decoder::default().decode(&line, "n"),
            Err(DecodeError::OutOfRange { offset: 24, len: 33 })
        );
    }

    #[test]
    fn test_decode_ruuvitag() {
        let record = Decoder::default().decode(RUUVITAG_LINE, "n").unwrap();
        assert_eq!(record.device_type(), DeviceType::RuuviTag);
        assert_eq!(record.mac.to_string(), "66:55:44:33:22:11");
        assert_eq!(
            record.payload,
            Payload::RuuviTag {
                data: "BEAXAMgA".to_string()
            }
        );
        assert_eq!(record.tx_power, -21);
        assert_eq!(record.rssi, -61);
    }

    #[test]
    fn test_ruuvitag_forwarding_policy() {
        let record = Decoder::default().decode(RUUVITAG_LINE, "n").unwrap();
        assert!(DecoderPolicy::default().accepts(&record));

        let dropping = DecoderPolicy {
            forward_ruuvitag: false,
            ..DecoderPolicy::default()
        };
        assert!(!dropping.accepts(&record));
    }

    #[test]
    fn test_ruuvitag_signature_tx_power_matches_legacy() {
        let policy = DecoderPolicy {
            tx_power: TxPowerPolicy::Signature,
            ..DecoderPolicy::default()
        };
        let record = Decoder::new(policy).decode(RUUVITAG_LINE, "n").unwrap();
        assert_eq!(record.tx_power, -21);
    }

    #[test]
    fn test_priority_prefers_pebblebee_over_ruuvitag() {
        let mut bytes = hex::tokenize(RUUVITAG_LINE).unwrap();
        let rssi = bytes.pop().unwrap();
        bytes.extend_from_slice(&[0x19, 0x00, 0x02, 0x02, 0x0A, 0x06, 0x09, 0xFF]);
        bytes.extend_from_slice(&[0x01, 0x00, rssi]);

        let record = Decoder::default().decode_bytes(bytes.clone(), "n").unwrap();
        assert_eq!(record.payload, Payload::Pebblebee { button: 1 });

        let policy = DecoderPolicy {
            priority: vec![Family::RuuviTag, Family::Pebblebee, Family::UriBeacon],
            ..DecoderPolicy::default()
        };
        let record = Decoder::new(policy).decode_bytes(bytes, "n").unwrap();
        assert_eq!(record.device_type(), DeviceType::RuuviTag);
    }

    #[test]
    fn test_decode_malformed_token() {
        let line = PEBBLEBEE_LINE.replace("0A 0B", "0A GZ");
        assert_eq!(
            Decoder::default().decode(&line, "n"),
            Err(DecodeError::MalformedToken {
                token: "GZ".to_string(),
                position: 11
            })
        );
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(
            Decoder::default().decode("> 04 3E 0C", "n"),
            Err(DecodeError::OutOfRange { offset: 12, len: 3 })
        );
    }

    #[test]
    fn test_unknown_record() {
        let line = "> 04 3E 1A 02 01 00 00 01 02 03 04 05 06 0E 02 01 06 0A 09 \
                    41 42 43 44 45 46 47 48 49 BB";
        let record = Decoder::default().decode(line, "n").unwrap();
        assert_eq!(record.device_type(), DeviceType::Unknown);
        assert_eq!(record.tx_power, 0x48);
        match &record.payload {
            Payload::Unknown { raw } => assert_eq!(raw, &record.bytes),
            other => panic!("unexpected payload {other:?}"),
        }
        let forwarding = DecoderPolicy {
            forward_unknown: true,
            ..DecoderPolicy::default()
        };
        assert!(forwarding.accepts(&record));
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::MalformedToken {
            token: "GZ".to_string(),
            position: 3,
        };
        assert_eq!(format!("{}", err), "Malformed token 'GZ' at position 3");

        let err = DecodeError::OutOfRange { offset: 26, len: 20 };
        assert_eq!(
            format!("{}", err),
            "Offset 26 out of range for sequence of length 20"
        );

        assert_eq!(
            format!("{}", DecodeError::UnknownScheme(5)),
            "Unknown URI scheme code 0x05"
        );
    }
}
