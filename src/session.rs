//! Acquisition session: pull raw records, decode, encode, send.
//!
//! The decode path is stateless; everything that spans records lives in a
//! caller-owned [`SessionState`].

use crate::capture::{CaptureError, Source};
use crate::decoder::{DecodeError, Decoder};
use crate::distance::{self, REFERENCE_POWER_1M};
use crate::output::{EncodeError, RecordEncoder};
use crate::transport::{Transport, TransportError};
use thiserror::Error;

/// Counters and limit for one acquisition session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Stop after this many raw records
    pub limit: Option<u64>,
    pub seen: u64,
    pub forwarded: u64,
    /// Decoded but not forwarded by policy
    pub filtered: u64,
    /// Failed to decode or encode
    pub dropped: u64,
}

impl SessionState {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.limit.is_some_and(|limit| self.seen >= limit)
    }
}

/// Per-record failure; the session drops the record and continues.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Errors that end a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Decoder, encoder and sender identity fixed for a session.
pub struct Pipeline {
    decoder: Decoder,
    encoder: Box<dyn RecordEncoder>,
    sender: String,
    /// Log an RSSI distance estimate for each forwarded record
    pub log_distance: bool,
    /// Report dropped records at warn instead of debug level
    pub verbose: bool,
}

impl Pipeline {
    pub fn new(decoder: Decoder, encoder: Box<dyn RecordEncoder>, sender: String) -> Self {
        Self {
            decoder,
            encoder,
            sender,
            log_distance: false,
            verbose: false,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Decode and encode one raw record.
    ///
    /// `Ok(None)` means the record decoded but the policy does not forward it.
    pub fn process(&self, raw: &str) -> Result<Option<Vec<u8>>, RecordError> {
        let record = self.decoder.decode(raw, &self.sender)?;
        let device_type = record.device_type();

        if !self.decoder.policy().accepts(&record) {
            tracing::trace!(%device_type, mac = %record.mac, "Record filtered by policy");
            return Ok(None);
        }

        if self.log_distance {
            tracing::debug!(
                mac = %record.mac,
                rssi = record.rssi,
                distance_m = distance::estimate(record.rssi, REFERENCE_POWER_1M),
                "Distance estimate"
            );
        }

        tracing::debug!(
            %device_type,
            mac = %record.mac,
            tx_power = record.tx_power,
            rssi = record.rssi,
            "Decoded record"
        );
        Ok(Some(self.encoder.encode(&record)?))
    }
}

/// Run the session until the source closes or `state.limit` is reached.
///
/// Decode and encode failures are logged and counted; a transport failure is
/// returned to the caller.
pub async fn run_session(
    pipeline: &Pipeline,
    source: &dyn Source,
    transport: &dyn Transport,
    state: &mut SessionState,
) -> Result<(), SessionError> {
    let mut records = source.start().await?;

    while !state.is_finished() {
        let Some(raw) = records.recv().await else {
            break;
        };
        state.seen += 1;

        match pipeline.process(&raw) {
            Ok(Some(payload)) => {
                transport.send(&payload).await?;
                state.forwarded += 1;
            }
            Ok(None) => state.filtered += 1,
            Err(error) => {
                state.dropped += 1;
                if pipeline.verbose {
                    tracing::warn!(%error, record = %raw, "Dropped record");
                } else {
                    tracing::debug!(%error, "Dropped record");
                }
            }
        }
    }

    tracing::info!(
        seen = state.seen,
        forwarded = state.forwarded,
        filtered = state.filtered,
        dropped = state.dropped,
        "Session finished"
    );
    Ok(())
}
