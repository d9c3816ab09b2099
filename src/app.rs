//! Command-line configuration and the top-level run loop.
//!
//! Kept apart from `main.rs` so option handling can be tested without a
//! process, a Bluetooth controller or a collector.

use crate::capture::{Backend, CaptureConfig, DEFAULT_CAPTURE_COMMAND, SystemSource};
use crate::decoder::signature::{Family, UriAnchor};
use crate::decoder::{Decoder, DecoderPolicy, TxPowerPolicy};
use crate::output::Encoding;
use crate::sender::{SenderError, SenderSource, resolve_sender};
use crate::session::{Pipeline, SessionError, SessionState, run_session};
use crate::transport::{DEFAULT_HOST, DEFAULT_PORT, TransportError, UdpTransport};
use clap::Parser;
use thiserror::Error;

/// Collect BLE beacon advertisements and forward them to a collector.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Collector host
    #[arg(short = 'H', long, env = "BEACON_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Collector UDP port
    #[arg(short = 'p', long, env = "BEACON_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Sender identifier reported with every record
    #[arg(short = 's', long, env = "BEACON_SENDER")]
    pub sender: Option<String>,

    /// Use the hardware address of this network interface as sender identifier
    #[arg(long, env = "BEACON_SENDER_INTERFACE", conflicts_with = "sender")]
    pub sender_interface: Option<String>,

    /// Wire encoding of forwarded records
    #[arg(long, env = "BEACON_ENCODING", default_value_t, value_enum)]
    pub encoding: Encoding,

    /// Capture backend
    #[arg(long, env = "BEACON_BACKEND", default_value_t, value_enum)]
    pub backend: Backend,

    /// Command whose output is parsed by the hcidump backend
    #[arg(long, env = "BEACON_CAPTURE_COMMAND", default_value = DEFAULT_CAPTURE_COMMAND)]
    pub capture_command: String,

    /// HCI device index for the hci backend
    #[arg(long, default_value_t = 0)]
    pub hci_device: u16,

    /// Stop after this many captured records
    #[arg(short = 'n', long)]
    pub max_records: Option<u64>,

    /// Classification order when several signatures match
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = Family::DEFAULT_PRIORITY
    )]
    pub priority: Vec<Family>,

    /// Where Pebblebee and RuuviTag TX power is read from
    #[arg(long, default_value_t, value_enum)]
    pub tx_power: TxPowerPolicy,

    /// How the UriBeacon service list is located
    #[arg(long, default_value_t, value_enum)]
    pub uri_anchor: UriAnchor,

    /// Decode RuuviTag advertisements but do not forward them
    #[arg(long)]
    pub drop_ruuvitag: bool,

    /// Forward advertisements no signature matched
    #[arg(long)]
    pub forward_unknown: bool,

    /// Log an RSSI distance estimate for every forwarded record
    #[arg(long)]
    pub log_distance: bool,

    /// Verbose output, log dropped records with their contents
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    pub fn sender_source(&self) -> SenderSource {
        match (&self.sender, &self.sender_interface) {
            (Some(id), _) => SenderSource::Explicit(id.clone()),
            (None, Some(name)) => SenderSource::Interface(name.clone()),
            (None, None) => SenderSource::Auto,
        }
    }

    pub fn decoder_policy(&self) -> DecoderPolicy {
        DecoderPolicy {
            priority: self.priority.clone(),
            tx_power: self.tx_power,
            uri_anchor: self.uri_anchor,
            forward_ruuvitag: !self.drop_ruuvitag,
            forward_unknown: self.forward_unknown,
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            backend: self.backend,
            command: self.capture_command.clone(),
            device: self.hci_device,
        }
    }

    /// Build the per-session pipeline for an already resolved sender.
    pub fn pipeline(&self, sender: String) -> Pipeline {
        let mut pipeline = Pipeline::new(
            Decoder::new(self.decoder_policy()),
            self.encoding.encoder(),
            sender,
        );
        pipeline.log_distance = self.log_distance;
        pipeline.verbose = self.verbose;
        pipeline
    }
}

/// Errors returned by the top-level run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("No sender identifier: {0}")]
    Sender(#[from] SenderError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Resolve the sender, connect to the collector and run one session.
///
/// Returns the final session state; Ctrl-C ends the session cleanly.
pub async fn run(options: Options) -> Result<SessionState, RunError> {
    let sender = resolve_sender(&options.sender_source())?;
    let transport = UdpTransport::connect(&options.host, options.port).await?;
    let source = SystemSource::new(options.capture_config());

    tracing::info!(
        collector = %format!("{}:{}", options.host, options.port),
        %sender,
        encoding = %options.encoding,
        backend = %options.backend,
        "Forwarding beacon records"
    );

    let pipeline = options.pipeline(sender);
    let mut state = SessionState::new(options.max_records);

    tokio::select! {
        result = run_session(&pipeline, &source, &transport, &mut state) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupt caught"),
    }

    Ok(state)
}
