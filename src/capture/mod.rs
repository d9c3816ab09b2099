//! Capture sources producing raw advertisement records.
//!
//! Every source yields one complete record per packet in `hcidump --raw`
//! form (`> 04 3E ...`), ready for the tokenizer.

pub mod hcidump;

#[cfg(feature = "hci")]
pub mod hci;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;

/// Channel buffer size for raw records.
pub const RECORD_CHANNEL_BUFFER_SIZE: usize = 100;

/// Default capture command for the hcidump backend.
pub const DEFAULT_CAPTURE_COMMAND: &str = "hcidump --raw";

/// Errors returned while starting a capture source.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The capture command could not be spawned
    #[error("Failed to start capture command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Capture command is empty")]
    EmptyCommand,
    /// HCI socket setup failed
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
}

/// Available capture backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// Spawn a capture command and reassemble its hex dump output
    #[default]
    Hcidump,
    /// Raw HCI socket (direct kernel access, needs CAP_NET_RAW)
    #[cfg(feature = "hci")]
    Hci,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Hcidump => write!(f, "hcidump"),
            #[cfg(feature = "hci")]
            Backend::Hci => write!(f, "hci"),
        }
    }
}

/// Capture configuration shared by all backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub backend: Backend,
    /// Command line for the hcidump backend
    pub command: String,
    /// HCI device index for the hci backend
    pub device: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            command: DEFAULT_CAPTURE_COMMAND.to_string(),
            device: 0,
        }
    }
}

/// Source abstraction so the session loop can run without Bluetooth hardware.
pub trait Source: Send + Sync {
    fn start(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<String>, CaptureError>> + Send + '_>>;
}

/// Source backed by the compiled-in capture backends.
#[derive(Debug, Clone, Default)]
pub struct SystemSource {
    config: CaptureConfig,
}

impl SystemSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

impl Source for SystemSource {
    fn start(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<String>, CaptureError>> + Send + '_>>
    {
        Box::pin(async move {
            match self.config.backend {
                Backend::Hcidump => hcidump::start_capture(&self.config.command).await,
                #[cfg(feature = "hci")]
                Backend::Hci => hci::start_capture(self.config.device).await,
            }
        })
    }
}
