//! Capture through an `hcidump --raw` style subprocess.
//!
//! hcidump prints each packet as a `>` (incoming) or `<` (outgoing) line
//! followed by indented continuation lines:
//!
//! ```text
//! > 04 3E 21 02 01 00 00 E3 E3 03 5B 02 00 15 02 01 1A 03 03 D8
//!   FE 0D 16 D8 FE 00 14 02 63 73 72 2E 63 6F 6D A7
//! ```
//!
//! [`Reassembler`] joins those into one record per incoming packet.

use super::{CaptureError, RECORD_CHANNEL_BUFFER_SIZE};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Joins hcidump output lines into complete records.
#[derive(Debug, Default)]
pub struct Reassembler {
    current: Option<String>,
    /// Inside an outgoing packet whose lines are discarded.
    skipping: bool,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one output line; returns a record when `line` completes the previous one.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.starts_with('>') {
            self.skipping = false;
            self.current.replace(line.trim().to_string())
        } else if line.starts_with('<') {
            self.skipping = true;
            self.current.take()
        } else if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            if let (Some(current), false) = (self.current.as_mut(), self.skipping) {
                current.push(' ');
                current.push_str(line.trim());
            }
            None
        } else {
            // Banner and status lines ("HCI sniffer - ...") end nothing.
            None
        }
    }

    /// Flush the pending record at end of input.
    pub fn finish(&mut self) -> Option<String> {
        self.skipping = false;
        self.current.take()
    }
}

/// Spawn `command` and stream reassembled records from its stdout.
///
/// The child is killed as soon as the receiver is dropped, even while it is
/// not printing anything.
pub async fn start_capture(command: &str) -> Result<mpsc::Receiver<String>, CaptureError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(CaptureError::EmptyCommand)?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CaptureError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let stdout = child.stdout.take().ok_or_else(|| CaptureError::Spawn {
        command: command.to_string(),
        source: std::io::Error::other("stdout not captured"),
    })?;

    tracing::info!(%command, "Capture started");

    let (tx, rx) = mpsc::channel(RECORD_CHANNEL_BUFFER_SIZE);
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        let mut reassembler = Reassembler::new();

        loop {
            let next = tokio::select! {
                next = lines.next_line() => next,
                _ = tx.closed() => {
                    tracing::debug!("Record receiver dropped, stopping capture");
                    return;
                }
            };
            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(%error, "Reading capture output failed");
                    break;
                }
            };
            if let Some(record) = reassembler.push_line(&line)
                && tx.send(record).await.is_err()
            {
                return;
            }
        }

        if let Some(record) = reassembler.finish() {
            let _ = tx.send(record).await;
        }

        match child.wait().await {
            Ok(status) => tracing::info!(%status, "Capture command exited"),
            Err(error) => tracing::warn!(%error, "Capture command did not exit cleanly"),
        }
    });

    Ok(rx)
}
