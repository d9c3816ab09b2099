//! Sender identity of the forwarding node.
//!
//! The identifier is resolved once before the first record is sent and stays
//! fixed for the whole session.

use crate::mac_address::MacAddress;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where network interfaces are listed on Linux.
pub const SYSFS_NET: &str = "/sys/class/net";

/// How to obtain the sender identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderSource {
    /// User-supplied identifier
    Explicit(String),
    /// Hardware address of a named network interface
    Interface(String),
    /// Hardware address of the first usable network interface
    Auto,
}

/// Errors returned when no sender identifier is available.
#[derive(Error, Debug, PartialEq)]
pub enum SenderError {
    #[error("Sender identifier must not be empty")]
    Empty,
    #[error("Cannot read hardware address of interface '{0}'")]
    Interface(String),
    #[error("No network interface with a hardware address found")]
    NoInterface,
}

/// Resolve the sender identifier from the system network interfaces.
pub fn resolve_sender(source: &SenderSource) -> Result<String, SenderError> {
    resolve_sender_in(source, Path::new(SYSFS_NET))
}

/// Like [`resolve_sender`], reading interfaces below `net_root`.
pub fn resolve_sender_in(source: &SenderSource, net_root: &Path) -> Result<String, SenderError> {
    match source {
        SenderSource::Explicit(id) => {
            let id = id.trim();
            if id.is_empty() {
                Err(SenderError::Empty)
            } else {
                Ok(id.to_string())
            }
        }
        SenderSource::Interface(name) => interface_address(net_root, name)
            .map(|mac| mac.to_string())
            .ok_or_else(|| SenderError::Interface(name.clone())),
        SenderSource::Auto => {
            let mut names: Vec<String> = fs::read_dir(net_root)
                .map_err(|_| SenderError::NoInterface)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name != "lo")
                .collect();
            names.sort();

            names
                .iter()
                .find_map(|name| {
                    let mac = interface_address(net_root, name)?;
                    tracing::debug!(interface = %name, %mac, "Using interface address as sender");
                    Some(mac.to_string())
                })
                .ok_or(SenderError::NoInterface)
        }
    }
}

/// Non-zero hardware address of `name`, if it has one.
fn interface_address(net_root: &Path, name: &str) -> Option<MacAddress> {
    let path: PathBuf = net_root.join(name).join("address");
    let mac: MacAddress = fs::read_to_string(path).ok()?.parse().ok()?;
    (mac != MacAddress::default()).then_some(mac)
}
