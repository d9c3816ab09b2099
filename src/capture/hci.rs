//! Raw HCI socket capture.
//!
//! Reads LE advertising report events straight from the kernel without
//! hcidump or the BlueZ daemon, and renders each event in the same raw dump
//! form hcidump prints. Needs CAP_NET_RAW and CAP_NET_ADMIN (or root).

use super::{CaptureError, RECORD_CHANNEL_BUFFER_SIZE};
use crate::decoder::hex::format_record;
use libc::{AF_BLUETOOTH, SOCK_CLOEXEC, SOCK_NONBLOCK, SOCK_RAW, c_int, c_void, sockaddr, socklen_t};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc;

const BTPROTO_HCI: c_int = 1;
const SOL_HCI: c_int = 0;
const HCI_FILTER: c_int = 2;
const HCI_CHANNEL_RAW: u16 = 0;

const HCI_COMMAND_PKT: u8 = 0x01;
const HCI_EVENT_PKT: u8 = 0x04;
const EVT_LE_META_EVENT: u8 = 0x3E;
const EVT_LE_ADVERTISING_REPORT: u8 = 0x02;

const OGF_LE_CTL: u16 = 0x08;
const OCF_LE_SET_SCAN_PARAMETERS: u16 = 0x000B;
const OCF_LE_SET_SCAN_ENABLE: u16 = 0x000C;

/// Largest HCI event: 3 byte header plus 255 parameter bytes.
const MAX_EVENT_SIZE: usize = 258;

#[repr(C)]
struct SockaddrHci {
    hci_family: u16,
    hci_dev: u16,
    hci_channel: u16,
}

/// Kernel-side packet filter for raw HCI sockets.
#[repr(C)]
#[derive(Debug, Default, PartialEq)]
struct HciFilter {
    type_mask: u32,
    event_mask: [u32; 2],
    opcode: u16,
}

impl HciFilter {
    /// Pass only LE meta events.
    fn le_meta_events() -> Self {
        let mut filter = Self::default();
        filter.type_mask |= 1 << u32::from(HCI_EVENT_PKT);
        let bit = usize::from(EVT_LE_META_EVENT);
        filter.event_mask[bit / 32] |= 1 << (bit % 32);
        filter
    }
}

/// Build an HCI command packet.
fn command_packet(ogf: u16, ocf: u16, params: &[u8]) -> Vec<u8> {
    let opcode = (ogf << 10) | ocf;
    let mut packet = Vec::with_capacity(4 + params.len());
    packet.push(HCI_COMMAND_PKT);
    packet.extend_from_slice(&opcode.to_le_bytes());
    packet.push(params.len() as u8);
    packet.extend_from_slice(params);
    packet
}

/// Passive scan, 10 ms interval and window, public address, accept all.
fn scan_parameters() -> Vec<u8> {
    let interval: u16 = 0x0010;
    let window: u16 = 0x0010;
    let mut params = vec![0x00];
    params.extend_from_slice(&interval.to_le_bytes());
    params.extend_from_slice(&window.to_le_bytes());
    params.extend_from_slice(&[0x00, 0x00]);
    command_packet(OGF_LE_CTL, OCF_LE_SET_SCAN_PARAMETERS, &params)
}

/// Enable scanning without duplicate filtering.
fn scan_enable() -> Vec<u8> {
    command_packet(OGF_LE_CTL, OCF_LE_SET_SCAN_ENABLE, &[0x01, 0x00])
}

/// Whether a raw event buffer is an LE advertising report.
fn is_advertising_report(event: &[u8]) -> bool {
    event.len() >= 4
        && event[0] == HCI_EVENT_PKT
        && event[1] == EVT_LE_META_EVENT
        && event[3] == EVT_LE_ADVERTISING_REPORT
}

fn os_error(context: &str) -> CaptureError {
    CaptureError::Bluetooth(format!("{context}: {}", io::Error::last_os_error()))
}

/// A raw HCI socket bound to one controller.
struct HciSocket {
    fd: OwnedFd,
}

impl HciSocket {
    fn open(device: u16) -> Result<Self, CaptureError> {
        // SAFETY: plain socket(2) call; the result is checked before use.
        let raw = unsafe {
            libc::socket(
                AF_BLUETOOTH,
                SOCK_RAW | SOCK_CLOEXEC | SOCK_NONBLOCK,
                BTPROTO_HCI,
            )
        };
        if raw < 0 {
            return Err(os_error("Failed to create HCI socket"));
        }
        // SAFETY: `raw` is a freshly created descriptor nobody else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as u16,
            hci_dev: device,
            hci_channel: HCI_CHANNEL_RAW,
        };
        // SAFETY: `addr` is a valid sockaddr_hci for the given length.
        let ret = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const SockaddrHci as *const sockaddr,
                mem::size_of::<SockaddrHci>() as socklen_t,
            )
        };
        if ret < 0 {
            return Err(os_error(&format!("Failed to bind HCI socket to hci{device}")));
        }

        Ok(Self { fd })
    }

    fn set_filter(&self, filter: &HciFilter) -> Result<(), CaptureError> {
        // SAFETY: `filter` is a valid hci_filter for the given length.
        let ret = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                SOL_HCI,
                HCI_FILTER,
                filter as *const HciFilter as *const c_void,
                mem::size_of::<HciFilter>() as socklen_t,
            )
        };
        if ret < 0 {
            return Err(os_error("Failed to set HCI filter"));
        }
        Ok(())
    }

    fn send(&self, packet: &[u8]) -> Result<(), CaptureError> {
        // SAFETY: `packet` is valid for `packet.len()` bytes.
        let ret = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                packet.as_ptr() as *const c_void,
                packet.len(),
            )
        };
        if ret < 0 {
            return Err(os_error("Failed to send HCI command"));
        }
        Ok(())
    }
}

fn read_event(fd: &OwnedFd, buf: &mut [u8]) -> io::Result<usize> {
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let ret = unsafe { libc::read(fd.as_raw_fd(), buf.as_mut_ptr() as *mut c_void, buf.len()) };
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret as usize)
    }
}

/// Start a passive LE scan on `hci<device>` and stream advertising events as records.
pub async fn start_capture(device: u16) -> Result<mpsc::Receiver<String>, CaptureError> {
    let events = HciSocket::open(device)?;
    events.set_filter(&HciFilter::le_meta_events())?;

    let control = HciSocket::open(device)?;
    control.send(&scan_parameters())?;
    control.send(&scan_enable())?;

    let async_fd = AsyncFd::new(events.fd)
        .map_err(|e| CaptureError::Bluetooth(format!("Failed to register HCI socket: {e}")))?;

    tracing::info!(device = %format!("hci{device}"), "HCI capture started");

    let (tx, rx) = mpsc::channel(RECORD_CHANNEL_BUFFER_SIZE);
    tokio::spawn(async move {
        let _control = control;
        let mut buf = [0u8; MAX_EVENT_SIZE];

        loop {
            let mut guard = match async_fd.readable().await {
                Ok(guard) => guard,
                Err(error) => {
                    tracing::warn!(%error, "HCI socket no longer readable");
                    return;
                }
            };

            // Drain everything queued before waiting again.
            loop {
                let n = match guard.try_io(|inner| read_event(inner.get_ref(), &mut buf)) {
                    Ok(Ok(n)) if n > 0 => n,
                    Ok(Ok(_)) => return,
                    Ok(Err(error)) => {
                        tracing::warn!(%error, "HCI read failed");
                        return;
                    }
                    Err(_would_block) => break,
                };

                if is_advertising_report(&buf[..n])
                    && tx.send(format_record(&buf[..n])).await.is_err()
                {
                    return;
                }
            }
        }
    });

    Ok(rx)
}
