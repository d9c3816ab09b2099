//! Datagram transport to the collector.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use thiserror::Error;
use tokio::net::UdpSocket;

/// Largest payload a single UDP datagram over IPv4 can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Default collector host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default collector port.
pub const DEFAULT_PORT: u16 = 1234;

/// Errors returned by a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket could not be created or bound
    #[error("Failed to create socket: {0}")]
    Setup(#[source] io::Error),
    /// Collector address did not resolve
    #[error("Cannot resolve collector address {0}")]
    Resolve(String),
    /// Payload does not fit one datagram
    #[error("Payload of {0} bytes does not fit a datagram")]
    Oversized(usize),
    /// Sending the datagram failed
    #[error("Transmission failure: {0}")]
    TransmissionFailure(#[source] io::Error),
}

/// Sends one payload per datagram.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;
}

/// UDP transport to a fixed collector address.
///
/// The socket stays unconnected so ICMP port-unreachable replies from a
/// collector that is down are never reported on later sends.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    collector: SocketAddr,
}

impl UdpTransport {
    /// Resolve `host:port` and bind an ephemeral local socket for it.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let target = format!("{host}:{port}");
        let addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|_| TransportError::Resolve(target.clone()))?
            .next()
            .ok_or_else(|| TransportError::Resolve(target.clone()))?;

        let local = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await.map_err(TransportError::Setup)?;

        tracing::debug!(%addr, "UDP transport ready");
        Ok(Self {
            socket,
            collector: addr,
        })
    }
}

impl Transport for UdpTransport {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>> {
        Box::pin(async move {
            if payload.len() > MAX_DATAGRAM_SIZE {
                return Err(TransportError::Oversized(payload.len()));
            }
            self.socket
                .send_to(payload, self.collector)
                .await
                .map_err(TransportError::TransmissionFailure)?;
            Ok(())
        })
    }
}
