//! TCP transport to the host.
//!
//! The host listens on loopback; the worker dials out once at startup and never
//! reconnects.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpStream;

/// Host address for the given port. Always loopback.
pub fn host_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// Connect to the host on `127.0.0.1:{port}`.
pub async fn connect(port: u16) -> io::Result<TcpStream> {
    let addr = host_addr(port);
    tracing::debug!(%addr, "Connecting to host");
    let stream = TcpStream::connect(addr).await?;
    // Response frames are small and latency bound.
    stream.set_nodelay(true)?;
    tracing::trace!(local = ?stream.local_addr().ok(), %addr, "Connected");
    Ok(stream)
}
