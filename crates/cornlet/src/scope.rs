//! Request decoding: wire payload to [`Scope`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Serialize;

use crate::bridge::protocol::RequestDescriptor;
use crate::version::ProtocolVersion;

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_PATH: &str = "/";

/// Placeholder addresses; the host does not forward real peer information.
pub const SERVER_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000);
pub const CLIENT_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid request payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only execution context handed to the application for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub asgi: ProtocolVersion,
    pub http_version: &'static str,
    pub server: SocketAddr,
    pub client: SocketAddr,
    pub scheme: &'static str,
    pub method: String,
    pub path: String,
    pub raw_path: Vec<u8>,
    pub query_string: Vec<u8>,
    /// Names lower-cased, order preserved.
    pub headers: Vec<(String, String)>,
}

impl Scope {
    pub fn from_descriptor(desc: RequestDescriptor) -> Self {
        let method = desc.method.unwrap_or_else(|| DEFAULT_METHOD.to_string());
        let path = desc.path.unwrap_or_else(|| DEFAULT_PATH.to_string());
        let headers = desc
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect();

        Self {
            kind: "http",
            asgi: ProtocolVersion::CURRENT,
            http_version: "1.1",
            server: SERVER_ADDR,
            client: CLIENT_ADDR,
            scheme: "http",
            raw_path: path.as_bytes().to_vec(),
            method,
            path,
            query_string: Vec::new(),
            headers,
        }
    }

    /// First header value with the given (lower-case) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode a JSON request payload into a [`Scope`].
pub fn decode(payload: &[u8]) -> Result<Scope, DecodeError> {
    let desc: RequestDescriptor = serde_json::from_slice(payload)?;
    Ok(Scope::from_descriptor(desc))
}
