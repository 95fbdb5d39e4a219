//! Wire protocol types for host-worker communication.
//!
//! Every message is `[u32 LE length][u8 type][payload]` where `length` counts
//! the type byte but not itself. Only [`MessageType::Json`] carries traffic today:
//! the host sends a [`RequestDescriptor`], the worker answers with a
//! [`ResponseMessage`].

use serde::{Deserialize, Serialize};

/// Size of the length field preceding every frame.
pub const LENGTH_FIELD_LEN: usize = 4;

/// Length field plus type byte.
pub const HEADER_LEN: usize = LENGTH_FIELD_LEN + 1;

/// Message type byte following the length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// UTF-8 JSON document.
    Json,
    /// Reserved for raw bytes; no current flow produces it.
    Binary,
    /// Any byte the protocol does not define.
    Unknown(u8),
}

impl MessageType {
    pub const JSON: u8 = 1;
    pub const BINARY: u8 = 2;

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Json => Self::JSON,
            Self::Binary => Self::BINARY,
            Self::Unknown(b) => b,
        }
    }
}

impl From<u8> for MessageType {
    fn from(b: u8) -> Self {
        match b {
            Self::JSON => Self::Json,
            Self::BINARY => Self::Binary,
            other => Self::Unknown(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(t: MessageType) -> Self {
        t.as_u8()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Binary => write!(f, "binary"),
            Self::Unknown(b) => write!(f, "unknown({b})"),
        }
    }
}

/// Request forwarded by the host.
///
/// All fields are optional on the wire; defaults are applied when the scope
/// is built, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

/// Response sent back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub status: u16,
    pub body: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}
