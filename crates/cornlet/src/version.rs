//! Version information for cornlet and the calling convention it speaks.

use serde::Serialize;

/// Cornlet version from Cargo.toml
pub const CORNLET_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the scope/receive/send convention advertised in every scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtocolVersion {
    pub version: &'static str,
    pub spec_version: &'static str,
}

impl ProtocolVersion {
    pub const CURRENT: Self = Self {
        version: "3.0",
        spec_version: "2.1",
    };
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}
