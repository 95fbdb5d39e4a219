//! Worker startup errors.
//!
//! Errors inside a running connection end the loop with a
//! [`Disconnect`](crate::worker::Disconnect) instead; errors inside a single
//! request become a 500 response.

use std::io;
use std::net::SocketAddr;

use crate::registry::{AppRef, ResolveError};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("could not connect to host at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to load application {app_ref}: {source}")]
    Resolve {
        app_ref: AppRef,
        #[source]
        source: ResolveError,
    },
}
