//! IPC bridge between the host and this worker.
//!
//! # Architecture
//!
//! - **protocol**: Message types and the JSON request/response schemas
//! - **codec**: Length-prefixed, typed framing for AsyncRead/AsyncWrite
//! - **transport**: Loopback TCP connection to the host

pub mod codec;
pub mod protocol;
pub mod transport;
