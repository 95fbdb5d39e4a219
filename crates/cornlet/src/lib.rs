//! cornlet: bridge worker between a host process and a pluggable application.
//!
//! The host forwards each public request as a length-prefixed JSON frame over
//! a loopback TCP connection. The worker decodes it into a [`Scope`], runs the
//! configured [`App`] through the scope/receive/send convention, and writes
//! the collected response back as a single frame.

mod version;

pub mod adapter;
pub mod app;
pub mod bridge;
pub mod config;
pub mod demo;
pub mod error;
pub mod logging;
pub mod registry;
pub mod response;
pub mod scope;
pub mod worker;

pub use adapter::{AppFailure, dispatch, invoke};
pub use app::{App, AppError, AppResult, Receive, ReceiveEvent, ResponseEvent, Responder};
pub use config::{ConfigError, WorkerConfig};
pub use error::WorkerError;
pub use registry::{AppRef, AppRegistry, ResolveError};
pub use scope::Scope;
pub use version::{CORNLET_VERSION, ProtocolVersion};
pub use worker::{Connection, ConnectionId, Disconnect, run_worker};
