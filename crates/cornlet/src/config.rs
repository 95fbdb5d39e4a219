//! Worker configuration from the environment.

use std::time::Duration;

use crate::registry::{AppRef, DEFAULT_APP_REF, ResolveError};

/// Port the host listens on for workers.
pub const PORT_ENV: &str = "CPPCORN_IPC_PORT";
/// Application reference, `module:attribute`.
pub const APP_ENV: &str = "CORNLET_APP";
/// Payload/write timeout in seconds; `0` disables it.
pub const IO_TIMEOUT_ENV: &str = "CORNLET_IO_TIMEOUT_SECS";

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}='{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid CORNLET_APP: {0}")]
    InvalidAppRef(#[from] ResolveError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Host port on 127.0.0.1.
    pub port: u16,
    pub app_ref: AppRef,
    /// Bound on finishing a started frame and on writing a response. Waiting
    /// for the next request is never bounded.
    pub io_timeout: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            app_ref: AppRef::new("demo.main", "app"),
            io_timeout: Some(DEFAULT_IO_TIMEOUT),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(PORT_ENV) {
            config.port = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    var: PORT_ENV,
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
        }

        let app_ref = get(APP_ENV).unwrap_or_else(|| DEFAULT_APP_REF.to_string());
        config.app_ref = app_ref.parse()?;

        if let Some(value) = get(IO_TIMEOUT_ENV) {
            let secs: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: IO_TIMEOUT_ENV,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.io_timeout = (secs > 0).then_some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_app_ref(mut self, app_ref: AppRef) -> Self {
        self.app_ref = app_ref;
        self
    }

    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }
}
