//! Tracing setup for the worker binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log level variable consulted when `RUST_LOG` is unset.
pub const LOG_ENV: &str = "CORNLET_LOG";
/// `json` switches output to JSON lines.
pub const FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter directive for a `CORNLET_LOG` value.
pub fn filter_directive(level: Option<&str>) -> String {
    let level = level.map(|l| l.trim().to_ascii_lowercase());
    let base_level = match level.as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    };
    format!("cornlet={base_level},cornlet_worker={base_level}")
}

/// Initialize tracing to stderr. Safe to call more than once.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = std::env::var(LOG_ENV).ok();
        EnvFilter::new(filter_directive(level.as_deref()))
    };

    let use_json = std::env::var(FORMAT_ENV).as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}
