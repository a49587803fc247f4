//! Tracing initialization.
//!
//! Sets up `tracing-subscriber` with a console fmt layer and an `EnvFilter`
//! driven by `RUST_LOG` (defaulting to `info`). Request-level spans come from
//! the `TraceLayer` installed on the router in [`crate::build_router`].

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Safe to call once per process; returns an error if a subscriber is already
/// installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
