//! Sets up the global tracing subscriber for binaries embedding the ledger.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a pretty-printing stdout subscriber.
///
/// The level defaults to `info` and can be overridden with the standard
/// `RUST_LOG` environment variable. Calling this more than once panics, so
/// it belongs at the top of `main`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(filter)
        .init();
}
