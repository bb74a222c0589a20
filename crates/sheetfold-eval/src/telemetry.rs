//! Opt-in log output for the collection caches.
//!
//! Events are only emitted when the crate is built with the `tracing`
//! feature. Hosts with their own subscriber don't need [`init_tracing`].

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `sheetfold_eval=info`. Returns `false` if a global subscriber was already
/// set.
#[cfg(feature = "tracing")]
pub fn init_tracing() -> bool {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetfold_eval=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Without the `tracing` feature there is nothing to install.
#[cfg(not(feature = "tracing"))]
pub fn init_tracing() -> bool {
    false
}
