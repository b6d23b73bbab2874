//! Process-wide logging setup

use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "dq_alerts=info";

/// Output layout, one per deployment target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines with timestamps and targets
    Local,
    /// Plain lines without ANSI colours or timestamps; the platform stamps them
    Lambda,
}

static INIT: Once = Once::new();

/// Install the global subscriber. Only the first call has any effect.
pub fn init(format: LogFormat) {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_FILTER.into());

        let registry = tracing_subscriber::registry().with(filter);
        let result = match format {
            LogFormat::Local => registry
                .with(tracing_subscriber::fmt::layer().with_target(true))
                .try_init(),
            LogFormat::Lambda => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .without_time()
                        .with_target(true),
                )
                .try_init(),
        };

        // Another subscriber (e.g. a test harness) already owns the global slot.
        if let Err(e) = result {
            tracing::debug!(error = %e, "Logging already initialized");
        }
    });
}

