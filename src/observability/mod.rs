//! Observability
//!
//! - Structured logs through `tracing`, each line tagged with a typed `Event`
//! - Atomic counters in `MetricsRegistry`
//!
//! Library code only emits; installing a subscriber is left to the binary
//! (see `init_logging`).
//!
//! ```ignore
//! use versionfu::observability::{Event, MetricsRegistry};
//!
//! tracing::info!(event = %Event::SnapshotCaptured, entity_id = "e1", sequence = 3);
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` overrides `default_filter`. Calling twice is harmless; the
/// second install is ignored.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
