//! Global subscriber setup with a runtime enable/disable toggle.
//!
//! Mirrors the teacher's optimization-source logging stream: a single
//! switch that silences every subsequent event without tearing down or
//! reinstalling the subscriber.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default `EnvFilter` directive used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// A cheaply cloneable switch that silences every event once disabled,
/// without removing the subscriber.
#[derive(Clone, Debug)]
pub struct LoggingToggle(Arc<AtomicBool>);

impl LoggingToggle {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Silences all subsequent events.
    pub fn disable(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Reverses [`LoggingToggle::disable`].
    pub fn enable(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether events currently pass through.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct ToggleLayer {
    toggle: LoggingToggle,
}

impl<S> Layer<S> for ToggleLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn enabled(&self, _metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.toggle.is_enabled()
    }
}

/// Installs a global `tracing_subscriber::fmt` subscriber gated by a
/// [`LoggingToggle`], honoring `RUST_LOG` if set and falling back to
/// [`DEFAULT_LOG_FILTER`] otherwise.
///
/// Returns the toggle so callers can silence logging at runtime (e.g. while
/// replaying a cached run) without reinstalling the subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_subscriber() -> LoggingToggle {
    let toggle = LoggingToggle::new();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(ToggleLayer { toggle: toggle.clone() })
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    toggle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_defaults_to_enabled() {
        let toggle = LoggingToggle::new();
        assert!(toggle.is_enabled());
        toggle.disable();
        assert!(!toggle.is_enabled());
        toggle.enable();
        assert!(toggle.is_enabled());
    }

    #[test]
    fn clones_share_state() {
        let toggle = LoggingToggle::new();
        let clone = toggle.clone();
        clone.disable();
        assert!(!toggle.is_enabled());
    }
}
