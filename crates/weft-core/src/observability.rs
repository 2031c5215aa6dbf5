//! Observability infrastructure for weft.
//!
//! Structured logging with consistent spans. This module provides an
//! initialization helper and a span constructor so every vending operation
//! carries the same fields.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `weft_core=debug`)
///
/// # Example
///
/// ```rust
/// use weft_core::observability::{LogFormat, init_logging};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for credential vending operations with standard fields.
///
/// # Example
///
/// ```rust
/// use weft_core::observability::vending_span;
///
/// let span = vending_span("acquire", "col-1", "inst-a");
/// let _guard = span.enter();
/// // ... acquire a collection store
/// ```
#[must_use]
pub fn vending_span(operation: &str, collection: &str, instance: &str) -> Span {
    tracing::info_span!(
        "vending",
        op = operation,
        collection = collection,
        instance = instance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty);
    }

    #[test]
    fn span_helper_creates_span() {
        let span = vending_span("acquire", "col-1", "inst-a");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }
}
