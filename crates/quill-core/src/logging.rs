#![forbid(unsafe_code)]

//! Structured logging helpers.
//!
//! The runtime logs through `tracing`; this module re-exports the macros so
//! downstream crates need no direct dependency, and (with the
//! `tracing-json` feature) installs a JSON subscriber for embedders that
//! collect logs outside the browser console.

pub use tracing::{debug, debug_span, error, info, info_span, trace, warn};

/// Default filter when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_FILTER: &str = "quill=info";

/// Install a global JSON subscriber.
///
/// `filter` uses `EnvFilter` syntax; `None` reads `RUST_LOG` and falls back
/// to [`DEFAULT_FILTER`]. Returns `false` if a global subscriber was
/// already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging(filter: Option<&str>) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
    };
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}
