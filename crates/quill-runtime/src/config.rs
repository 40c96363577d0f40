#![forbid(unsafe_code)]

//! Runtime tunables as data.
//!
//! Captures every timing and sizing constant the runtime uses so embedders
//! (and tests, which set delays to zero) can override them without code
//! changes.
//!
//! # Loading
//!
//! ```toml
//! # quill.toml
//! [feed]
//! page_size = 10
//! startup_delay_ms = 0
//!
//! [animator]
//! duration_ms = 200
//! ```
//!
//! ```rust,ignore
//! let config = RuntimeConfig::from_toml_file("quill.toml")?;
//! let config = RuntimeConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `RuntimeConfig::default()` matches the browser build: 150 px scroll
//! margin, 9 s abort window, 200 ms counter roll.

#[cfg(feature = "toml-config")]
use std::path::Path;

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub feed: FeedConfig,
    pub actions: ActionConfig,
    pub animator: AnimatorConfig,
}

/// Paginated feed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Items in a full page; fewer means the feed is exhausted.
    pub page_size: usize,
    /// Delay between attach and the first fetch.
    pub startup_delay_ms: u64,
    /// Distance from the bottom (px) at which the next page is requested.
    pub scroll_margin_px: f64,
    /// Client-side abort window for a page request.
    pub request_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            startup_delay_ms: 1_000,
            scroll_margin_px: 150.0,
            request_timeout_ms: 9_000,
        }
    }
}

impl FeedConfig {
    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Like/follow/vote confirm requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Prefix of every action endpoint, without a trailing slash.
    pub api_base: String,
    pub request_timeout_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            api_base: "/api/v1".to_owned(),
            request_timeout_ms: 9_000,
        }
    }
}

impl ActionConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Counter roll animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub duration_ms: u64,
    /// Interval between host timer callbacks.
    pub frame_interval_ms: u64,
    /// Height of one numeric label; the scroll snap offset.
    pub line_height_px: f64,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            frame_interval_ms: 10,
            line_height_px: 20.0,
        }
    }
}

impl AnimatorConfig {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

impl RuntimeConfig {
    /// Configuration for deterministic tests: no startup delay.
    #[must_use]
    pub fn immediate() -> Self {
        let mut config = Self::default();
        config.feed.startup_delay_ms = 0;
        config
    }

    /// Load from a TOML string.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string (e.g. the page bootstrap payload).
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.feed.page_size == 0 {
            errors.push("feed.page_size must be at least 1".to_owned());
        }
        if !self.feed.scroll_margin_px.is_finite() || self.feed.scroll_margin_px < 0.0 {
            errors.push(format!(
                "feed.scroll_margin_px must be a non-negative number, got {}",
                self.feed.scroll_margin_px
            ));
        }
        if self.feed.request_timeout_ms == 0 {
            errors.push("feed.request_timeout_ms must be positive".to_owned());
        }
        if self.actions.request_timeout_ms == 0 {
            errors.push("actions.request_timeout_ms must be positive".to_owned());
        }
        if self.actions.api_base.ends_with('/') {
            errors.push(format!(
                "actions.api_base must not end with '/', got {:?}",
                self.actions.api_base
            ));
        }
        if !self.animator.line_height_px.is_finite() || self.animator.line_height_px <= 0.0 {
            errors.push(format!(
                "animator.line_height_px must be positive, got {}",
                self.animator.line_height_px
            ));
        }
        errors
    }
}

/// Failure to load a [`RuntimeConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "toml-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
