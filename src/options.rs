//! Configuration options for feed capture.
//!
//! The `Options` struct controls visibility gating, scheduling windows and the
//! extraction heuristics' size limits. Every field can be overridden from a
//! partial JSON document; missing fields keep their defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration options for feed capture.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use feed_capture::Options;
///
/// let options = Options {
///     visibility_threshold: 0.75,
///     max_posts_per_pass: 4,
///     ..Options::default()
/// };
/// assert_eq!(options.max_posts_per_pass, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Minimum visible fraction for a post to be extracted.
    ///
    /// Default: `0.6`
    pub visibility_threshold: f64,

    /// Quiet period after the last scroll/resize/mutation before a pass runs.
    ///
    /// Default: `600`
    pub idle_window_ms: u64,

    /// Delay of the one-off landing-viewport pass after startup.
    ///
    /// Default: `800`
    pub initial_delay_ms: u64,

    /// Fallback re-registration period against missed mutation batches.
    ///
    /// Default: `3000`
    pub recheck_interval_ms: u64,

    /// Location polling period for in-page navigation.
    ///
    /// Default: `1000`
    pub navigation_poll_ms: u64,

    /// Retry period while the messaging runtime is not yet available.
    ///
    /// Default: `500`
    pub runtime_retry_ms: u64,

    /// Upper bound on candidates processed in one pass.
    ///
    /// Default: `12`
    pub max_posts_per_pass: usize,

    /// Visible-fraction crossings registered with the viewport.
    ///
    /// Default: `[0.0, 0.25, 0.5, 0.75, 1.0]`
    pub observe_thresholds: Vec<f64>,

    /// Caption blocks shorter than this (in characters) are dropped as noise.
    ///
    /// Default: `5`
    pub min_block_len: usize,

    /// Caption prefix length folded into the post fingerprint (UTF-16 units).
    ///
    /// Default: `120`
    pub caption_preview_len: usize,

    /// Author names must be strictly shorter than this (in characters).
    ///
    /// Default: `120`
    pub max_author_len: usize,

    /// Images where both rendered sides fall below this are treated as icons.
    ///
    /// Default: `80.0`
    pub min_image_side: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.6,
            idle_window_ms: 600,
            initial_delay_ms: 800,
            recheck_interval_ms: 3000,
            navigation_poll_ms: 1000,
            runtime_retry_ms: 500,
            max_posts_per_pass: 12,
            observe_thresholds: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            min_block_len: 5,
            caption_preview_len: 120,
            max_author_len: 120,
            min_image_side: 80.0,
        }
    }
}

impl Options {
    /// Parse options from a (possibly partial) JSON object and validate them.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(Error::Config(format!(
                "visibility_threshold must be within [0, 1], got {}",
                self.visibility_threshold
            )));
        }
        if self.max_posts_per_pass == 0 {
            return Err(Error::Config("max_posts_per_pass must be at least 1".into()));
        }
        if self.observe_thresholds.is_empty() {
            return Err(Error::Config("observe_thresholds must not be empty".into()));
        }
        if let Some(bad) = self
            .observe_thresholds
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            return Err(Error::Config(format!(
                "observe_thresholds entries must be within [0, 1], got {bad}"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    #[must_use]
    pub fn recheck_interval(&self) -> Duration {
        Duration::from_millis(self.recheck_interval_ms)
    }

    #[must_use]
    pub fn navigation_poll(&self) -> Duration {
        Duration::from_millis(self.navigation_poll_ms)
    }

    #[must_use]
    pub fn runtime_retry(&self) -> Duration {
        Duration::from_millis(self.runtime_retry_ms)
    }
}
