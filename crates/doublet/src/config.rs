//! Engine Configuration
//!
//! Knobs that change how sessions verify and record, loadable from YAML
//! and overridable from the environment.
//!
//! ```yaml
//! verify_invoked: true
//! history_limit: 64
//! strict_unstub: true
//! ```

use crate::result::{DoubleError, DoubleResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of invocations retained per substitution
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Environment variable overriding `verify_invoked`
pub const ENV_VERIFY_INVOKED: &str = "DOUBLET_VERIFY_INVOKED";
/// Environment variable overriding `history_limit`
pub const ENV_HISTORY_LIMIT: &str = "DOUBLET_HISTORY_LIMIT";
/// Environment variable overriding `strict_unstub`
pub const ENV_STRICT_UNSTUB: &str = "DOUBLET_STRICT_UNSTUB";

/// Configuration for stub and expectation sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoubletConfig {
    /// Fail a single-method block stub whose method was never called
    pub verify_invoked: bool,
    /// Invocations retained per substitution
    pub history_limit: usize,
    /// Fail `unstub` for names that are not stubbed (otherwise warn and skip)
    pub strict_unstub: bool,
}

impl Default for DoubletConfig {
    fn default() -> Self {
        Self {
            verify_invoked: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            strict_unstub: true,
        }
    }
}

impl DoubletConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable the never-invoked check
    #[must_use]
    pub const fn with_verify_invoked(mut self, enabled: bool) -> Self {
        self.verify_invoked = enabled;
        self
    }

    /// Set the retained history size
    #[must_use]
    pub const fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Enable/disable strict `unstub`
    #[must_use]
    pub const fn with_strict_unstub(mut self, enabled: bool) -> Self {
        self.strict_unstub = enabled;
        self
    }

    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> DoubleResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn load(path: impl AsRef<Path>) -> DoubleResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> DoubleResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Overlay `DOUBLET_*` environment variables onto this configuration
    pub fn with_env(self) -> DoubleResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> DoubleResult<Self> {
        Self::default().with_env()
    }

    fn with_overrides<F>(mut self, lookup: F) -> DoubleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_VERIFY_INVOKED) {
            self.verify_invoked = parse_bool(ENV_VERIFY_INVOKED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HISTORY_LIMIT) {
            self.history_limit = raw.trim().parse().map_err(|_| DoubleError::Config {
                message: format!("{ENV_HISTORY_LIMIT} must be a non-negative integer, got '{raw}'"),
            })?;
        }
        if let Some(raw) = lookup(ENV_STRICT_UNSTUB) {
            self.strict_unstub = parse_bool(ENV_STRICT_UNSTUB, &raw)?;
        }
        Ok(self)
    }
}

fn parse_bool(key: &str, raw: &str) -> DoubleResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DoubleError::Config {
            message: format!("{key} must be a boolean, got '{raw}'"),
        }),
    }
}
