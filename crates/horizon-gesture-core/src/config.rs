//! Engine-wide configuration.
//!
//! Values that are shared by every handler (the touch slop, velocity window,
//! history size) live in [`EngineConfig`], which hosts usually ship as a TOML
//! file:
//!
//! ```toml
//! touch_slop = 10.0
//! velocity_window_ms = 100
//! history_capacity = 20
//! max_pointers = 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::logging::targets;
use crate::pointer::PointerTracker;

/// Distance a pointer may travel before it counts as a drag.
pub const DEFAULT_TOUCH_SLOP: f32 = 10.0;

/// Upper bound on simultaneously tracked pointers.
pub const DEFAULT_MAX_POINTERS: usize = 10;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Movement tolerance used by recognizers that do not override it.
    pub touch_slop: f32,
    /// Velocity estimation window in milliseconds.
    pub velocity_window_ms: u64,
    /// Samples kept per pointer.
    pub history_capacity: usize,
    /// Pointer downs beyond this count are ignored.
    pub max_pointers: usize,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        tracing::debug!(target: targets::CONFIG, ?config, "engine config loaded");
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.touch_slop.is_finite() || self.touch_slop < 0.0 {
            return Err(ConfigError::invalid_value(
                "touch_slop",
                "must be a finite, non-negative distance",
            ));
        }
        if self.velocity_window_ms == 0 {
            return Err(ConfigError::invalid_value(
                "velocity_window_ms",
                "must be greater than zero",
            ));
        }
        if self.history_capacity < 2 {
            return Err(ConfigError::invalid_value(
                "history_capacity",
                "at least two samples are needed to estimate velocity",
            ));
        }
        if self.max_pointers == 0 {
            return Err(ConfigError::invalid_value(
                "max_pointers",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }

    /// A pointer tracker using these settings.
    pub fn tracker(&self) -> PointerTracker {
        PointerTracker::with_settings(self.velocity_window(), self.history_capacity)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            touch_slop: DEFAULT_TOUCH_SLOP,
            velocity_window_ms: 100,
            history_capacity: 20,
            max_pointers: DEFAULT_MAX_POINTERS,
        }
    }
}
