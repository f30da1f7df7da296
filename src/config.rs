//! Application configuration.
//!
//! The configuration is loaded from a JSON file, either passed on the
//! command line (`--config <path>`) or found at
//! `$XDG_CONFIG_HOME/ovctl/config.json`.  Every section is optional and
//! unknown keys are ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "animation": {
//!     "duration_ms": 250,
//!     "easing": "ease_out_quad",
//!     "gesture_easing": "ease_out_cubic",
//!     "search_fade_ms": 250
//!   },
//!   "gestures": {
//!     "invert": true,
//!     "dead_zone": 0.05,
//!     "flick_velocity": 0.4
//!   },
//!   "layout": {
//!     "spacing": 12.0,
//!     "small_workspace_ratio": 0.15
//!   }
//! }
//! ```

use crate::easing::Easing;
use crate::gesture::GestureConfig;
use crate::layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Timing and curves of discrete transitions.
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Swipe tracking and release settings.
    #[serde(default)]
    pub gestures: GestureConfig,

    /// Spacing and size ratios used by the layout cache.
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Transition timing and easing.
///
/// All durations are in **milliseconds**.  A duration of `0` jumps straight
/// to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration of state changes triggered by commands (ms).
    pub duration_ms: u64,
    /// Curve for state changes triggered by commands.
    pub easing: Easing,
    /// Curve for the settle animation after a swipe.
    pub gesture_easing: Easing,
    /// Duration of the search results cross-fade (ms).
    pub search_fade_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 250,
            easing: Easing::EaseOutQuad,
            gesture_easing: Easing::EaseOutCubic,
            search_fade_ms: 250,
        }
    }
}

impl AnimationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn search_fade(&self) -> Duration {
        Duration::from_millis(self.search_fade_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/ovctl/config.json`, falling back to
    /// `$HOME/.config/ovctl/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("ovctl").join("config.json"))
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "animation": {
                "duration_ms": 300,
                "easing": "linear",
                "gesture_easing": { "cubic_bezier": [0.25, 0.1, 0.25, 1.0] },
                "search_fade_ms": 0
            },
            "gestures": {
                "invert": false,
                "dead_zone": 0.1,
                "max_duration_ms": 500
            },
            "layout": {
                "spacing": 10.0,
                "dash_max_height_ratio": 0.2
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.animation.duration_ms, 300);
        assert_eq!(cfg.animation.easing, Easing::Linear);
        assert_eq!(
            cfg.animation.gesture_easing,
            Easing::CubicBezier([0.25, 0.1, 0.25, 1.0])
        );
        assert_eq!(cfg.animation.search_fade(), Duration::ZERO);
        assert!(!cfg.gestures.invert);
        assert_eq!(cfg.gestures.dead_zone, 0.1);
        assert_eq!(cfg.gestures.max_duration_ms, 500);
        assert_eq!(cfg.layout.spacing, 10.0);
        assert_eq!(cfg.layout.dash_max_height_ratio, 0.2);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.animation.duration(), Duration::from_millis(250));
        assert_eq!(cfg.animation.easing, Easing::EaseOutQuad);
        assert_eq!(cfg.animation.gesture_easing, Easing::EaseOutCubic);
        assert_eq!(cfg.gestures, GestureConfig::default());
        assert_eq!(cfg.layout, LayoutConfig::default());
    }

    #[test]
    fn deserialize_partial_sections() {
        let json = r#"{ "gestures": { "flick_velocity": 1.5 }, "layout": {} }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.gestures.flick_velocity, 1.5);
        let defaults = GestureConfig::default();
        assert_eq!(cfg.gestures.dead_zone, defaults.dead_zone);
        assert_eq!(cfg.layout.spacing, LayoutConfig::default().spacing);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "gestures": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn invalid_easing_is_rejected() {
        let json = r#"{ "animation": { "easing": "bouncy" } }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/ovctl/config.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_reads_file() {
        let dir = std::env::temp_dir().join(format!("ovctl-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{ "animation": { "duration_ms": 120 } }"#).unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.animation.duration_ms, 120);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
