//! Trainer configuration: window layout defaults, scoring, and mastery thresholds.

use leptos::logging;
use platform_host::ViewportSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{WindowPosition, WindowSize, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// Score awarded for each successful shortcut execution.
pub const DEFAULT_SUCCESS_REWARD: u64 = 10;
/// Mastery ratio below which guided practice keeps targeting a shortcut.
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.7;
/// How long the host keeps match feedback on screen.
pub const DEFAULT_FEEDBACK_DURATION_MS: u32 = 2_000;

#[derive(Debug, Error)]
/// Errors raised while loading or validating a [`TrainerConfig`].
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid trainer config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A field holds a value outside its supported range.
    #[error("invalid trainer config field `{field}`: {reason}")]
    OutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Human-readable constraint description.
        reason: String,
    },
}

/// Tunables for a trainer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Position of the first opened window.
    pub window_origin: WindowPosition,
    /// Offset applied on both axes for each subsequently opened window.
    pub cascade_step: i32,
    pub default_window_size: WindowSize,
    pub min_window_size: WindowSize,
    /// Viewport assumed until the host reports its real size.
    pub default_viewport: ViewportSize,
    pub success_reward: u64,
    pub mastery_threshold: f64,
    pub feedback_duration_ms: u32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            window_origin: WindowPosition { x: 40, y: 48 },
            cascade_step: 30,
            default_window_size: WindowSize {
                w: DEFAULT_WINDOW_WIDTH,
                h: DEFAULT_WINDOW_HEIGHT,
            },
            min_window_size: WindowSize { w: 220, h: 140 },
            default_viewport: ViewportSize::default(),
            success_reward: DEFAULT_SUCCESS_REWARD,
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
            feedback_duration_ms: DEFAULT_FEEDBACK_DURATION_MS,
        }
    }
}

impl TrainerConfig {
    /// Parses and validates a config from TOML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::OutOfRange`] when a
    /// value fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`TrainerConfig::from_toml_str`], but logs and falls back to defaults on error.
    pub fn from_toml_or_default(raw: &str) -> Self {
        match Self::from_toml_str(raw) {
            Ok(config) => config,
            Err(err) => {
                logging::warn!("trainer config rejected, using defaults: {err}");
                Self::default()
            }
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mastery_threshold > 0.0 && self.mastery_threshold <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "mastery_threshold",
                reason: format!("expected (0, 1], found {}", self.mastery_threshold),
            });
        }
        if self.cascade_step < 0 {
            return Err(ConfigError::OutOfRange {
                field: "cascade_step",
                reason: format!("expected >= 0, found {}", self.cascade_step),
            });
        }
        if self.min_window_size.w <= 0 || self.min_window_size.h <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "min_window_size",
                reason: "dimensions must be positive".to_string(),
            });
        }
        if self.default_window_size.w < self.min_window_size.w
            || self.default_window_size.h < self.min_window_size.h
        {
            return Err(ConfigError::OutOfRange {
                field: "default_window_size",
                reason: "must not be smaller than min_window_size".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = TrainerConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.success_reward, 10);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = TrainerConfig::from_toml_str(
            r#"
            cascade_step = 12
            success_reward = 25

            [default_viewport]
            width = 1600
            height = 900
            "#,
        )
        .expect("parse partial config");
        assert_eq!(config.cascade_step, 12);
        assert_eq!(config.success_reward, 25);
        assert_eq!(config.default_viewport, ViewportSize::new(1600, 900));
        assert_eq!(config.mastery_threshold, DEFAULT_MASTERY_THRESHOLD);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = TrainerConfig::from_toml_str("mastery_threshold = 1.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "mastery_threshold",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = TrainerConfig::from_toml_str("cascade_step = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_document_falls_back_to_defaults() {
        let config = TrainerConfig::from_toml_or_default("cascade_step = -5");
        assert_eq!(config, TrainerConfig::default());
    }
}
