//! Configuration for the outlier detector.
//!
//! The defaults reproduce the conventional Tukey fences (1.5×IQR for mild,
//! 3×IQR for extreme outliers) and leave the zero-mean tooltip percentage
//! unguarded.

use serde::{Deserialize, Serialize};

/// Default multiplier for the mild (inner) fences.
pub const DEFAULT_MILD_MULTIPLIER: f64 = 1.5;

/// Default multiplier for the extreme (outer) fences.
pub const DEFAULT_EXTREME_MULTIPLIER: f64 = 3.0;

/// Configuration for statistics and classification.
///
/// Use [`DetectorConfig::builder()`] to create a validated configuration.
/// Deserialization goes through the same builder, so missing fields take
/// their defaults and invalid values are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use equipment_anomaly::config::DetectorConfig;
///
/// let config = DetectorConfig::builder()
///     .mild_multiplier(2.0)
///     .extreme_multiplier(4.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DetectorConfigBuilder")]
pub struct DetectorConfig {
    /// IQR multiplier for `lower_bound` / `upper_bound`.
    /// Default: 1.5
    pub mild_multiplier: f64,

    /// IQR multiplier for `lower_extreme` / `upper_extreme`.
    /// Must not be smaller than `mild_multiplier`.
    /// Default: 3.0
    pub extreme_multiplier: f64,

    /// Replace the percent-from-mean figure in tooltips when the column
    /// mean is zero. When false the figure renders as `Infinity` or `NaN`.
    /// Default: false
    pub guard_zero_mean: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mild_multiplier: DEFAULT_MILD_MULTIPLIER,
            extreme_multiplier: DEFAULT_EXTREME_MULTIPLIER,
            guard_zero_mean: false,
        }
    }
}

impl DetectorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DetectorConfigBuilder {
        DetectorConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("mild_multiplier", self.mild_multiplier),
            ("extreme_multiplier", self.extreme_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::InvalidMultiplier {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.extreme_multiplier < self.mild_multiplier {
            return Err(ConfigValidationError::FencesInverted {
                mild: self.mild_multiplier,
                extreme: self.extreme_multiplier,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid multiplier for '{field}': {value} (must be a positive finite number)")]
    InvalidMultiplier { field: String, value: f64 },

    #[error("Extreme multiplier {extreme} is smaller than mild multiplier {mild}")]
    FencesInverted { mild: f64, extreme: f64 },
}

impl From<ConfigValidationError> for crate::error::AnalysisError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`DetectorConfig`] with fluent API.
#[derive(Debug, Default, Deserialize)]
pub struct DetectorConfigBuilder {
    mild_multiplier: Option<f64>,
    extreme_multiplier: Option<f64>,
    guard_zero_mean: Option<bool>,
}

impl DetectorConfigBuilder {
    /// Set the IQR multiplier for the mild fences.
    pub fn mild_multiplier(mut self, k: f64) -> Self {
        self.mild_multiplier = Some(k);
        self
    }

    /// Set the IQR multiplier for the extreme fences.
    pub fn extreme_multiplier(mut self, k: f64) -> Self {
        self.extreme_multiplier = Some(k);
        self
    }

    /// Enable or disable the zero-mean guard in tooltip text.
    pub fn guard_zero_mean(mut self, guard: bool) -> Self {
        self.guard_zero_mean = Some(guard);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DetectorConfig` or an error if validation fails.
    pub fn build(self) -> Result<DetectorConfig, ConfigValidationError> {
        let config = DetectorConfig {
            mild_multiplier: self.mild_multiplier.unwrap_or(DEFAULT_MILD_MULTIPLIER),
            extreme_multiplier: self
                .extreme_multiplier
                .unwrap_or(DEFAULT_EXTREME_MULTIPLIER),
            guard_zero_mean: self.guard_zero_mean.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<DetectorConfigBuilder> for DetectorConfig {
    type Error = ConfigValidationError;

    fn try_from(builder: DetectorConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
