//! Run configuration.
//!
//! A run is described by one YAML document, parsed with `serde_yml` and
//! validated before any acquisition begins. The configuration is immutable
//! for the duration of a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{ConfigError, ConfigResult};

// ============================================================================
// Enums
// ============================================================================

/// Smoothing algorithm applied to the raw grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SmoothingMethod {
    /// Windowed mean over the clipped square window, skipping missing cells.
    #[default]
    Mean,
    /// Box filter over summed-area tables of values and validity.
    /// Produces the same result as `Mean`.
    FastMean,
}

/// Neighborhood used by local peak detection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    /// Horizontal and vertical neighbors only.
    #[default]
    Four,
    /// Includes the diagonal neighbors.
    Eight,
}

// ============================================================================
// Sections
// ============================================================================

/// Evenly spaced axis, `start` and `end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

impl AxisRange {
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self { start, end, steps }
    }

    /// Axis positions. A single step yields only `start`; the last position
    /// is exactly `end`.
    pub fn values(&self) -> Vec<f64> {
        match self.steps {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.end - self.start) / (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        if i == n - 1 {
                            self.end
                        } else {
                            self.start + step * i as f64
                        }
                    })
                    .collect()
            }
        }
    }

    fn validate(&self, axis: &'static str) -> ConfigResult<()> {
        if self.steps == 0 {
            return Err(ConfigError::EmptyAxis { axis });
        }
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(ConfigError::NonFiniteAxis {
                axis,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Simulated settle time per move. Zero disables sleeping.
    pub settle_time_ms: u64,
}

/// Gaussian fluorescence spot of the simulated sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotConfig {
    pub x: f64,
    pub y: f64,
    pub amplitude: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub base_signal: f64,
    /// Standard deviation of the additive Gaussian read noise.
    pub noise_level: f64,
    pub spots: Vec<SpotConfig>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_signal: 1.0,
            noise_level: 0.2,
            spots: Vec::new(),
        }
    }
}

impl SensorConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.base_signal.is_finite() {
            return Err(ConfigError::Sensor(format!(
                "base_signal must be finite, got {}",
                self.base_signal
            )));
        }
        if !(self.noise_level >= 0.0 && self.noise_level.is_finite()) {
            return Err(ConfigError::Sensor(format!(
                "noise_level must be non-negative, got {}",
                self.noise_level
            )));
        }
        for (idx, spot) in self.spots.iter().enumerate() {
            if !(spot.sigma > 0.0 && spot.sigma.is_finite()) {
                return Err(ConfigError::Sensor(format!(
                    "spot {} sigma must be positive, got {}",
                    idx, spot.sigma
                )));
            }
            if !(spot.x.is_finite() && spot.y.is_finite() && spot.amplitude.is_finite()) {
                return Err(ConfigError::Sensor(format!(
                    "spot {} has non-finite parameters",
                    idx
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_file: PathBuf,
    pub heatmap_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_file: PathBuf::from("output/scan.csv"),
            heatmap_file: PathBuf::from("output/heatmap.png"),
        }
    }
}

// ============================================================================
// Run configuration
// ============================================================================

fn default_stage_fail_rate() -> f64 {
    0.05
}

fn default_sensor_fail_rate() -> f64 {
    0.03
}

fn default_peak_threshold() -> f64 {
    0.8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    /// Attempts per move and per measurement, including the first one.
    pub max_retries: usize,
    #[serde(default = "default_stage_fail_rate")]
    pub stage_fail_rate: f64,
    #[serde(default = "default_sensor_fail_rate")]
    pub sensor_fail_rate: f64,
    #[serde(default)]
    pub smoothing: SmoothingMethod,
    pub rolling_avg_window: usize,
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f64,
    #[serde(default)]
    pub peak_connectivity: Connectivity,
    /// Seed for the simulated devices. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunConfig {
    /// Minimal valid configuration: given grid, 3 retries, mean 3x3 smoothing
    /// and defaults for everything else.
    pub fn new(x_range: AxisRange, y_range: AxisRange) -> Self {
        Self {
            x_range,
            y_range,
            max_retries: 3,
            stage_fail_rate: default_stage_fail_rate(),
            sensor_fail_rate: default_sensor_fail_rate(),
            smoothing: SmoothingMethod::default(),
            rolling_avg_window: 3,
            peak_threshold: default_peak_threshold(),
            peak_connectivity: Connectivity::default(),
            seed: None,
            stage: StageConfig::default(),
            sensor: SensorConfig::default(),
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: RunConfig = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.x_range.validate("x")?;
        self.y_range.validate("y")?;

        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }

        for (name, value) in [
            ("stage_fail_rate", self.stage_fail_rate),
            ("sensor_fail_rate", self.sensor_fail_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::FailRate { name, value });
            }
        }

        if self.rolling_avg_window == 0 || self.rolling_avg_window % 2 == 0 {
            return Err(ConfigError::Window(self.rolling_avg_window));
        }

        if !self.peak_threshold.is_finite() {
            return Err(ConfigError::Threshold(self.peak_threshold));
        }

        self.sensor.validate()
    }

    /// Grid dimensions as `(nx, ny)`.
    pub fn grid_size(&self) -> (usize, usize) {
        (self.x_range.steps, self.y_range.steps)
    }
}
