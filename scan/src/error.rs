//! Error types for configuration loading and output writing.
//!
//! Device failures are not represented here: they are recovered inside the
//! controllers and surface only as missing cells.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, detected before any acquisition starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("{axis} range must have at least one step")]
    EmptyAxis { axis: &'static str },

    #[error("{axis} range bounds must be finite, got start={start}, end={end}")]
    NonFiniteAxis {
        axis: &'static str,
        start: f64,
        end: f64,
    },

    #[error("max_retries must be at least 1")]
    ZeroRetries,

    #[error("{name} must be within [0, 1], got {value}")]
    FailRate { name: &'static str, value: f64 },

    #[error("rolling_avg_window must be a positive odd integer, got {0}")]
    Window(usize),

    #[error("peak_threshold must be finite, got {0}")]
    Threshold(f64),

    #[error("Invalid sensor model: {0}")]
    Sensor(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures while persisting results. In-memory scan data is unaffected.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory for '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write CSV '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write heatmap '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot render an empty grid to '{path}'")]
    EmptyGrid { path: PathBuf },

    #[error("Failed to draw heatmap: {0}")]
    Plot(String),
}

pub type OutputResult<T> = Result<T, OutputError>;
