pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod grid;
pub mod observer;
pub mod output;
pub mod peaks;
pub mod pipeline;
pub mod scan;
pub mod smoothing;

#[cfg(test)]
mod testing;

pub use config::{AxisRange, Connectivity, RunConfig, SmoothingMethod};
pub use error::{ConfigError, OutputError};
pub use grid::{Point, ScanGrid};
pub use observer::{AttemptLog, NullObserver, ScanObserver};
pub use peaks::Peak;
pub use pipeline::{run_scan, run_simulation, save_outputs, ScanReport};
