//! End-to-end run: acquire, smooth, detect peaks.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::{OutputConfig, RunConfig};
use crate::devices::{simulated_devices, Sensor, StageActuator};
use crate::error::{ConfigResult, OutputResult};
use crate::grid::ScanGrid;
use crate::observer::ScanObserver;
use crate::output::{FileSink, OutputSink};
use crate::peaks::{global_peak, local_peaks, Peak};
use crate::scan::ScanOrchestrator;
use crate::smoothing::smooth;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub raw: ScanGrid,
    pub filtered: ScanGrid,
    pub global_peak: Option<Peak>,
    pub local_peaks: Vec<Peak>,
    pub skipped_points: usize,
    /// Wall time of the acquisition pass.
    pub elapsed: Duration,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan time: {:.3}s", self.elapsed.as_secs_f64())?;
        match &self.global_peak {
            Some(peak) => writeln!(f, "Global peak at {} with value {:.4}", peak.point, peak.value)?,
            None => writeln!(f, "No global peak: every point is missing")?,
        }
        writeln!(f, "Local peaks: {}", self.local_peaks.len())?;
        for peak in &self.local_peaks {
            writeln!(f, "  {} = {:.4}", peak.point, peak.value)?;
        }
        write!(f, "Skipped points: {} of {}", self.skipped_points, self.raw.len())
    }
}

/// Scans the configured grid with the given devices and analyses the result.
///
/// The configuration is validated before any device is touched.
pub fn run_scan<St, Se>(
    config: &RunConfig,
    stage: St,
    sensor: Se,
    observer: &mut dyn ScanObserver,
) -> ConfigResult<ScanReport>
where
    St: StageActuator,
    Se: Sensor,
{
    config.validate()?;

    let (nx, ny) = config.grid_size();
    info!(
        "Starting {}x{} scan, {} attempts per operation",
        nx, ny, config.max_retries
    );

    let mut orchestrator = ScanOrchestrator::new(stage, sensor, config.max_retries);
    let start = Instant::now();
    let acquisition = orchestrator.acquire(ScanGrid::from_config(config), observer);
    let elapsed = start.elapsed();
    debug!("Acquisition took {:?}", elapsed);

    let start = Instant::now();
    let filtered = smooth(&acquisition.raw, config.smoothing, config.rolling_avg_window);
    debug!("Smoothing took {:?}", start.elapsed());

    let start = Instant::now();
    let global_peak = global_peak(&filtered);
    let local_peaks = local_peaks(&filtered, config.peak_threshold, config.peak_connectivity);
    debug!(
        "Peak detection took {:?}, {} local peaks",
        start.elapsed(),
        local_peaks.len()
    );

    Ok(ScanReport {
        raw: acquisition.raw,
        filtered,
        global_peak,
        local_peaks,
        skipped_points: acquisition.skipped_points,
        elapsed,
    })
}

/// Runs the scan against simulated devices built from `config`.
pub fn run_simulation(config: &RunConfig, observer: &mut dyn ScanObserver) -> ConfigResult<ScanReport> {
    config.validate()?;
    let (stage, sensor) = simulated_devices(config)?;
    run_scan(config, stage, sensor, observer)
}

pub fn save_outputs(report: &ScanReport, config: &OutputConfig) -> OutputResult<()> {
    FileSink::new(config).save(report)
}
