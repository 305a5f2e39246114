//! Result sinks: CSV table and heatmap image.

mod csv_file;
mod heatmap;

pub use self::csv_file::{write_csv, CSV_HEADER};
pub use self::heatmap::{render_heatmap, write_heatmap, HeatmapStyle};

use std::path::{Path, PathBuf};

use common::file_utils::ensure_parent_dir;

use crate::config::OutputConfig;
use crate::error::{OutputError, OutputResult};
use crate::pipeline::ScanReport;

/// Consumer of a finished run.
pub trait OutputSink {
    fn save(&mut self, report: &ScanReport) -> OutputResult<()>;
}

/// Writes the CSV and heatmap files named in the configuration.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub csv_file: PathBuf,
    pub heatmap_file: PathBuf,
    pub style: HeatmapStyle,
}

impl FileSink {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            csv_file: config.csv_file.clone(),
            heatmap_file: config.heatmap_file.clone(),
            style: HeatmapStyle::default(),
        }
    }
}

impl OutputSink for FileSink {
    fn save(&mut self, report: &ScanReport) -> OutputResult<()> {
        write_csv(&self.csv_file, &report.raw, &report.filtered)?;
        write_heatmap(
            &self.heatmap_file,
            &report.filtered,
            &report.local_peaks,
            report.global_peak.as_ref(),
            &self.style,
        )?;
        log::info!(
            "Saved results to '{}' and '{}'",
            self.csv_file.display(),
            self.heatmap_file.display()
        );
        Ok(())
    }
}

fn prepare_path(path: &Path) -> OutputResult<()> {
    ensure_parent_dir(path).map_err(|source| OutputError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
