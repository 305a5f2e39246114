use std::path::Path;

use crate::error::{OutputError, OutputResult};
use crate::grid::ScanGrid;

pub const CSV_HEADER: [&str; 4] = ["x", "y", "raw_value", "filtered_value"];

/// Missing cells are written as `NaN`.
fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NaN".to_string(),
    }
}

/// One row per cell, in row-major order (y outer, x inner).
pub fn write_csv(path: &Path, raw: &ScanGrid, filtered: &ScanGrid) -> OutputResult<()> {
    assert_eq!(
        (raw.width(), raw.height()),
        (filtered.width(), filtered.height()),
        "raw and filtered grids must have the same shape"
    );
    super::prepare_path(path)?;

    let wrap = |source: csv::Error| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    writer.write_record(CSV_HEADER).map_err(wrap)?;

    for (ix, iy, point) in raw.points() {
        writer
            .write_record([
                point.x.to_string(),
                point.y.to_string(),
                format_cell(raw.get(ix, iy)),
                format_cell(filtered.get(ix, iy)),
            ])
            .map_err(wrap)?;
    }

    writer.flush().map_err(|e| wrap(e.into()))?;
    Ok(())
}
