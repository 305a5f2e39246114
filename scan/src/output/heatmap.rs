//! Heatmap plot of the filtered grid with peak overlays.
//!
//! The grid is drawn in scan coordinates with labelled x/y axes (y pointing
//! up), colored with the viridis map over the grid's value range. A labelled
//! color bar on the right gives the value scale. Local peaks are circled,
//! the global peak is crossed, and a legend names both.

use std::path::Path;

use image::{Rgb, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{OutputError, OutputResult};
use crate::grid::ScanGrid;
use crate::peaks::Peak;

/// Viridis anchor colors at t = 0, 0.25, 0.5, 0.75, 1.
const VIRIDIS: [[f32; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

const FONT: &str = "sans-serif";
const COLORBAR_STEPS: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapStyle {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Width of the color bar panel, labels included.
    pub colorbar_width: u32,
    pub value_label: String,
    pub background: Rgb<u8>,
    pub missing_color: Rgb<u8>,
    pub peak_color: Rgb<u8>,
    pub global_peak_color: Rgb<u8>,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 720,
            title: "Filtered scan with detected peaks".to_string(),
            colorbar_width: 120,
            value_label: "Filtered signal".to_string(),
            background: Rgb([255, 255, 255]),
            missing_color: Rgb([128, 128, 128]),
            peak_color: Rgb([230, 25, 25]),
            global_peak_color: Rgb([255, 255, 255]),
        }
    }
}

/// Maps `t` in [0, 1] onto the viridis color map.
pub fn viridis(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0) as f32 * (VIRIDIS.len() - 1) as f32;
    let lo = (t.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = t - lo as f32;
    let (a, b) = (VIRIDIS[lo], VIRIDIS[lo + 1]);
    Rgb(std::array::from_fn(|c| {
        (a[c] + (b[c] - a[c]) * frac).round() as u8
    }))
}

fn rgb(color: Rgb<u8>) -> RGBColor {
    RGBColor(color[0], color[1], color[2])
}

fn plot_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> OutputError {
    OutputError::Plot(err.to_string())
}

/// Half of the spacing between axis positions; 0.5 for a single position.
fn half_step(axis: &[f64]) -> f64 {
    match (axis.first(), axis.last()) {
        (Some(first), Some(last)) if axis.len() > 1 && last != first => {
            (last - first).abs() / (axis.len() - 1) as f64 / 2.0
        }
        _ => 0.5,
    }
}

/// Axis extent covering whole cells, in increasing order.
fn extent(axis: &[f64], half: f64) -> std::ops::Range<f64> {
    let lo = axis.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = axis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lo - half)..(hi + half)
}

/// Value range of the color scale. A flat grid is centered in the scale and
/// an all-missing grid gets a unit scale.
fn color_range(filtered: &ScanGrid) -> (f64, f64) {
    match filtered.value_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((v, _)) => (v - 0.5, v + 0.5),
        None => (0.0, 1.0),
    }
}

fn draw_grid<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    filtered: &ScanGrid,
    local_peaks: &[Peak],
    global_peak: Option<&Peak>,
    style: &HeatmapStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (hx, hy) = (half_step(filtered.xs()), half_step(filtered.ys()));
    let (lo, hi) = color_range(filtered);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(extent(filtered.xs(), hx), extent(filtered.ys(), hy))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("X position")
        .y_desc("Y position")
        .x_label_formatter(&|x| format!("{x:.2}"))
        .y_label_formatter(&|y| format!("{y:.2}"))
        .draw()?;

    let missing = rgb(style.missing_color);
    chart.draw_series(filtered.points().map(|(ix, iy, p)| {
        let color = match filtered.get(ix, iy) {
            Some(v) => rgb(viridis((v - lo) / (hi - lo))),
            None => missing,
        };
        Rectangle::new([(p.x - hx, p.y - hy), (p.x + hx, p.y + hy)], color.filled())
    }))?;

    let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
    let cell_px = (plot_w as f64 / filtered.width() as f64).min(plot_h as f64 / filtered.height() as f64);
    let radius = (cell_px * 0.4).clamp(4.0, 20.0) as i32;

    let peak_style = rgb(style.peak_color).stroke_width(2);
    let global_style = rgb(style.global_peak_color).stroke_width(2);
    let mut labelled = false;

    if !local_peaks.is_empty() {
        chart
            .draw_series(
                local_peaks
                    .iter()
                    .map(|p| Circle::new((p.point.x, p.point.y), radius, peak_style)),
            )?
            .label(format!("Local peaks ({})", local_peaks.len()))
            .legend(move |(x, y)| Circle::new((x, y), 5, peak_style));
        labelled = true;
    }
    if let Some(peak) = global_peak {
        chart
            .draw_series(std::iter::once(Cross::new(
                (peak.point.x, peak.point.y),
                radius,
                global_style,
            )))?
            .label(format!("Global peak {} = {:.3}", peak.point, peak.value))
            .legend(move |(x, y)| Cross::new((x, y), 5, global_style));
        labelled = true;
    }

    if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(RGBColor(60, 60, 60).mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 14, &WHITE))
            .draw()?;
    }
    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    filtered: &ScanGrid,
    style: &HeatmapStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (lo, hi) = color_range(filtered);

    // Same bottom label area as the grid chart keeps both panels aligned.
    let mut bar = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(45)
        .right_y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(style.value_label.as_str())
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;

    let step = (hi - lo) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        let y0 = lo + step * i as f64;
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], rgb(viridis(t)).filled())
    }))?;
    Ok(())
}

/// Renders `filtered` with local peaks circled and the global peak crossed.
pub fn render_heatmap(
    filtered: &ScanGrid,
    local_peaks: &[Peak],
    global_peak: Option<&Peak>,
    style: &HeatmapStyle,
) -> OutputResult<RgbImage> {
    if filtered.is_empty() {
        return Err(OutputError::Plot("grid has no cells".to_string()));
    }
    let (width, height) = (style.width, style.height);
    let colorbar_width = style.colorbar_width.min(width / 2);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&rgb(style.background)).map_err(plot_error)?;
        let body = root
            .titled(&style.title, (FONT, 24))
            .map_err(plot_error)?;
        let (grid_area, bar_area) = body.split_horizontally(width - colorbar_width);

        draw_grid(&grid_area, filtered, local_peaks, global_peak, style).map_err(plot_error)?;
        draw_colorbar(&bar_area, filtered, style).map_err(plot_error)?;
        root.present().map_err(plot_error)?;
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| OutputError::Plot("bitmap size does not match the image".to_string()))
}

/// Renders and saves the heatmap. The format follows the file extension.
pub fn write_heatmap(
    path: &Path,
    filtered: &ScanGrid,
    local_peaks: &[Peak],
    global_peak: Option<&Peak>,
    style: &HeatmapStyle,
) -> OutputResult<()> {
    if filtered.is_empty() {
        return Err(OutputError::EmptyGrid {
            path: path.to_path_buf(),
        });
    }
    super::prepare_path(path)?;

    render_heatmap(filtered, local_peaks, global_peak, style)?
        .save(path)
        .map_err(|source| OutputError::Image {
            path: path.to_path_buf(),
            source,
        })
}
