//! Windowed mean smoothing of a scan grid.
//!
//! Both methods average the non-missing cells of a square window of odd size
//! `w` centered on each cell. The window is clipped at the grid edges and,
//! when wider than the grid, to the grid itself. A window without any valid
//! cell yields a missing output cell, so no value is ever made up.
//!
//! `FastMean` gets the same numbers from two summed-area tables, one over the
//! values (missing cells count as zero) and one over the validity mask:
//! `mean = sum / count`. This is a box filter with constant-zero padding,
//! renormalized by the number of valid cells, which makes it identical to the
//! clipped window of `Mean` on every cell, edges included.

use common::Buffer2;
use log::debug;

use crate::config::SmoothingMethod;
use crate::grid::ScanGrid;

pub fn smooth(grid: &ScanGrid, method: SmoothingMethod, window: usize) -> ScanGrid {
    let values = match method {
        SmoothingMethod::Mean => rolling_mean(grid.values(), window),
        SmoothingMethod::FastMean => fast_rolling_mean(grid.values(), window),
    };
    debug!(
        "Smoothed {}x{} grid with {} (window {})",
        grid.width(),
        grid.height(),
        method,
        window
    );
    grid.with_same_axes(values)
}

/// Half window per axis after clipping to the grid.
#[inline]
fn half_windows(window: usize, width: usize, height: usize) -> (usize, usize) {
    assert!(
        window > 0 && window % 2 == 1,
        "window size must be a positive odd integer, got {}",
        window
    );
    let half = window / 2;
    (
        half.min(width.saturating_sub(1)),
        half.min(height.saturating_sub(1)),
    )
}

/// Direct windowed mean, skipping missing cells.
pub fn rolling_mean(values: &Buffer2<Option<f64>>, window: usize) -> Buffer2<Option<f64>> {
    let (half_x, half_y) = half_windows(window, values.width(), values.height());

    Buffer2::from_fn(values.width(), values.height(), |x, y| {
        let (xs, ys) = values.window(x, y, half_x, half_y);
        let mut sum = 0.0;
        let mut count = 0usize;
        for wy in ys {
            for wx in xs.clone() {
                if let Some(v) = values[(wx, wy)] {
                    sum += v;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum / count as f64)
    })
}

/// Inclusive prefix sums with a zero guard row and column: entry
/// `(x + 1, y + 1)` holds the sum of all cells up to and including `(x, y)`.
struct SummedArea {
    table: Vec<f64>,
    stride: usize,
}

impl SummedArea {
    fn new(width: usize, height: usize, cell: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut table = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0.0;
            for x in 0..width {
                row_sum += cell(x, y);
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self { table, stride }
    }

    /// Sum over `xs × ys` (half-open ranges).
    #[inline]
    fn rect(&self, xs: std::ops::Range<usize>, ys: std::ops::Range<usize>) -> f64 {
        let s = self.stride;
        self.table[ys.end * s + xs.end] - self.table[ys.start * s + xs.end]
            - self.table[ys.end * s + xs.start]
            + self.table[ys.start * s + xs.start]
    }
}

/// Box-filter mean via summed-area tables. O(1) per cell regardless of the
/// window size.
pub fn fast_rolling_mean(values: &Buffer2<Option<f64>>, window: usize) -> Buffer2<Option<f64>> {
    let (width, height) = (values.width(), values.height());
    let (half_x, half_y) = half_windows(window, width, height);

    let sums = SummedArea::new(width, height, |x, y| values[(x, y)].unwrap_or(0.0));
    let counts = SummedArea::new(width, height, |x, y| {
        if values[(x, y)].is_some() {
            1.0
        } else {
            0.0
        }
    });

    Buffer2::from_fn(width, height, |x, y| {
        let (xs, ys) = values.window(x, y, half_x, half_y);
        // Counts are small integers, exact in f64.
        let count = counts.rect(xs.clone(), ys.clone()).round();
        (count > 0.0).then(|| sums.rect(xs, ys) / count)
    })
}
