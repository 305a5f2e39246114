//! Global and local maxima of a filtered grid.
//!
//! Missing cells are never peaks and compare as negative infinity, so they
//! never prevent a neighbor from being one.

use crate::config::Connectivity;
use crate::grid::{Point, ScanGrid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub ix: usize,
    pub iy: usize,
    pub point: Point,
    pub value: f64,
}

impl Peak {
    fn at(grid: &ScanGrid, ix: usize, iy: usize, value: f64) -> Self {
        Self {
            ix,
            iy,
            point: grid.point(ix, iy),
            value,
        }
    }
}

/// Largest present value. Ties resolve to the first cell in row-major order.
/// Returns `None` when every cell is missing.
pub fn global_peak(grid: &ScanGrid) -> Option<Peak> {
    let mut best: Option<Peak> = None;
    for ((ix, iy), value) in grid.values().indexed_iter() {
        let Some(value) = *value else {
            continue;
        };
        if best.map_or(true, |b| value > b.value) {
            best = Some(Peak::at(grid, ix, iy, value));
        }
    }
    best
}

/// Cells above `threshold` that are strictly greater than every in-bounds
/// neighbor. A neighbor with an equal value disqualifies both cells, so
/// plateaus produce no peak. Returned in row-major order.
pub fn local_peaks(grid: &ScanGrid, threshold: f64, connectivity: Connectivity) -> Vec<Peak> {
    let values = grid.values();
    let diagonal = connectivity == Connectivity::Eight;

    values
        .indexed_iter()
        .filter_map(|((ix, iy), value)| {
            let value = (*value)?;
            if value <= threshold {
                return None;
            }
            let is_peak = values
                .neighbors(ix, iy, diagonal)
                .all(|(nx, ny)| values[(nx, ny)].unwrap_or(f64::NEG_INFINITY) < value);
            is_peak.then(|| Peak::at(grid, ix, iy, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use common::Buffer2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn grid_from(width: usize, height: usize, cells: Vec<Option<f64>>) -> ScanGrid {
        let xs = (0..width).map(|i| i as f64 * 0.5).collect();
        let ys = (0..height).map(|i| 10.0 + i as f64).collect();
        ScanGrid::with_values(xs, ys, Buffer2::new(width, height, cells))
    }

    fn dense(width: usize, height: usize, cells: &[f64]) -> ScanGrid {
        grid_from(width, height, cells.iter().copied().map(Some).collect())
    }

    fn positions(peaks: &[Peak]) -> Vec<(usize, usize)> {
        peaks.iter().map(|p| (p.ix, p.iy)).collect()
    }

    // ========================================================================
    // Global peak
    // ========================================================================

    #[test]
    fn global_peak_finds_single_maximum() {
        let grid = dense(3, 3, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 9.0, 0.8]);
        let peak = global_peak(&grid).unwrap();
        assert_eq!((peak.ix, peak.iy), (1, 2));
        assert_eq!(peak.point, Point::new(0.5, 12.0));
        assert_eq!(peak.value, 9.0);
    }

    #[test]
    fn global_peak_ignores_missing_cells() {
        let grid = grid_from(2, 2, vec![None, Some(-3.0), None, Some(-1.0)]);
        let peak = global_peak(&grid).unwrap();
        assert_eq!((peak.ix, peak.iy), (1, 1));
        assert_eq!(peak.value, -1.0);
    }

    #[test]
    fn global_peak_of_all_missing_is_none() {
        let grid = grid_from(3, 2, vec![None; 6]);
        assert_eq!(global_peak(&grid), None);
    }

    #[test]
    fn global_peak_tie_keeps_first_in_row_major_order() {
        let grid = dense(3, 2, &[1.0, 5.0, 2.0, 5.0, 0.0, 5.0]);
        let peak = global_peak(&grid).unwrap();
        assert_eq!((peak.ix, peak.iy), (1, 0));
    }

    // ========================================================================
    // Local peaks
    // ========================================================================

    #[test]
    fn local_peaks_respect_threshold() {
        #[rustfmt::skip]
        let grid = dense(5, 3, &[
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 2.0, 0.0, 0.9, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
        ]);
        let peaks = local_peaks(&grid, 1.0, Connectivity::Four);
        assert_eq!(positions(&peaks), vec![(1, 1)]);

        let peaks = local_peaks(&grid, 0.5, Connectivity::Four);
        assert_eq!(positions(&peaks), vec![(1, 1), (3, 1)]);
    }

    #[test]
    fn value_equal_to_threshold_is_not_a_peak() {
        let grid = dense(3, 1, &[0.0, 0.8, 0.0]);
        assert!(local_peaks(&grid, 0.8, Connectivity::Four).is_empty());
    }

    #[test]
    fn plateau_yields_no_peak() {
        let grid = dense(4, 1, &[0.0, 3.0, 3.0, 0.0]);
        assert!(local_peaks(&grid, 0.0, Connectivity::Four).is_empty());
    }

    #[test]
    fn diagonal_neighbor_only_matters_with_eight_connectivity() {
        #[rustfmt::skip]
        let grid = dense(3, 3, &[
            0.0, 0.0, 0.0,
            0.0, 2.0, 0.0,
            0.0, 0.0, 3.0,
        ]);
        let four = local_peaks(&grid, 0.0, Connectivity::Four);
        assert_eq!(positions(&four), vec![(1, 1), (2, 2)]);

        let eight = local_peaks(&grid, 0.0, Connectivity::Eight);
        assert_eq!(positions(&eight), vec![(2, 2)]);
    }

    #[test]
    fn missing_neighbors_do_not_block_peaks() {
        let grid = grid_from(3, 1, vec![None, Some(1.5), None]);
        let peaks = local_peaks(&grid, 1.0, Connectivity::Four);
        assert_eq!(positions(&peaks), vec![(1, 0)]);
        assert_eq!(peaks[0].point, Point::new(0.5, 10.0));
    }

    #[test]
    fn missing_cells_are_never_peaks() {
        let grid = grid_from(2, 2, vec![None; 4]);
        assert!(local_peaks(&grid, f64::MIN, Connectivity::Eight).is_empty());
    }

    #[test]
    fn single_cell_grid_is_a_peak_above_threshold() {
        let grid = dense(1, 1, &[2.0]);
        assert_eq!(local_peaks(&grid, 1.0, Connectivity::Four).len(), 1);
        assert!(local_peaks(&grid, 2.0, Connectivity::Four).is_empty());
    }

    #[test]
    fn random_grids_satisfy_peak_invariants() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let cells: Vec<Option<f64>> = (0..64)
                .map(|_| {
                    if rng.random_bool(0.1) {
                        None
                    } else {
                        Some(rng.random_range(0..6) as f64 * 0.5)
                    }
                })
                .collect();
            let grid = grid_from(8, 8, cells);
            let threshold = 1.0;

            for connectivity in [Connectivity::Four, Connectivity::Eight] {
                for peak in local_peaks(&grid, threshold, connectivity) {
                    assert!(peak.value > threshold);
                    let values = grid.values();
                    for (nx, ny) in values.neighbors(
                        peak.ix,
                        peak.iy,
                        connectivity == Connectivity::Eight,
                    ) {
                        if let Some(n) = values[(nx, ny)] {
                            assert!(peak.value > n, "peak must exceed neighbor");
                        }
                    }
                }
            }

            if let Some(global) = global_peak(&grid) {
                assert!(grid.values().iter().flatten().all(|&v| v <= global.value));
            }
        }
    }
}
