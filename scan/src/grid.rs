//! Coordinate grid and per-cell values.
//!
//! Cells are stored row-major by y then x, so cell `(ix, iy)` holds the
//! reading taken at `(xs[ix], ys[iy])`. Missing cells are `None`.

use common::Buffer2;

use crate::config::RunConfig;

/// Stage position in scan units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2},{:.2})", self.x, self.y)
    }
}

/// Values laid out over the scan coordinates. Used for both the raw and the
/// filtered grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: Buffer2<Option<f64>>,
}

impl ScanGrid {
    /// All-missing grid over the given axes.
    pub fn empty(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let values = Buffer2::new_filled(xs.len(), ys.len(), None);
        Self { xs, ys, values }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::empty(config.x_range.values(), config.y_range.values())
    }

    pub fn with_values(xs: Vec<f64>, ys: Vec<f64>, values: Buffer2<Option<f64>>) -> Self {
        assert_eq!(
            (values.width(), values.height()),
            (xs.len(), ys.len()),
            "values must match axis lengths"
        );
        Self { xs, ys, values }
    }

    /// Same axes, new values.
    pub fn with_same_axes(&self, values: Buffer2<Option<f64>>) -> Self {
        Self::with_values(self.xs.clone(), self.ys.clone(), values)
    }

    #[inline]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    #[inline]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    #[inline]
    pub fn values(&self) -> &Buffer2<Option<f64>> {
        &self.values
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.ys.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, ix: usize, iy: usize) -> Option<f64> {
        *self.values.get(ix, iy)
    }

    #[inline]
    pub fn set(&mut self, ix: usize, iy: usize, value: Option<f64>) {
        *self.values.get_mut(ix, iy) = value;
    }

    #[inline]
    pub fn point(&self, ix: usize, iy: usize) -> Point {
        Point::new(self.xs[ix], self.ys[iy])
    }

    /// Cell indices and coordinates in acquisition order: y outer, x inner.
    pub fn points(&self) -> impl Iterator<Item = (usize, usize, Point)> + '_ {
        self.ys.iter().enumerate().flat_map(move |(iy, &y)| {
            self.xs
                .iter()
                .enumerate()
                .map(move |(ix, &x)| (ix, iy, Point::new(x, y)))
        })
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Smallest and largest present value, `None` when every cell is missing.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisRange;

    fn grid_3x2() -> ScanGrid {
        ScanGrid::empty(vec![0.0, 1.0, 2.0], vec![10.0, 20.0])
    }

    #[test]
    fn empty_grid_is_all_missing() {
        let grid = grid_3x2();
        assert_eq!(grid.len(), 6);
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert!(grid.is_all_missing());
        assert_eq!(grid.missing_count(), 6);
        assert_eq!(grid.value_range(), None);
    }

    #[test]
    fn from_config_matches_steps() {
        let config = RunConfig::new(AxisRange::new(0.0, 1.0, 4), AxisRange::new(0.0, 1.0, 7));
        let grid = ScanGrid::from_config(&config);
        assert_eq!((grid.width(), grid.height()), (4, 7));
        assert_eq!(grid.len(), 28);
    }

    #[test]
    fn points_are_y_outer_x_inner() {
        let grid = grid_3x2();
        let order: Vec<_> = grid.points().map(|(ix, iy, _)| (ix, iy)).collect();
        assert_eq!(
            order,
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );

        let (_, _, last) = grid.points().last().unwrap();
        assert_eq!(last, Point::new(2.0, 20.0));
    }

    #[test]
    fn set_and_get_use_same_cell() {
        let mut grid = grid_3x2();
        grid.set(2, 1, Some(4.5));
        assert_eq!(grid.get(2, 1), Some(4.5));
        assert_eq!(grid.values()[5], Some(4.5));
        assert_eq!(grid.missing_count(), 5);
    }

    #[test]
    fn value_range_skips_missing() {
        let mut grid = grid_3x2();
        grid.set(0, 0, Some(-1.0));
        grid.set(1, 1, Some(3.0));
        assert_eq!(grid.value_range(), Some((-1.0, 3.0)));
    }

    #[test]
    #[should_panic(expected = "values must match axis lengths")]
    fn mismatched_values_panic() {
        ScanGrid::with_values(vec![0.0], vec![0.0], Buffer2::new_filled(2, 1, None));
    }
}
