use std::ops::{Index, IndexMut, Range};
use std::slice;

/// Offsets of the 4-connected neighbors: left, right, up, down.
const OFFSETS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Offsets of the 8-connected neighbors, row by row.
const OFFSETS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Row-major 2D buffer. Cell `(x, y)` is stored at `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    cells: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, cells: Vec<T>) -> Self {
        assert_eq!(
            cells.len(),
            width * height,
            "cells length must equal width * height"
        );
        Self {
            cells,
            width,
            height,
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            cells,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.cells[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        debug_assert!(x < self.width && y < self.height);
        &mut self.cells[y * self.width + x]
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Inverse of [`Buffer2::index`].
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.cells.iter()
    }

    /// Iterates `((x, y), &cell)` in storage order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| ((idx % width, idx / width), cell))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            cells: self.cells.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// In-bounds neighbors of `(x, y)`. With `diagonal` the 8-neighborhood is
    /// used, otherwise the 4-neighborhood.
    pub fn neighbors(
        &self,
        x: usize,
        y: usize,
        diagonal: bool,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let offsets: &'static [(isize, isize)] = if diagonal { &OFFSETS_8 } else { &OFFSETS_4 };
        offsets.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            (nx < self.width && ny < self.height).then_some((nx, ny))
        })
    }

    /// Column and row ranges of the window of half-size `(half_x, half_y)`
    /// centered on `(x, y)`, clipped to the buffer.
    #[inline]
    pub fn window(
        &self,
        x: usize,
        y: usize,
        half_x: usize,
        half_y: usize,
    ) -> (Range<usize>, Range<usize>) {
        let xs = x.saturating_sub(half_x)..(x + half_x + 1).min(self.width);
        let ys = y.saturating_sub(half_y)..(y + half_y + 1).min(self.height);
        (xs, ys)
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            cells: vec![value; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.cells[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.cells[y * self.width + x]
    }
}

impl<T> Index<usize> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.cells[idx]
    }
}

impl<'a, T> IntoIterator for &'a Buffer2<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.len(), 6);
        assert!(!buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "cells length must equal width * height")]
    fn test_new_panics_on_size_mismatch() {
        Buffer2::new(3, 2, vec![1, 2, 3]);
    }

    #[test]
    fn test_row_major_layout() {
        // row 0 = [10, 20, 30], row 1 = [40, 50, 60]
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(*buf.get(2, 0), 30);
        assert_eq!(*buf.get(0, 1), 40);
        assert_eq!(buf[(2, 1)], 60);
        assert_eq!(buf.index(1, 1), 4);
        assert_eq!(buf.coords(4), (1, 1));
    }

    #[test]
    fn test_from_fn_visits_row_major() {
        let buf = Buffer2::from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(buf.cells(), &[0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_indexed_iter_matches_get() {
        let buf = Buffer2::from_fn(4, 3, |x, y| (x, y));
        for ((x, y), cell) in buf.indexed_iter() {
            assert_eq!(*cell, (x, y));
        }
    }

    #[test]
    fn test_neighbors_corner_and_center() {
        let buf = Buffer2::new_filled(3, 3, 0u8);

        let corner: Vec<_> = buf.neighbors(0, 0, false).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1)]);

        assert_eq!(buf.neighbors(1, 1, false).count(), 4);
        assert_eq!(buf.neighbors(1, 1, true).count(), 8);
        assert_eq!(buf.neighbors(2, 2, true).count(), 3);
    }

    #[test]
    fn test_window_is_clipped() {
        let buf = Buffer2::new_filled(5, 4, 0u8);
        assert_eq!(buf.window(0, 0, 1, 1), (0..2, 0..2));
        assert_eq!(buf.window(2, 2, 1, 1), (1..4, 1..4));
        assert_eq!(buf.window(4, 3, 10, 10), (0..5, 0..4));
    }

    #[test]
    fn test_map_keeps_shape() {
        let buf = Buffer2::new(2, 2, vec![1, 2, 3, 4]);
        let doubled = buf.map(|v| v * 2);
        assert_eq!(doubled.width(), 2);
        assert_eq!(doubled.cells(), &[2, 4, 6, 8]);
    }

    #[test]
    fn test_fill() {
        let mut buf = Buffer2::new(2, 2, vec![1, 2, 3, 4]);
        buf.fill(99);
        assert!(buf.iter().all(|&v| v == 99));
    }
}
