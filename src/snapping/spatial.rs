//! # Spatial Hash Grid
//!
//! Fixed-cell buckets over canvas space. Each rect is registered in every
//! cell its bounding box touches, so a proximity query only has to look at
//! the handful of cells around the dragged element.
//!
//! The grid is rebuilt wholesale on every [`SpatialHash::rebuild`]; nothing
//! is patched incrementally.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::model::Rect;

/// Integer cell coordinate `(⌊x / cell_size⌋, ⌊y / cell_size⌋)`.
pub type CellKey = (i64, i64);

/// Mapping from cell coordinates to the indices of the rects overlapping them.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialHash {
    /// `cell_size` must be finite and positive; callers validate it.
    pub fn new(cell_size: f64) -> Self {
        SpatialHash {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Drop all buckets and register `rects` by their position in the slice.
    pub fn rebuild(&mut self, rects: &[Rect]) {
        self.cells.clear();
        for (index, rect) in rects.iter().enumerate() {
            let cols = self.span(rect.x, rect.right());
            let rows = self.span(rect.y, rect.bottom());
            for cx in cols {
                for cy in rows.clone() {
                    self.cells.entry((cx, cy)).or_default().push(index);
                }
            }
        }
    }

    /// Indices of every rect registered in a cell overlapping the box
    /// `[min_x, max_x] × [min_y, max_y]`, sorted and de-duplicated.
    pub fn candidates(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        if self.cells.is_empty() {
            return vec![];
        }

        let cols = self.span(min_x, max_x);
        let rows = self.span(min_y, max_y);
        let mut found = Vec::new();

        if span_len(&cols).saturating_mul(span_len(&rows)) <= self.cells.len() as u128 {
            for cx in cols {
                for cy in rows.clone() {
                    if let Some(bucket) = self.cells.get(&(cx, cy)) {
                        found.extend_from_slice(bucket);
                    }
                }
            }
        } else {
            // Query box covers more cells than are occupied: walk the buckets.
            for ((cx, cy), bucket) in &self.cells {
                if cols.contains(cx) && rows.contains(cy) {
                    found.extend_from_slice(bucket);
                }
            }
        }

        found.sort_unstable();
        found.dedup();
        found
    }

    /// Number of cells `rect` would be registered in.
    pub fn cells_spanned(&self, rect: &Rect) -> u128 {
        let cols = self.span(rect.x, rect.right());
        let rows = self.span(rect.y, rect.bottom());
        span_len(&cols).saturating_mul(span_len(&rows))
    }

    /// Inclusive range of cell coordinates covering `[min, max]` on one axis.
    fn span(&self, min: f64, max: f64) -> RangeInclusive<i64> {
        let lo = (min / self.cell_size).floor() as i64;
        let hi = (max / self.cell_size).floor() as i64;
        lo..=hi.max(lo)
    }
}

fn span_len(range: &RangeInclusive<i64>) -> u128 {
    (*range.end() as i128 - *range.start() as i128 + 1) as u128
}
