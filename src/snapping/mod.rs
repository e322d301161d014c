//! # Snap-to Alignment Index
//!
//! Answers "which edges of nearby elements is the dragged element about to
//! line up with?" while a drag is in flight.
//!
//! The host calls [`SnappingIndex::update_rects`] once when a drag gesture
//! starts, passing every element except the one being dragged. Each pointer
//! move then calls [`SnappingIndex::query_snapping`] (or
//! [`SnappingIndex::snap`]) with the dragged element's live box. Only rects
//! in the spatial hash cells around the threshold-expanded box are examined,
//! so a query costs the same with 20 elements on the canvas as with 2,000.
//!
//! Each axis compares three anchors of the dragged box (start, center, end)
//! against the same three anchors of each candidate:
//!
//! ```text
//!   candidate   |start      |center      |end
//!   dragged     |start      |center      |end
//! ```
//!
//! giving edge-to-edge, center-to-center and edge-to-opposite-edge
//! (adjacency) alignments.

pub mod spatial;

use serde::{Deserialize, Serialize};

use crate::config::SnappingConfig;
use crate::model::Rect;
use crate::VectraError;

use self::spatial::SpatialHash;

/// Upper bound on the cells a single rect may occupy.
pub const MAX_CELLS_PER_RECT: u128 = 1 << 16;

/// Which coordinate a candidate aligns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal position; rendered as a vertical guide line.
    X,
    /// Vertical position; rendered as a horizontal guide line.
    Y,
}

/// A point along one axis of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Center,
    End,
}

const ANCHORS: [Anchor; 3] = [Anchor::Start, Anchor::Center, Anchor::End];

fn anchor_pos(anchor: Anchor, start: f64, size: f64) -> f64 {
    match anchor {
        Anchor::Start => start,
        Anchor::Center => start + size / 2.0,
        Anchor::End => start + size,
    }
}

/// The dragged element's live box plus the snap distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapQuery {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub threshold: f64,
}

impl SnapQuery {
    pub fn new(x: f64, y: f64, w: f64, h: f64, threshold: f64) -> Self {
        SnapQuery {
            x,
            y,
            w,
            h,
            threshold,
        }
    }

    fn is_usable(&self) -> bool {
        [self.x, self.y, self.w, self.h, self.threshold]
            .iter()
            .all(|v| v.is_finite())
            && self.threshold >= 0.0
    }
}

/// One alignment line within threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapCandidate {
    /// Id of the rect providing the line.
    pub id: String,
    pub axis: Axis,
    /// Anchor on the dragged box.
    pub source: Anchor,
    /// Anchor on the candidate rect.
    pub target: Anchor,
    /// Coordinate of the alignment line.
    pub pos: f64,
    /// Signed offset that moves the dragged box onto the line.
    pub delta: f64,
    pub distance: f64,
    #[serde(skip)]
    rect_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// A guide line to draw while snapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub orientation: Orientation,
    pub pos: f64,
    /// Extent along the line, covering both the dragged and matched rect.
    pub start: f64,
    pub end: f64,
    /// Id of the rect the guide aligns to.
    pub target_id: String,
}

/// Snapped position of the dragged box plus the guides that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    pub guides: Vec<Guide>,
}

/// Spatial index over the non-dragged elements of one drag gesture.
#[derive(Debug, Clone)]
pub struct SnappingIndex {
    rects: Vec<Rect>,
    grid: SpatialHash,
}

impl Default for SnappingIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SnappingIndex {
    pub fn new() -> Self {
        SnappingIndex {
            rects: Vec::new(),
            grid: SpatialHash::new(SnappingConfig::default().cell_size),
        }
    }

    pub fn with_config(config: &SnappingConfig) -> Result<Self, VectraError> {
        config.validate()?;
        Ok(SnappingIndex {
            rects: Vec::new(),
            grid: SpatialHash::new(config.cell_size),
        })
    }

    /// Replace the indexed rects. Prior state is dropped even if `rects`
    /// turns out to be invalid, in which case the index is left empty.
    pub fn update_rects(&mut self, rects: Vec<Rect>) -> Result<(), VectraError> {
        self.rects.clear();
        self.grid.clear();

        for rect in &rects {
            rect.check_finite()?;
            if rect.w < 0.0 || rect.h < 0.0 {
                return Err(VectraError::invalid_rect(
                    &rect.id,
                    format!("negative size {}x{}", rect.w, rect.h),
                ));
            }
            let cells = self.grid.cells_spanned(rect);
            if cells > MAX_CELLS_PER_RECT {
                return Err(VectraError::invalid_rect(
                    &rect.id,
                    format!(
                        "spans {} cells of {}px; raise snapping.cellSize",
                        cells,
                        self.grid.cell_size()
                    ),
                ));
            }
        }

        self.grid.rebuild(&rects);
        self.rects = rects;
        tracing::debug!(
            rects = self.rects.len(),
            cells = self.grid.cell_count(),
            "snapping index rebuilt"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// All alignment lines within `threshold` of the dragged box.
    ///
    /// Sorted by axis (x first), then by distance; equal distances keep the
    /// order the rects were supplied in. An empty index or an unusable query
    /// yields an empty list.
    pub fn query_snapping(&self, query: &SnapQuery) -> Vec<SnapCandidate> {
        if self.rects.is_empty() || !query.is_usable() {
            return vec![];
        }

        let t = query.threshold;
        let nearby = self.grid.candidates(
            query.x - t,
            query.y - t,
            query.x + query.w + t,
            query.y + query.h + t,
        );

        let mut out = Vec::new();
        for &index in &nearby {
            let rect = &self.rects[index];
            collect_axis(&mut out, Axis::X, query.x, query.w, rect.x, rect.w, t, rect, index);
            collect_axis(&mut out, Axis::Y, query.y, query.h, rect.y, rect.h, t, rect, index);
        }

        out.sort_by(|a, b| {
            axis_rank(a.axis)
                .cmp(&axis_rank(b.axis))
                .then(a.distance.total_cmp(&b.distance))
                .then(a.rect_index.cmp(&b.rect_index))
        });
        tracing::trace!(
            examined = nearby.len(),
            matches = out.len(),
            "snapping query"
        );
        out
    }

    /// Resolve the nearest line on each axis independently and move the
    /// dragged box onto it.
    pub fn snap(&self, query: &SnapQuery) -> SnapResult {
        let candidates = self.query_snapping(query);
        let best_x = candidates.iter().find(|c| c.axis == Axis::X);
        let best_y = candidates.iter().find(|c| c.axis == Axis::Y);

        let x = best_x.map_or(query.x, |c| query.x + c.delta);
        let y = best_y.map_or(query.y, |c| query.y + c.delta);

        let mut guides = Vec::with_capacity(2);
        if let Some(c) = best_x {
            let rect = &self.rects[c.rect_index];
            guides.push(Guide {
                orientation: Orientation::Vertical,
                pos: c.pos,
                start: y.min(rect.y),
                end: (y + query.h).max(rect.bottom()),
                target_id: rect.id.clone(),
            });
        }
        if let Some(c) = best_y {
            let rect = &self.rects[c.rect_index];
            guides.push(Guide {
                orientation: Orientation::Horizontal,
                pos: c.pos,
                start: x.min(rect.x),
                end: (x + query.w).max(rect.right()),
                target_id: rect.id.clone(),
            });
        }

        SnapResult { x, y, guides }
    }
}

fn axis_rank(axis: Axis) -> u8 {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_axis(
    out: &mut Vec<SnapCandidate>,
    axis: Axis,
    q_start: f64,
    q_size: f64,
    c_start: f64,
    c_size: f64,
    threshold: f64,
    rect: &Rect,
    rect_index: usize,
) {
    for source in ANCHORS {
        let from = anchor_pos(source, q_start, q_size);
        for target in ANCHORS {
            let pos = anchor_pos(target, c_start, c_size);
            let delta = pos - from;
            let distance = delta.abs();
            if distance <= threshold {
                out.push(SnapCandidate {
                    id: rect.id.clone(),
                    axis,
                    source,
                    target,
                    pos,
                    delta,
                    distance,
                    rect_index,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(rects: Vec<Rect>) -> SnappingIndex {
        let mut idx = SnappingIndex::new();
        idx.update_rects(rects).unwrap();
        idx
    }

    #[test]
    fn test_query_before_update_is_empty() {
        let idx = SnappingIndex::new();
        assert!(idx.query_snapping(&SnapQuery::new(0.0, 0.0, 10.0, 10.0, 5.0)).is_empty());
        let snapped = idx.snap(&SnapQuery::new(3.0, 4.0, 10.0, 10.0, 5.0));
        assert_eq!((snapped.x, snapped.y), (3.0, 4.0));
        assert!(snapped.guides.is_empty());
    }

    #[test]
    fn test_left_edge_alignment() {
        let idx = index(vec![Rect::new("a", 100.0, 0.0, 50.0, 50.0)]);
        let found = idx.query_snapping(&SnapQuery::new(103.0, 20.0, 80.0, 40.0, 5.0));
        let left = found
            .iter()
            .find(|c| c.axis == Axis::X && c.source == Anchor::Start && c.target == Anchor::Start)
            .unwrap();
        assert_eq!(left.id, "a");
        assert_eq!(left.pos, 100.0);
        assert_eq!(left.delta, -3.0);
        assert_eq!(left.distance, 3.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let idx = index(vec![Rect::new("a", 105.0, 0.0, 10.0, 10.0)]);
        let at = idx.query_snapping(&SnapQuery::new(100.0, 0.0, 200.0, 10.0, 5.0));
        assert!(at
            .iter()
            .any(|c| c.axis == Axis::X && c.source == Anchor::Start && c.target == Anchor::Start));

        let below = idx.query_snapping(&SnapQuery::new(100.0, 0.0, 200.0, 10.0, 4.999));
        assert!(!below
            .iter()
            .any(|c| c.axis == Axis::X && c.source == Anchor::Start && c.target == Anchor::Start));
    }

    #[test]
    fn test_center_alignment() {
        let idx = index(vec![Rect::new("a", 0.0, 0.0, 100.0, 100.0)]);
        // dragged center x = 48 + 2 = 50
        let found = idx.query_snapping(&SnapQuery::new(48.0, 120.0, 4.0, 4.0, 1.0));
        assert!(found.iter().any(|c| c.axis == Axis::X
            && c.source == Anchor::Center
            && c.target == Anchor::Center
            && c.delta == 0.0));
    }

    #[test]
    fn test_results_sorted_by_axis_then_distance() {
        let idx = index(vec![
            Rect::new("far", 8.0, 0.0, 50.0, 50.0),
            Rect::new("near", 1.0, 60.0, 50.0, 50.0),
        ]);
        let found = idx.query_snapping(&SnapQuery::new(0.0, 0.0, 30.0, 30.0, 5.0));
        assert!(!found.is_empty());
        let first_y = found.iter().position(|c| c.axis == Axis::Y).unwrap_or(found.len());
        assert!(found[..first_y].iter().all(|c| c.axis == Axis::X));
        assert!(found[first_y..].iter().all(|c| c.axis == Axis::Y));
        for pair in found[..first_y].windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert_eq!(found[0].id, "near");
    }

    #[test]
    fn test_nothing_within_threshold() {
        let idx = index(vec![Rect::new("a", 0.0, 0.0, 10.0, 10.0)]);
        assert!(idx
            .query_snapping(&SnapQuery::new(37.0, 37.0, 10.0, 10.0, 2.0))
            .is_empty());
    }

    #[test]
    fn test_negative_threshold_is_empty() {
        let idx = index(vec![Rect::new("a", 0.0, 0.0, 10.0, 10.0)]);
        assert!(idx
            .query_snapping(&SnapQuery::new(0.0, 0.0, 10.0, 10.0, -1.0))
            .is_empty());
    }

    #[test]
    fn test_snap_resolves_each_axis() {
        let idx = index(vec![
            Rect::new("col", 200.0, 240.0, 100.0, 100.0),
            Rect::new("row", 60.0, 300.0, 60.0, 60.0),
        ]);
        // right edge 198 -> 200, bottom edge 297 -> 300
        let result = idx.snap(&SnapQuery::new(148.0, 247.0, 50.0, 50.0, 4.0));
        assert_eq!(result.x, 150.0);
        assert_eq!(result.y, 250.0);
        assert_eq!(result.guides.len(), 2);

        let vertical = &result.guides[0];
        assert_eq!(vertical.orientation, Orientation::Vertical);
        assert_eq!(vertical.pos, 200.0);
        assert_eq!(vertical.target_id, "col");
        assert_eq!((vertical.start, vertical.end), (240.0, 340.0));

        let horizontal = &result.guides[1];
        assert_eq!(horizontal.orientation, Orientation::Horizontal);
        assert_eq!(horizontal.pos, 300.0);
        assert_eq!(horizontal.target_id, "row");
        assert_eq!((horizontal.start, horizontal.end), (60.0, 200.0));
    }

    #[test]
    fn test_update_clears_previous_rects() {
        let mut idx = index(vec![Rect::new("old", 0.0, 0.0, 10.0, 10.0)]);
        idx.update_rects(vec![Rect::new("new", 1000.0, 1000.0, 10.0, 10.0)])
            .unwrap();
        assert!(idx
            .query_snapping(&SnapQuery::new(0.0, 0.0, 10.0, 10.0, 5.0))
            .is_empty());
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_invalid_update_leaves_index_empty() {
        let mut idx = index(vec![Rect::new("a", 0.0, 0.0, 10.0, 10.0)]);
        let err = idx
            .update_rects(vec![Rect::new("bad", 0.0, 0.0, -5.0, 10.0)])
            .unwrap_err();
        assert!(matches!(err, VectraError::InvalidRect { .. }));
        assert!(idx.is_empty());
        assert!(idx
            .query_snapping(&SnapQuery::new(0.0, 0.0, 10.0, 10.0, 5.0))
            .is_empty());
    }

    #[test]
    fn test_oversized_rect_rejected() {
        let mut idx = SnappingIndex::new();
        let err = idx
            .update_rects(vec![Rect::new("sky", 0.0, 0.0, 1e9, 1e9)])
            .unwrap_err();
        assert!(err.to_string().contains("raise snapping.cellSize"));
    }

    #[test]
    fn test_custom_cell_size() {
        let config = SnappingConfig { cell_size: 25.0 };
        let mut idx = SnappingIndex::with_config(&config).unwrap();
        idx.update_rects(vec![Rect::new("a", 0.0, 0.0, 10.0, 10.0)]).unwrap();
        assert!(!idx
            .query_snapping(&SnapQuery::new(12.0, 0.0, 10.0, 10.0, 2.0))
            .is_empty());
        assert!(SnappingIndex::with_config(&SnappingConfig { cell_size: -1.0 }).is_err());
    }
}
