//! # Absolute-to-Grid Inference
//!
//! Converts a set of absolutely positioned rects into an explicit CSS grid:
//! column/row track sizes plus a line range for every item.
//!
//! Every distinct left/right edge becomes a column line and every distinct
//! top/bottom edge a row line. Tracks are the gaps between consecutive
//! lines, so each rect spans exactly the tracks between its own edges:
//!
//! ```text
//!   x:    0        120                 480
//!         |   a    |         b         |
//!   line  1        2                   3
//!
//!   a: colStart 1, colEnd 2      b: colStart 2, colEnd 3
//! ```
//!
//! Lines are 1-based; the end line is exclusive, and is found by looking up
//! the rect's far edge directly (no extra increment).
//!
//! Track sizes stay in pixels. Converting to `fr` units is a post-process
//! over the pixel tracks; see [`GridLayout::fractional_columns`].

pub mod breaks;

use serde::{Deserialize, Serialize};

use crate::config::GridOptions;
use crate::model::Rect;
use crate::VectraError;

use self::breaks::BreakArray;

/// A single item's grid line range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub id: String,
    /// First column line (1-based, inclusive).
    pub col_start: usize,
    /// Line after the last occupied column (1-based, exclusive).
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

/// Inferred grid: track templates plus per-item placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    /// Space-joined pixel tracks, e.g. `"120px 360px"`.
    pub template_columns: String,
    pub template_rows: String,
    pub col_widths_px: Vec<f64>,
    pub row_heights_px: Vec<f64>,
    /// One entry per input rect, in input order.
    pub items: Vec<GridItem>,
}

impl GridLayout {
    /// Column template in `fr` units: each track divided by the column sum.
    pub fn fractional_columns(&self) -> String {
        fractional_template(&self.col_widths_px)
    }

    /// Row template in `fr` units: each track divided by the row sum.
    pub fn fractional_rows(&self) -> String {
        fractional_template(&self.row_heights_px)
    }
}

/// Infer a grid from absolutely positioned rects.
///
/// `canvas_width` is informational; tracks are always sized in pixels.
/// Fails on an empty list, or if any rect is non-finite, has non-positive
/// width/height, or collapses onto a single grid line under the tolerance.
pub fn absolute_to_grid(
    rects: &[Rect],
    canvas_width: f64,
    options: &GridOptions,
) -> Result<GridLayout, VectraError> {
    options.validate()?;
    if rects.is_empty() {
        return Err(VectraError::EmptyInput);
    }

    for rect in rects {
        rect.check_finite()?;
        if rect.w <= 0.0 || rect.h <= 0.0 {
            return Err(VectraError::invalid_rect(
                &rect.id,
                format!("non-positive size {}x{}", rect.w, rect.h),
            ));
        }
    }

    let eps = options.break_epsilon;
    let x_breaks = BreakArray::from_edges(rects.iter().flat_map(|r| [r.x, r.right()]), eps);
    let y_breaks = BreakArray::from_edges(rects.iter().flat_map(|r| [r.y, r.bottom()]), eps);

    let mut items = Vec::with_capacity(rects.len());
    for rect in rects {
        let (col_start, col_end) = line_range(&x_breaks, rect, rect.x, rect.right(), "column")?;
        let (row_start, row_end) = line_range(&y_breaks, rect, rect.y, rect.bottom(), "row")?;
        items.push(GridItem {
            id: rect.id.clone(),
            col_start,
            col_end,
            row_start,
            row_end,
        });
    }

    let col_widths_px = x_breaks.track_sizes();
    let row_heights_px = y_breaks.track_sizes();

    tracing::debug!(
        items = items.len(),
        columns = col_widths_px.len(),
        rows = row_heights_px.len(),
        canvas_width,
        "grid inferred"
    );

    Ok(GridLayout {
        template_columns: pixel_template(&col_widths_px),
        template_rows: pixel_template(&row_heights_px),
        col_widths_px,
        row_heights_px,
        items,
    })
}

/// 1-based `(start, end)` lines for one axis of a rect.
fn line_range(
    breaks: &BreakArray,
    rect: &Rect,
    near: f64,
    far: f64,
    axis: &str,
) -> Result<(usize, usize), VectraError> {
    let start = breaks.index_of(near);
    let end = breaks.index_of(far);
    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok((s + 1, e + 1)),
        (Some(_), Some(_)) => Err(VectraError::invalid_rect(
            &rect.id,
            format!("{} span collapses below the break tolerance", axis),
        )),
        _ => Err(VectraError::invalid_rect(
            &rect.id,
            format!("{} edge does not land on a grid line", axis),
        )),
    }
}

fn pixel_template(sizes: &[f64]) -> String {
    sizes
        .iter()
        .map(|s| format!("{}px", round_to(*s, 3)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fractional_template(sizes: &[f64]) -> String {
    let total: f64 = sizes.iter().sum();
    if total <= 0.0 {
        return String::new();
    }
    sizes
        .iter()
        .map(|s| format!("{}fr", round_to(s / total, 4)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(rects: &[Rect]) -> Result<GridLayout, VectraError> {
        absolute_to_grid(rects, 1200.0, &GridOptions::exact())
    }

    #[test]
    fn test_two_columns_exact_placement() {
        let rects = vec![
            Rect::new("a", 0.0, 0.0, 120.0, 80.0),
            Rect::new("b", 120.0, 0.0, 360.0, 80.0),
        ];
        let grid = exact(&rects).unwrap();
        assert_eq!(grid.col_widths_px, vec![120.0, 360.0]);
        assert_eq!(grid.template_columns, "120px 360px");
        assert_eq!(grid.template_rows, "80px");
        assert_eq!((grid.items[0].col_start, grid.items[0].col_end), (1, 2));
        assert_eq!((grid.items[1].col_start, grid.items[1].col_end), (2, 3));
        assert_eq!((grid.items[0].row_start, grid.items[0].row_end), (1, 2));
    }

    #[test]
    fn test_spanning_item() {
        let rects = vec![
            Rect::new("header", 0.0, 0.0, 480.0, 60.0),
            Rect::new("side", 0.0, 60.0, 120.0, 300.0),
            Rect::new("main", 120.0, 60.0, 360.0, 300.0),
        ];
        let grid = exact(&rects).unwrap();
        assert_eq!(grid.template_columns, "120px 360px");
        assert_eq!(grid.template_rows, "60px 300px");
        let header = &grid.items[0];
        assert_eq!((header.col_start, header.col_end), (1, 3));
        assert_eq!((header.row_start, header.row_end), (1, 2));
        let main = &grid.items[2];
        assert_eq!((main.col_start, main.col_end), (2, 3));
        assert_eq!((main.row_start, main.row_end), (2, 3));
    }

    #[test]
    fn test_items_follow_input_order() {
        let rects = vec![
            Rect::new("z", 200.0, 0.0, 100.0, 50.0),
            Rect::new("y", 0.0, 0.0, 100.0, 50.0),
        ];
        let grid = exact(&rects).unwrap();
        let ids: Vec<&str> = grid.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "y"]);
        // gap between 100 and 200 becomes its own track
        assert_eq!(grid.template_columns, "100px 100px 100px");
        assert_eq!((grid.items[0].col_start, grid.items[0].col_end), (3, 4));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(exact(&[]), Err(VectraError::EmptyInput)));
    }

    #[test]
    fn test_zero_width_fails() {
        let rects = vec![Rect::new("line", 0.0, 0.0, 0.0, 10.0)];
        let err = exact(&rects).unwrap_err();
        assert!(matches!(err, VectraError::InvalidRect { ref id, .. } if id == "line"));
    }

    #[test]
    fn test_negative_height_fails() {
        let rects = vec![
            Rect::new("ok", 0.0, 0.0, 10.0, 10.0),
            Rect::new("bad", 0.0, 0.0, 10.0, -3.0),
        ];
        assert!(exact(&rects).is_err());
    }

    #[test]
    fn test_subpixel_jitter_merges_with_default_epsilon() {
        let rects = vec![
            Rect::new("a", 0.0, 0.0, 100.0, 50.0),
            Rect::new("b", 100.004, 0.0, 99.996, 50.0),
        ];
        let grid = absolute_to_grid(&rects, 200.0, &GridOptions::default()).unwrap();
        assert_eq!(grid.col_widths_px.len(), 2);
        assert_eq!((grid.items[1].col_start, grid.items[1].col_end), (2, 3));

        let strict = exact(&rects).unwrap();
        assert_eq!(strict.col_widths_px.len(), 3);
    }

    #[test]
    fn test_rect_collapsing_under_tolerance_fails() {
        let rects = vec![Rect::new("sliver", 0.0, 0.0, 0.5, 10.0)];
        let err = absolute_to_grid(&rects, 100.0, &GridOptions { break_epsilon: 1.0 }).unwrap_err();
        assert!(err.to_string().contains("collapses"));
    }

    #[test]
    fn test_fractional_pixel_tokens_are_rounded() {
        let rects = vec![Rect::new("a", 0.0, 0.0, 100.0 / 3.0, 10.0)];
        let grid = exact(&rects).unwrap();
        assert_eq!(grid.template_columns, "33.333px");
    }

    #[test]
    fn test_fractional_templates() {
        let rects = vec![
            Rect::new("a", 0.0, 0.0, 120.0, 80.0),
            Rect::new("b", 120.0, 0.0, 360.0, 80.0),
        ];
        let grid = exact(&rects).unwrap();
        assert_eq!(grid.fractional_columns(), "0.25fr 0.75fr");
        assert_eq!(grid.fractional_rows(), "1fr");
    }

    #[test]
    fn test_serializes_camel_case() {
        let rects = vec![Rect::new("a", 0.0, 0.0, 10.0, 10.0)];
        let json = serde_json::to_value(exact(&rects).unwrap()).unwrap();
        assert_eq!(json["templateColumns"], "10px");
        assert_eq!(json["colWidthsPx"][0], 10.0);
        assert_eq!(json["items"][0]["colEnd"], 2);
    }
}
