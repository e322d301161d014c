//! # Geometry Model
//!
//! The input representation shared by the snapping index and grid
//! inference. The host flattens its element tree into a list of rects in
//! canvas coordinates before every call; the engine never holds a reference
//! to host objects.

use serde::{Deserialize, Serialize};

use crate::VectraError;

/// One element's axis-aligned bounding box in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(id: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect {
            id: id.into(),
            x,
            y,
            w,
            h,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.h / 2.0
    }

    /// Reject NaN / infinite coordinates and sizes.
    pub(crate) fn check_finite(&self) -> Result<(), VectraError> {
        let fields = [("x", self.x), ("y", self.y), ("w", self.w), ("h", self.h)];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(VectraError::invalid_rect(
                    &self.id,
                    format!("{} is not a finite number ({})", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Parse a JSON rect list as produced by the host.
pub fn parse_rects(json: &str) -> Result<Vec<Rect>, VectraError> {
    Ok(serde_json::from_str(json)?)
}
