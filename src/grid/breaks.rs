//! # Break Arrays
//!
//! Sorted, de-duplicated edge coordinates used as CSS grid line positions.
//!
//! Merging uses a tolerance: after sorting, a value joins the current cluster
//! when it lies within `epsilon` of the cluster's first value, and the first
//! value stands for the whole cluster. Every input value is therefore within
//! `epsilon` of its line, and with `epsilon == 0.0` this is plain exact
//! de-duplication.

/// Grid line positions along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakArray {
    lines: Vec<f64>,
    epsilon: f64,
}

impl BreakArray {
    /// Build from raw edge coordinates. Values must be finite.
    pub fn from_edges(edges: impl IntoIterator<Item = f64>, epsilon: f64) -> Self {
        let mut values: Vec<f64> = edges.into_iter().collect();
        values.sort_by(f64::total_cmp);

        let mut lines: Vec<f64> = Vec::with_capacity(values.len());
        for v in values {
            match lines.last() {
                Some(&head) if v - head <= epsilon => {}
                _ => lines.push(v),
            }
        }

        BreakArray { lines, epsilon }
    }

    pub fn lines(&self) -> &[f64] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 0-based index of the line `value` belongs to.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        // Each line is the smallest member of its cluster: the owner is the last line <= value.
        let upper = self.lines.partition_point(|&line| line <= value);
        let owner = upper.checked_sub(1)?;
        let line = self.lines[owner];
        if (value - line).abs() <= self.epsilon {
            Some(owner)
        } else {
            None
        }
    }

    /// Distance between consecutive lines: one entry per track.
    pub fn track_sizes(&self) -> Vec<f64> {
        self.lines.windows(2).map(|w| w[1] - w[0]).collect()
    }
}
