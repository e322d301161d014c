//! # Compressed Undo/Redo History
//!
//! Keeps every document state as a deflated snapshot. Documents in a page
//! builder are large, repetitive JSON trees, so deflate routinely shrinks a
//! snapshot by an order of magnitude while inflating in well under a
//! millisecond.
//!
//! The model is two stacks:
//!
//! ```text
//!   undo: [s0, s1, s2, s3]   <- top is the current state
//!   redo: [s5, s4]           <- top is the next redo target
//! ```
//!
//! `undo` is never empty: its bottom entry is the floor state supplied at
//! construction (or the oldest surviving state once a snapshot cap evicts
//! older ones). Pushing a new state always clears `redo`.

use std::collections::VecDeque;

use miniz_oxide::deflate::compress_to_vec;
use miniz_oxide::inflate::decompress_to_vec;
use serde_json::Value;

use crate::config::HistoryConfig;
use crate::VectraError;

/// One immutable, deflated document state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Box<[u8]>,
}

impl Snapshot {
    /// Deflate `text` at the given level (0..=10).
    pub fn compress(text: &str, level: u8) -> Self {
        Snapshot {
            bytes: compress_to_vec(text.as_bytes(), level).into_boxed_slice(),
        }
    }

    /// Inflate back to the exact text that was compressed.
    pub fn decompress(&self) -> Result<String, VectraError> {
        let raw = decompress_to_vec(&self.bytes)
            .map_err(|e| VectraError::Snapshot(format!("inflate failed: {:?}", e)))?;
        String::from_utf8(raw)
            .map_err(|e| VectraError::Snapshot(format!("snapshot is not valid UTF-8: {}", e)))
    }

    pub fn compressed_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Compressed snapshot stack with a floor state.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    level: u8,
    max_snapshots: Option<usize>,
}

impl HistoryManager {
    /// Create a history whose floor is `initial`, with default settings.
    pub fn new(initial: &str) -> Self {
        let config = HistoryConfig::default();
        Self::build(initial, config.compression_level, config.max_snapshots)
    }

    pub fn with_config(initial: &str, config: &HistoryConfig) -> Result<Self, VectraError> {
        config.validate()?;
        Ok(Self::build(
            initial,
            config.compression_level,
            config.max_snapshots,
        ))
    }

    fn build(initial: &str, level: u8, max_snapshots: Option<usize>) -> Self {
        let mut undo = VecDeque::new();
        undo.push_back(Snapshot::compress(initial, level));
        HistoryManager {
            undo,
            redo: Vec::new(),
            level,
            max_snapshots,
        }
    }

    /// Record a new current state. Discards the redo branch.
    pub fn push_state(&mut self, json: &str) {
        let snapshot = Snapshot::compress(json, self.level);
        tracing::trace!(
            raw = json.len(),
            compressed = snapshot.compressed_len(),
            "history push"
        );
        self.undo.push_back(snapshot);
        self.redo.clear();

        if let Some(max) = self.max_snapshots {
            while self.undo.len() > max {
                self.undo.pop_front();
            }
        }
    }

    /// Serialize a structured document and push it.
    pub fn push_value(&mut self, document: &Value) -> Result<(), VectraError> {
        let text = serde_json::to_string(document)?;
        self.push_state(&text);
        Ok(())
    }

    /// Step back one state, returning the new current document.
    ///
    /// `Ok(None)` when already at the floor. The stacks only move once the
    /// target snapshot has been restored.
    pub fn undo(&mut self) -> Result<Option<String>, VectraError> {
        if self.undo.len() <= 1 {
            return Ok(None);
        }
        let text = self.undo[self.undo.len() - 2].decompress()?;
        if let Some(top) = self.undo.pop_back() {
            self.redo.push(top);
        }
        Ok(Some(text))
    }

    /// Re-apply the most recently undone state.
    pub fn redo(&mut self) -> Result<Option<String>, VectraError> {
        let text = match self.redo.last() {
            Some(snapshot) => snapshot.decompress()?,
            None => return Ok(None),
        };
        if let Some(top) = self.redo.pop() {
            self.undo.push_back(top);
        }
        Ok(Some(text))
    }

    /// The current document, without moving.
    pub fn current(&self) -> Result<String, VectraError> {
        match self.undo.back() {
            Some(snapshot) => snapshot.decompress(),
            None => Err(VectraError::Snapshot("history has no floor state".to_string())),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of `undo` calls that would currently succeed.
    pub fn undo_depth(&self) -> usize {
        self.undo.len().saturating_sub(1)
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Compressed bytes retained across both stacks. Diagnostic only.
    pub fn get_memory_usage(&self) -> usize {
        self.undo
            .iter()
            .chain(self.redo.iter())
            .map(Snapshot::compressed_len)
            .sum()
    }
}
