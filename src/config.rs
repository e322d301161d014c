//! Engine configuration.
//!
//! Every knob has a default, so `{}` is a complete configuration. The host
//! (or the CLI's `--config` flag) may supply a JSON object overriding any
//! subset of fields.

use serde::{Deserialize, Serialize};

use crate::VectraError;

/// Default deflate level for history snapshots.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

/// Default spatial hash cell size in canvas pixels.
pub const DEFAULT_CELL_SIZE: f64 = 100.0;

/// Default tolerance when merging grid break coordinates, in pixels.
///
/// Well below one device pixel, large enough to absorb float noise from
/// upstream unit conversion. Set to `0.0` for exact equality.
pub const DEFAULT_BREAK_EPSILON: f64 = 0.01;

/// Default bound on each worker's request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for the whole engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub snapping: SnappingConfig,
    pub grid: GridOptions,
    pub worker: WorkerConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, VectraError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VectraError> {
        self.history.validate()?;
        self.snapping.validate()?;
        self.grid.validate()?;
        self.worker.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Deflate level, 0 (store) through 10 (slowest).
    pub compression_level: u8,
    /// Optional cap on retained undo snapshots. `None` keeps everything.
    pub max_snapshots: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            max_snapshots: None,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), VectraError> {
        if self.compression_level > 10 {
            return Err(VectraError::InvalidConfig(format!(
                "history.compressionLevel must be 0..=10, got {}",
                self.compression_level
            )));
        }
        if self.max_snapshots == Some(0) {
            return Err(VectraError::InvalidConfig(
                "history.maxSnapshots must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnappingConfig {
    pub cell_size: f64,
}

impl Default for SnappingConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl SnappingConfig {
    pub fn validate(&self) -> Result<(), VectraError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(VectraError::InvalidConfig(format!(
                "snapping.cellSize must be a positive number, got {}",
                self.cell_size
            )));
        }
        Ok(())
    }
}

/// Options for grid inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    /// Break coordinates closer than this collapse into one grid line.
    pub break_epsilon: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            break_epsilon: DEFAULT_BREAK_EPSILON,
        }
    }
}

impl GridOptions {
    /// Exact floating equality when merging breaks.
    pub fn exact() -> Self {
        Self { break_epsilon: 0.0 }
    }

    pub fn validate(&self) -> Result<(), VectraError> {
        if !self.break_epsilon.is_finite() || self.break_epsilon < 0.0 {
            return Err(VectraError::InvalidConfig(format!(
                "grid.breakEpsilon must be a non-negative number, got {}",
                self.break_epsilon
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), VectraError> {
        if self.queue_capacity == 0 {
            return Err(VectraError::InvalidConfig(
                "worker.queueCapacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.snapping.cell_size, 100.0);
        assert_eq!(config.history.compression_level, 6);
        assert_eq!(config.history.max_snapshots, None);
    }

    #[test]
    fn test_partial_override() {
        let config =
            EngineConfig::from_json(r#"{"grid":{"breakEpsilon":0.5},"history":{"maxSnapshots":50}}"#)
                .unwrap();
        assert_eq!(config.grid.break_epsilon, 0.5);
        assert_eq!(config.history.max_snapshots, Some(50));
        assert_eq!(config.snapping, SnappingConfig::default());
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let err = EngineConfig::from_json(r#"{"snapping":{"cellSize":0}}"#).unwrap_err();
        assert!(matches!(err, VectraError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_level() {
        let config = HistoryConfig {
            compression_level: 11,
            max_snapshots: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_epsilon() {
        assert!(GridOptions { break_epsilon: -1.0 }.validate().is_err());
        assert!(GridOptions::exact().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_queue() {
        assert!(WorkerConfig { queue_capacity: 0 }.validate().is_err());
    }
}
