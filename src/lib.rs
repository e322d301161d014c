//! # Vectra
//!
//! The native compute engine behind a visual page builder.
//!
//! The editor's UI owns the document tree and the interaction loop. A few
//! operations are too heavy to run on the interactive thread without
//! dropping frames, so the UI hands them to this engine:
//!
//! - **History**: a compressed undo/redo stack of whole-document snapshots.
//! - **Snapping**: a spatial hash over the canvas answering "what is the
//!   dragged element about to align with?" on every pointer move.
//! - **Grid inference**: turns absolutely positioned elements into an
//!   explicit CSS grid (tracks plus per-item line ranges).
//! - **Compile**: lowers a TSX component to JavaScript for the live preview.
//! - **Export**: renders a subtree as a React component.
//!
//! The components share nothing. Each runs behind its own worker thread
//! and is reached through request/response messages carrying correlation
//! ids.
//!
//! ## Architecture
//!
//! ```text
//! Host (UI thread)
//!       ↓  JSON text / typed requests
//!   [worker]    : one thread + queue per component, replies by id
//!       ↓
//!   [history]   [snapping]   [grid]   [export: tsx, react]
//!       ↑ all share [model] (Rect), [config], [error]
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod grid;
pub mod history;
pub mod model;
pub mod snapping;
pub mod worker;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{EngineConfig, GridOptions};
pub use engine::Engine;
pub use error::VectraError;
pub use grid::{absolute_to_grid, GridItem, GridLayout};
pub use history::HistoryManager;
pub use model::Rect;
pub use snapping::{SnapCandidate, SnapQuery, SnapResult, SnappingIndex};

use export::{Compiler, ReactExporter, TsxCompiler};

/// Infer a grid from a JSON rect list, returning GridLayout JSON text.
///
/// Uses the default break tolerance; see [`absolute_to_grid_json_with`].
pub fn absolute_to_grid_json(nodes_json: &str, canvas_width: f64) -> Result<String, VectraError> {
    absolute_to_grid_json_with(nodes_json, canvas_width, &GridOptions::default())
}

pub fn absolute_to_grid_json_with(
    nodes_json: &str,
    canvas_width: f64,
    options: &GridOptions,
) -> Result<String, VectraError> {
    let rects = model::parse_rects(nodes_json)?;
    let layout = absolute_to_grid(&rects, canvas_width, options)?;
    Ok(serde_json::to_string(&layout)?)
}

/// Compile a TSX component to JavaScript with `React.createElement` calls.
pub fn compile_component(source: &str) -> Result<String, VectraError> {
    TsxCompiler.compile(source)
}

/// Export a project subtree (`{"nodes": .., "rootId": ..}`) as React
/// component source.
pub fn export_component(project_json: &str) -> Result<String, VectraError> {
    ReactExporter.compile(project_json)
}
