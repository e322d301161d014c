//! Message vocabularies for the four engine workers.

use std::marker::PhantomData;

use serde_json::Value;

use crate::config::{GridOptions, HistoryConfig, SnappingConfig};
use crate::export::Compiler;
use crate::grid::absolute_to_grid;
use crate::history::HistoryManager;
use crate::model::{parse_rects, Rect};
use crate::snapping::{SnapCandidate, SnapQuery, SnapResult, SnappingIndex};
use crate::VectraError;

use super::Service;

// ─── History ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum HistoryRequest {
    /// Start (or restart) the history with a floor document.
    Init(Value),
    Push(Value),
    Undo,
    Redo,
    CanUndo,
    CanRedo,
    MemoryUsage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryResponse {
    Ready,
    Pushed,
    /// Decompressed document text, or `None` past either end.
    Document(Option<String>),
    Flag(bool),
    MemoryUsage(usize),
}

/// Owns the history once the host has sent `Init`.
pub struct HistoryService {
    config: HistoryConfig,
    manager: Option<HistoryManager>,
}

impl HistoryService {
    pub fn new(config: HistoryConfig) -> Result<Self, VectraError> {
        config.validate()?;
        Ok(HistoryService {
            config,
            manager: None,
        })
    }

    fn manager(&mut self) -> Result<&mut HistoryManager, VectraError> {
        self.manager
            .as_mut()
            .ok_or(VectraError::NotReady { worker: Self::NAME })
    }
}

impl Service for HistoryService {
    type Request = HistoryRequest;
    type Response = HistoryResponse;
    const NAME: &'static str = "history";

    fn handle(&mut self, request: HistoryRequest) -> Result<HistoryResponse, VectraError> {
        match request {
            HistoryRequest::Init(document) => {
                let text = serde_json::to_string(&document)?;
                self.manager = Some(HistoryManager::with_config(&text, &self.config)?);
                Ok(HistoryResponse::Ready)
            }
            HistoryRequest::Push(document) => {
                self.manager()?.push_value(&document)?;
                Ok(HistoryResponse::Pushed)
            }
            HistoryRequest::Undo => Ok(HistoryResponse::Document(self.manager()?.undo()?)),
            HistoryRequest::Redo => Ok(HistoryResponse::Document(self.manager()?.redo()?)),
            HistoryRequest::CanUndo => Ok(HistoryResponse::Flag(self.manager()?.can_undo())),
            HistoryRequest::CanRedo => Ok(HistoryResponse::Flag(self.manager()?.can_redo())),
            HistoryRequest::MemoryUsage => Ok(HistoryResponse::MemoryUsage(
                self.manager()?.get_memory_usage(),
            )),
        }
    }
}

// ─── Snapping ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SnappingRequest {
    UpdateRects(Vec<Rect>),
    /// Same as `UpdateRects`, with the rect list still in JSON text form.
    UpdateRectsJson(String),
    Query(SnapQuery),
    Snap(SnapQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnappingResponse {
    Updated,
    Candidates(Vec<SnapCandidate>),
    Snapped(SnapResult),
}

pub struct SnappingService {
    index: SnappingIndex,
}

impl SnappingService {
    pub fn new(config: &SnappingConfig) -> Result<Self, VectraError> {
        Ok(SnappingService {
            index: SnappingIndex::with_config(config)?,
        })
    }
}

impl Service for SnappingService {
    type Request = SnappingRequest;
    type Response = SnappingResponse;
    const NAME: &'static str = "snapping";

    fn handle(&mut self, request: SnappingRequest) -> Result<SnappingResponse, VectraError> {
        match request {
            SnappingRequest::UpdateRects(rects) => {
                self.index.update_rects(rects)?;
                Ok(SnappingResponse::Updated)
            }
            SnappingRequest::UpdateRectsJson(json) => {
                let rects = match parse_rects(&json) {
                    Ok(rects) => rects,
                    Err(e) => {
                        // A failed update still replaces the previous gesture's rects.
                        self.index.update_rects(Vec::new())?;
                        return Err(e);
                    }
                };
                self.index.update_rects(rects)?;
                Ok(SnappingResponse::Updated)
            }
            SnappingRequest::Query(query) => {
                Ok(SnappingResponse::Candidates(self.index.query_snapping(&query)))
            }
            SnappingRequest::Snap(query) => Ok(SnappingResponse::Snapped(self.index.snap(&query))),
        }
    }
}

// ─── Grid ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GridRequest {
    pub nodes_json: String,
    pub canvas_width: f64,
}

/// Stateless: answers with GridLayout JSON text.
pub struct GridService {
    options: GridOptions,
}

impl GridService {
    pub fn new(options: GridOptions) -> Result<Self, VectraError> {
        options.validate()?;
        Ok(GridService { options })
    }
}

impl Service for GridService {
    type Request = GridRequest;
    type Response = String;
    const NAME: &'static str = "grid";

    fn handle(&mut self, request: GridRequest) -> Result<String, VectraError> {
        let rects = parse_rects(&request.nodes_json)?;
        let layout = absolute_to_grid(&rects, request.canvas_width, &self.options)?;
        Ok(serde_json::to_string(&layout)?)
    }
}

// ─── Compile ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Host-side element id, echoed back untouched.
    pub id: String,
    pub source: String,
}

#[derive(Debug)]
pub struct CompileResponse {
    pub id: String,
    pub output: Result<String, VectraError>,
}

/// Builds a fresh `C` for every request; no compiler outlives its call.
pub struct CompileService<C> {
    _compiler: PhantomData<fn() -> C>,
}

impl<C> Default for CompileService<C> {
    fn default() -> Self {
        CompileService {
            _compiler: PhantomData,
        }
    }
}

impl<C: Compiler + Default + 'static> Service for CompileService<C> {
    type Request = CompileRequest;
    type Response = CompileResponse;
    const NAME: &'static str = "compile";

    fn handle(&mut self, request: CompileRequest) -> Result<CompileResponse, VectraError> {
        let output = C::default().compile(&request.source);
        if let Err(e) = &output {
            tracing::debug!(id = %request.id, error = %e, "compile failed");
        }
        Ok(CompileResponse {
            id: request.id,
            output,
        })
    }
}
