//! # Engine
//!
//! The four workers behind one handle, with an async method per call the
//! host can make. Each method queues a message on the owning worker and
//! awaits the reply; calls to different workers are independent and carry
//! no ordering guarantee relative to each other.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::export::TsxCompiler;
use crate::model::Rect;
use crate::snapping::{SnapCandidate, SnapQuery, SnapResult};
use crate::worker::services::{
    CompileRequest, CompileResponse, CompileService, GridRequest, GridService, HistoryRequest,
    HistoryResponse, HistoryService, SnappingRequest, SnappingResponse, SnappingService,
};
use crate::worker::{Pending, Service, WorkerHandle};
use crate::VectraError;

pub struct Engine {
    history: WorkerHandle<HistoryService>,
    snapping: WorkerHandle<SnappingService>,
    grid: WorkerHandle<GridService>,
    compiler: WorkerHandle<CompileService<TsxCompiler>>,
}

impl Engine {
    /// Start all workers. Component configuration is validated on each
    /// worker thread, so a bad section disables only that worker.
    pub fn spawn(config: EngineConfig) -> Result<Self, VectraError> {
        let EngineConfig {
            history,
            snapping,
            grid,
            worker,
        } = config;

        Ok(Engine {
            history: WorkerHandle::spawn(move || HistoryService::new(history), &worker)?,
            snapping: WorkerHandle::spawn(move || SnappingService::new(&snapping), &worker)?,
            grid: WorkerHandle::spawn(move || GridService::new(grid), &worker)?,
            compiler: WorkerHandle::spawn(|| Ok(CompileService::default()), &worker)?,
        })
    }

    // ─── History ────────────────────────────────────────────────

    pub async fn init_history(&self, initial: Value) -> Result<(), VectraError> {
        match self.history.call(HistoryRequest::Init(initial)).await.result? {
            HistoryResponse::Ready => Ok(()),
            other => Err(unexpected::<HistoryService, _>(&other)),
        }
    }

    pub async fn push(&self, document: Value) -> Result<(), VectraError> {
        match self.history.call(HistoryRequest::Push(document)).await.result? {
            HistoryResponse::Pushed => Ok(()),
            other => Err(unexpected::<HistoryService, _>(&other)),
        }
    }

    pub async fn undo(&self) -> Result<Option<String>, VectraError> {
        self.history_document(HistoryRequest::Undo).await
    }

    pub async fn redo(&self) -> Result<Option<String>, VectraError> {
        self.history_document(HistoryRequest::Redo).await
    }

    pub async fn can_undo(&self) -> Result<bool, VectraError> {
        self.history_flag(HistoryRequest::CanUndo).await
    }

    pub async fn can_redo(&self) -> Result<bool, VectraError> {
        self.history_flag(HistoryRequest::CanRedo).await
    }

    pub async fn memory_usage(&self) -> Result<usize, VectraError> {
        match self.history.call(HistoryRequest::MemoryUsage).await.result? {
            HistoryResponse::MemoryUsage(bytes) => Ok(bytes),
            other => Err(unexpected::<HistoryService, _>(&other)),
        }
    }

    async fn history_document(&self, request: HistoryRequest) -> Result<Option<String>, VectraError> {
        match self.history.call(request).await.result? {
            HistoryResponse::Document(doc) => Ok(doc),
            other => Err(unexpected::<HistoryService, _>(&other)),
        }
    }

    async fn history_flag(&self, request: HistoryRequest) -> Result<bool, VectraError> {
        match self.history.call(request).await.result? {
            HistoryResponse::Flag(flag) => Ok(flag),
            other => Err(unexpected::<HistoryService, _>(&other)),
        }
    }

    // ─── Snapping ───────────────────────────────────────────────

    pub async fn update_rects(&self, rects: Vec<Rect>) -> Result<(), VectraError> {
        match self.snapping.call(SnappingRequest::UpdateRects(rects)).await.result? {
            SnappingResponse::Updated => Ok(()),
            other => Err(unexpected::<SnappingService, _>(&other)),
        }
    }

    pub async fn query_snapping(&self, query: SnapQuery) -> Result<Vec<SnapCandidate>, VectraError> {
        match self.snapping.call(SnappingRequest::Query(query)).await.result? {
            SnappingResponse::Candidates(found) => Ok(found),
            other => Err(unexpected::<SnappingService, _>(&other)),
        }
    }

    pub async fn snap(&self, query: SnapQuery) -> Result<SnapResult, VectraError> {
        match self.snapping.call(SnappingRequest::Snap(query)).await.result? {
            SnappingResponse::Snapped(result) => Ok(result),
            other => Err(unexpected::<SnappingService, _>(&other)),
        }
    }

    // ─── Grid ───────────────────────────────────────────────────

    /// GridLayout JSON text, or the error describing why inference failed.
    pub async fn absolute_to_grid(
        &self,
        nodes_json: String,
        canvas_width: f64,
    ) -> Result<String, VectraError> {
        self.grid
            .call(GridRequest {
                nodes_json,
                canvas_width,
            })
            .await
            .result
    }

    // ─── Compile ────────────────────────────────────────────────

    /// Queue a compile without waiting, so the caller can record the
    /// request id before the reply arrives.
    pub async fn submit_compile(
        &self,
        id: impl Into<String>,
        source: impl Into<String>,
    ) -> Pending<CompileResponse> {
        self.compiler
            .submit(CompileRequest {
                id: id.into(),
                source: source.into(),
            })
            .await
    }

    pub async fn compile(
        &self,
        id: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<CompileResponse, VectraError> {
        self.submit_compile(id, source).await.wait().await.result
    }
}

fn unexpected<S: Service, R: std::fmt::Debug>(reply: &R) -> VectraError {
    VectraError::Protocol {
        worker: S::NAME,
        detail: format!("{:?}", reply),
    }
}
