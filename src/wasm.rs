//! JavaScript bindings for the browser build.

use wasm_bindgen::prelude::*;

use crate::model::Rect;
use crate::snapping::SnapQuery;
use crate::VectraError;

fn to_js(e: VectraError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

#[wasm_bindgen(js_name = HistoryManager)]
pub struct WasmHistory {
    inner: crate::HistoryManager,
}

#[wasm_bindgen(js_class = HistoryManager)]
impl WasmHistory {
    #[wasm_bindgen(constructor)]
    pub fn new(initial: String) -> WasmHistory {
        WasmHistory {
            inner: crate::HistoryManager::new(&initial),
        }
    }

    #[wasm_bindgen(js_name = pushState)]
    pub fn push_state(&mut self, json: String) {
        self.inner.push_state(&json);
    }

    pub fn undo(&mut self) -> Result<Option<String>, JsValue> {
        self.inner.undo().map_err(to_js)
    }

    pub fn redo(&mut self) -> Result<Option<String>, JsValue> {
        self.inner.redo().map_err(to_js)
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    #[wasm_bindgen(js_name = getMemoryUsage)]
    pub fn get_memory_usage(&self) -> usize {
        self.inner.get_memory_usage()
    }
}

#[wasm_bindgen(js_name = SnappingEngine)]
pub struct WasmSnapping {
    inner: crate::SnappingIndex,
}

#[wasm_bindgen(js_class = SnappingEngine)]
impl WasmSnapping {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmSnapping {
        WasmSnapping {
            inner: crate::SnappingIndex::new(),
        }
    }

    #[wasm_bindgen(js_name = updateRects)]
    pub fn update_rects(&mut self, rects: JsValue) -> Result<(), JsValue> {
        let rects: Vec<Rect> = serde_wasm_bindgen::from_value(rects)?;
        self.inner.update_rects(rects).map_err(to_js)
    }

    #[wasm_bindgen(js_name = querySnapping)]
    pub fn query_snapping(&self, x: f64, y: f64, w: f64, h: f64, threshold: f64) -> Result<JsValue, JsValue> {
        let found = self.inner.query_snapping(&SnapQuery::new(x, y, w, h, threshold));
        Ok(serde_wasm_bindgen::to_value(&found)?)
    }

    pub fn snap(&self, x: f64, y: f64, w: f64, h: f64, threshold: f64) -> Result<JsValue, JsValue> {
        let result = self.inner.snap(&SnapQuery::new(x, y, w, h, threshold));
        Ok(serde_wasm_bindgen::to_value(&result)?)
    }
}

impl Default for WasmSnapping {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_name = absoluteToGrid)]
pub fn absolute_to_grid(nodes_json: &str, canvas_width: f64) -> Result<String, JsValue> {
    crate::absolute_to_grid_json(nodes_json, canvas_width).map_err(to_js)
}

#[wasm_bindgen(js_name = compileComponent)]
pub fn compile_component(source: &str) -> Result<String, JsValue> {
    crate::compile_component(source).map_err(to_js)
}

#[wasm_bindgen(js_name = exportComponent)]
pub fn export_component(project_json: &str) -> Result<String, JsValue> {
    crate::export_component(project_json).map_err(to_js)
}
