//! WebAssembly bindings for the editing session.
//!
//! The page shell mounts a [`WasmEditor`] per editor view and drops it (after
//! calling `teardown`) on unmount.

use wasm_bindgen::prelude::*;

use crate::upload::KnownDimensions;
use crate::{EditingSession, ToolAction};

/// Initialize the editor WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Editing session handle for JavaScript.
#[wasm_bindgen]
pub struct WasmEditor {
    session: EditingSession,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Mount an editor on a surface of the given size.
    ///
    /// # Errors
    ///
    /// Returns an error string if the session cannot start.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> Result<WasmEditor, String> {
        let session = EditingSession::new(width, height).map_err(|e| e.to_string())?;
        Ok(Self { session })
    }

    /// Run a tool action given as JSON, returning the outcome as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string for malformed JSON or a rejected action.
    pub fn dispatch(&mut self, action_json: &str) -> Result<String, String> {
        let action: ToolAction = serde_json::from_str(action_json).map_err(|e| e.to_string())?;
        let outcome = self.session.dispatch(action).map_err(|e| e.to_string())?;
        serde_json::to_string(&outcome).map_err(|e| e.to_string())
    }

    /// Add an uploaded file whose dimensions the browser already decoded.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file is rejected.
    #[wasm_bindgen(js_name = addUpload)]
    pub fn add_upload(
        &mut self,
        mime: &str,
        bytes: &[u8],
        width: u32,
        height: u32,
    ) -> Result<String, String> {
        self.session
            .add_upload(mime, bytes, &KnownDimensions(width, height))
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Add a generated image given as a data URI.
    ///
    /// # Errors
    ///
    /// Returns an error string if the URI is not an accepted image.
    #[wasm_bindgen(js_name = addDataUri)]
    pub fn add_data_uri(&mut self, uri: &str, width: u32, height: u32) -> Result<String, String> {
        self.session
            .add_data_uri(uri, &KnownDimensions(width, height))
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Queue a container resize; `at_ms` is `performance.now()`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the size is out of range.
    #[wasm_bindgen(js_name = requestResize)]
    pub fn request_resize(&mut self, width: f32, height: f32, at_ms: f64) -> Result<(), String> {
        self.session
            .request_resize(width, height, to_millis(at_ms))
            .map_err(|e| e.to_string())
    }

    /// Apply a queued resize if it has settled. Returns whether the surface
    /// changed.
    #[wasm_bindgen(js_name = flushResize)]
    pub fn flush_resize(&mut self, now_ms: f64) -> bool {
        self.session.flush_resize(to_millis(now_ms))
    }

    /// Undo the last change.
    ///
    /// # Errors
    ///
    /// Returns an error string if the snapshot cannot be restored.
    pub fn undo(&mut self) -> Result<bool, String> {
        self.session.undo().map_err(|e| e.to_string())
    }

    /// Current session view as JSON.
    #[wasm_bindgen(js_name = viewJson)]
    #[must_use]
    pub fn view_json(&self) -> String {
        serde_json::to_string(&self.session.view()).unwrap_or_default()
    }

    /// Dismiss a notice.
    #[wasm_bindgen(js_name = dismissNotice)]
    pub fn dismiss_notice(&mut self, id: u32) -> bool {
        self.session.dismiss_notice(id)
    }

    /// Tear the session down.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_millis(ms: f64) -> u64 {
    ms.max(0.0) as u64
}
