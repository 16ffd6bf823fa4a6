//! Shared application state for the HTTP server

use comai_rag::{Pipeline, PipelineHandle};
use std::sync::Arc;

use super::error::ApiError;

/// State handed to every route. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    handle: PipelineHandle,
}

impl AppState {
    pub fn new(handle: PipelineHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &PipelineHandle {
        &self.handle
    }

    /// The pipeline, or a 500 if startup failed.
    pub fn pipeline(&self) -> Result<&Arc<Pipeline>, ApiError> {
        Ok(self.handle.pipeline()?)
    }
}
