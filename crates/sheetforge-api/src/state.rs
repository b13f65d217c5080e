//! Shared application state.

use sheetforge_engine::GangsheetService;
use std::sync::Arc;

pub struct AppState {
    pub service: Arc<GangsheetService>,
}

impl AppState {
    pub fn new(service: Arc<GangsheetService>) -> Self {
        Self { service }
    }
}
