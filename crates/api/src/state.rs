//! Application state shared across handlers.

use clickhouse_client::RecordStore;
use std::sync::Arc;
use utm_core::Depth;

use crate::refresh::RefreshCoordinator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record store (ClickHouse in production, in-memory in tests)
    pub store: Arc<dyn RecordStore>,
    /// Latest-wins publication of rendered views
    pub refresh: Arc<RefreshCoordinator>,
    /// Depth used when a request names none
    pub default_depth: Depth,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_default_depth(store, Depth::default())
    }

    pub fn with_default_depth(store: Arc<dyn RecordStore>, default_depth: Depth) -> Self {
        Self {
            store,
            refresh: Arc::new(RefreshCoordinator::new()),
            default_depth,
        }
    }
}
