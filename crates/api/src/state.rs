use std::sync::Arc;

use testimony_core::clip_time::ClipTimeThresholds;
use testimony_db::ClipStore;
use tokio::sync::RwLock;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The loaded clip collection. Review actions take the write lock for
    /// the whole read-modify-persist cycle.
    pub store: Arc<RwLock<ClipStore>>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: ClipStore, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
        }
    }

    pub fn thresholds(&self) -> &ClipTimeThresholds {
        &self.config.thresholds
    }
}
