//! Application state

use common::Config;
use game::{Identity, MissionRegistry, ProgressStore};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn Identity>,
    pub store: Arc<dyn ProgressStore>,
    pub missions: Arc<MissionRegistry>,
}

impl AppState {
    pub fn new(
        config: Config,
        identity: Arc<dyn Identity>,
        store: Arc<dyn ProgressStore>,
        missions: Arc<MissionRegistry>,
    ) -> Self {
        Self {
            config,
            identity,
            store,
            missions,
        }
    }
}
