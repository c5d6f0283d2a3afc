use std::sync::Arc;

use qrdrop_gate::UploadGate;
use qrdrop_store::ImageStore;
use qrdrop_types::{Clock, SystemClock};

use crate::config::ServerConfig;

/// Shared handler state. Cloning is a handful of reference-count bumps.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ImageStore>,
    pub gate: Arc<UploadGate>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn ImageStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// `clock` must be the same clock the store reads from.
    pub fn with_clock(
        config: ServerConfig,
        store: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = UploadGate::with_default_stages(config.gate_config());
        Self {
            store,
            gate: Arc::new(gate),
            clock,
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("images", &self.store.len())
            .field("gate_stages", &self.gate.stage_count())
            .field("config", &self.config)
            .finish()
    }
}
