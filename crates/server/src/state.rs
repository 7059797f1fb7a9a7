use std::sync::Arc;

use funil_core::{ApplicationGate, Config, ProcessStore, StageRegistry, TransitionEngine};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<dyn StageRegistry>,
    processes: Arc<dyn ProcessStore>,
    engine: TransitionEngine,
    gate: ApplicationGate,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: Arc<dyn StageRegistry>,
        processes: Arc<dyn ProcessStore>,
        engine: TransitionEngine,
        gate: ApplicationGate,
    ) -> Self {
        Self {
            config,
            registry,
            processes,
            engine,
            gate,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &dyn StageRegistry {
        self.registry.as_ref()
    }

    pub fn processes(&self) -> &dyn ProcessStore {
        self.processes.as_ref()
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn gate(&self) -> &ApplicationGate {
        &self.gate
    }
}
