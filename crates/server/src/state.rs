use crate::config::ServerConfig;
use decoupage::{EngineHandle, GeoEngine};
use std::sync::Arc;

/// Shared application state
#[derive(Clone, Debug)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Current engine; handlers take one snapshot per request
    pub engine: EngineHandle,
}

impl ServerState {
    /// Create new server state, loading the dataset named by `config`.
    ///
    /// A snapshot that fails to load is fatal: the server never starts
    /// without data.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let engine = GeoEngine::load(&config.engine_config()?)?;
        Ok(Self::with_engine(config, engine))
    }

    /// State over an already built engine.
    pub fn with_engine(config: ServerConfig, engine: GeoEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine: EngineHandle::new(engine),
        }
    }
}
