use crate::application::memory::{DiscoveryCache, StoreError, UserMemory};
use crate::application::modes::ModeManager;
use crate::application::provenance::{self, ProvenanceRecorder};
use crate::application::resilience::{ResilientCaller, TimeoutPolicy};
use crate::config::AppConfig;
use serde_json::json;
use std::sync::Mutex;
use tracing::info;

/// Everything one discovery session mutates, carried explicitly through
/// the call chain instead of living in process-wide globals.
pub struct DiscoveryContext {
    pub modes: ModeManager,
    pub resilience: ResilientCaller,
    pub cache: Mutex<DiscoveryCache>,
    pub memory: Mutex<UserMemory>,
    pub provenance: Mutex<ProvenanceRecorder>,
}

impl DiscoveryContext {
    /// Open all session stores and start the provenance log.
    pub fn initialise(config: &AppConfig, session_id: &str) -> Result<Self, StoreError> {
        let cache = DiscoveryCache::load(&config.paths.cache_file)?;
        let memory = UserMemory::load(&config.paths.memory_file)?;
        let mut recorder = ProvenanceRecorder::create(&config.paths.provenance_dir, session_id)?;
        recorder.record(
            provenance::SESSION_START,
            json!({
                "session_id": session_id,
                "mode": config.modes.default.as_str(),
            }),
        )?;

        info!(
            session_id,
            mode = config.modes.default.as_str(),
            cached_discoveries = cache.len(),
            "discovery context initialised"
        );

        Ok(Self {
            modes: ModeManager::with_lock(config.modes.default, config.modes.locked),
            resilience: ResilientCaller::new(
                TimeoutPolicy::with_overrides(config.resilience.timeouts.clone()),
                config.resilience.max_retries,
            ),
            cache: Mutex::new(cache),
            memory: Mutex::new(memory),
            provenance: Mutex::new(recorder),
        })
    }
}
