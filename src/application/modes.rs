use crate::domain::types::Mode;
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Holds the active analysis mode and enforces it on outgoing tool
/// calls.
///
/// Not a process-wide singleton: each [`DiscoveryContext`] owns one,
/// so concurrent sessions cannot observe each other's mode changes.
///
/// [`DiscoveryContext`]: crate::application::context::DiscoveryContext
pub struct ModeManager {
    state: Mutex<ModeState>,
}

#[derive(Debug, Clone, Copy)]
struct ModeState {
    mode: Mode,
    locked: bool,
}

impl ModeManager {
    pub fn new(mode: Mode) -> Self {
        Self {
            state: Mutex::new(ModeState {
                mode,
                locked: false,
            }),
        }
    }

    pub fn with_lock(mode: Mode, locked: bool) -> Self {
        Self {
            state: Mutex::new(ModeState { mode, locked }),
        }
    }

    pub fn current(&self) -> Mode {
        self.state.lock().expect("mode state lock").mode
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().expect("mode state lock").locked
    }

    /// Switch mode by name. Unrecognized values and changes while
    /// locked are ignored with a warning; the prior mode stays active.
    pub fn set_mode(&self, value: &str) {
        let Some(mode) = Mode::from_str(value) else {
            warn!(value, "ignoring unrecognized analysis mode");
            return;
        };
        let mut state = self.state.lock().expect("mode state lock");
        if state.locked {
            warn!(
                requested = value,
                active = state.mode.as_str(),
                "mode is locked; ignoring change"
            );
            return;
        }
        debug!(from = state.mode.as_str(), to = value, "analysis mode changed");
        state.mode = mode;
    }

    pub fn lock(&self) {
        self.state.lock().expect("mode state lock").locked = true;
    }

    pub fn unlock(&self) {
        self.state.lock().expect("mode state lock").locked = false;
    }

    /// Force the active mode onto a tool-call argument object,
    /// overwriting whatever the agent supplied.
    pub fn apply(&self, arguments: &mut Value) {
        let mode = self.current();
        if arguments.is_null() {
            *arguments = Value::Object(Default::default());
        }
        let Some(map) = arguments.as_object_mut() else {
            return;
        };
        if let Some(requested) = map.get("mode").and_then(Value::as_str) {
            if requested != mode.as_str() {
                debug!(
                    requested,
                    enforced = mode.as_str(),
                    "overriding agent-supplied analysis mode"
                );
            }
        }
        map.insert(
            "mode".to_string(),
            Value::String(mode.as_str().to_string()),
        );
    }
}

impl Default for ModeManager {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}
