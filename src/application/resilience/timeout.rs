use std::collections::HashMap;
use std::time::Duration;

/// Fallback when neither the operation table nor the family table has
/// an entry.
pub const GLOBAL_DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Calls whose resolved timeout reaches this bound are considered too
/// expensive to rerun after a timeout; they get exactly one attempt.
pub const NO_RETRY_TIMEOUT_SECS: u64 = 60;

/// Per-`{family}_{operation}` timeouts, in seconds. Entries mirror the
/// observed latency envelope of each chemistry engine.
const OPERATION_TIMEOUTS: &[(&str, u64)] = &[
    ("structure_generate", 180),
    ("structure_refine", 90),
    ("energy_evaluate", 45),
    ("energy_relax", 150),
    ("validity_screen", 15),
    ("viz_render", 30),
];

/// Per-family fallbacks for operations the table does not name.
const FAMILY_TIMEOUTS: &[(&str, u64)] = &[
    ("structure", 240),
    ("energy", 60),
    ("validity", 20),
    ("viz", 45),
];

/// Static timeout table with optional config-supplied overrides.
///
/// Resolution order: override for `{family}_{operation}`, built-in
/// operation entry, built-in family entry, global default.
#[derive(Debug, Clone, Default)]
pub struct TimeoutPolicy {
    overrides: HashMap<String, u64>,
}

impl TimeoutPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<String, u64>) -> Self {
        Self { overrides }
    }

    pub fn resolve(&self, family: &str, operation: &str) -> Duration {
        let key = format!("{family}_{operation}");
        let secs = self
            .overrides
            .get(&key)
            .copied()
            .or_else(|| lookup(OPERATION_TIMEOUTS, &key))
            .or_else(|| lookup(FAMILY_TIMEOUTS, family))
            .unwrap_or(GLOBAL_DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}

fn lookup(table: &[(&str, u64)], key: &str) -> Option<u64> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, secs)| *secs)
}
