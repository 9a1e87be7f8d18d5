use crate::application::memory::StoreError;
use crate::domain::types::ProvenanceEvent;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SESSION_START: &str = "session_start";
pub const SESSION_END: &str = "session_end";
pub const TOOL_START: &str = "tool_start";
pub const TOOL_FIRST_BYTE: &str = "tool_first_byte";
pub const TOOL_END: &str = "tool_end";
pub const MATERIAL_FOUND: &str = "material_found";

/// Append-only JSONL log of one discovery session.
///
/// Every event is written to disk as it is recorded; the in-memory copy
/// exists only so a summary can be derived at session end.
#[derive(Debug)]
pub struct ProvenanceRecorder {
    path: PathBuf,
    events: Vec<ProvenanceEvent>,
}

impl ProvenanceRecorder {
    pub fn create(dir: &Path, session_id: &str) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("session-{session_id}.jsonl"));
        debug!(path = %path.display(), "provenance log opened");
        Ok(Self {
            path,
            events: Vec::new(),
        })
    }

    pub fn record(&mut self, kind: &str, data: Value) -> Result<(), StoreError> {
        let event = ProvenanceEvent {
            timestamp: Utc::now(),
            kind: kind.to_string(),
            data,
        };
        let line = serde_json::to_string(&event).map_err(|source| StoreError::Encode {
            path: self.path.clone(),
            source,
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        writeln!(file, "{line}").map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[ProvenanceEvent] {
        &self.events
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a previously written provenance log. Malformed lines are
/// skipped rather than failing the whole read.
pub fn read_events(path: &Path) -> Result<Vec<ProvenanceEvent>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolTiming {
    pub calls: u64,
    pub failures: u64,
    pub total_ms: u64,
    pub avg_ms: u64,
    pub avg_first_byte_ms: Option<u64>,
}

/// Post-session view over the raw event stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSummary {
    pub materials_found: u64,
    pub tool_calls: u64,
    pub per_tool: BTreeMap<String, ToolTiming>,
    pub wall_ms: u64,
}

impl SessionSummary {
    pub fn from_events(events: &[ProvenanceEvent]) -> Self {
        let mut summary = SessionSummary::default();
        let mut first_byte_totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for event in events {
            match event.kind.as_str() {
                MATERIAL_FOUND => summary.materials_found += 1,
                TOOL_END => {
                    let tool = event
                        .data
                        .get("tool")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    let duration = event
                        .data
                        .get("duration_ms")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    let success = event
                        .data
                        .get("success")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    summary.tool_calls += 1;
                    let timing = summary.per_tool.entry(tool).or_default();
                    timing.calls += 1;
                    if !success {
                        timing.failures += 1;
                    }
                    timing.total_ms += duration;
                    timing.avg_ms = timing.total_ms / timing.calls;
                }
                TOOL_FIRST_BYTE => {
                    let tool = event
                        .data
                        .get("tool")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    let elapsed = event
                        .data
                        .get("elapsed_ms")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    let slot = first_byte_totals.entry(tool).or_default();
                    slot.0 += elapsed;
                    slot.1 += 1;
                }
                _ => {}
            }
        }

        for (tool, (total, count)) in first_byte_totals {
            if count > 0 {
                summary
                    .per_tool
                    .entry(tool)
                    .or_default()
                    .avg_first_byte_ms = Some(total / count);
            }
        }

        if let (Some(first), Some(last)) = (events.first(), events.last()) {
            let span = last.timestamp - first.timestamp;
            summary.wall_ms = span.num_milliseconds().max(0) as u64;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: &str, data: Value) -> ProvenanceEvent {
        ProvenanceEvent {
            timestamp: Utc::now(),
            kind: kind.to_string(),
            data,
        }
    }

    #[test]
    fn summary_aggregates_per_tool_timing() {
        let events = vec![
            event(SESSION_START, json!({})),
            event(TOOL_END, json!({"tool": "evaluate_energy", "duration_ms": 100, "success": true})),
            event(TOOL_END, json!({"tool": "evaluate_energy", "duration_ms": 300, "success": false})),
            event(MATERIAL_FOUND, json!({"formula": "BaTiO3"})),
            event(SESSION_END, json!({})),
        ];

        let summary = SessionSummary::from_events(&events);
        assert_eq!(summary.materials_found, 1);
        assert_eq!(summary.tool_calls, 2);
        let timing = summary.per_tool.get("evaluate_energy").expect("tool timing");
        assert_eq!(timing.calls, 2);
        assert_eq!(timing.failures, 1);
        assert_eq!(timing.total_ms, 400);
        assert_eq!(timing.avg_ms, 200);
    }

    #[test]
    fn summary_of_empty_stream_is_zeroed() {
        let summary = SessionSummary::from_events(&[]);
        assert_eq!(summary.tool_calls, 0);
        assert_eq!(summary.wall_ms, 0);
    }
}
