use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Analysis profile requested from the chemistry tool-servers.
///
/// `creative` favours broad, speculative candidate generation,
/// `rigorous` favours tight convergence criteria, and `adaptive` lets
/// each server pick per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Creative,
    Adaptive,
    Rigorous,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Creative => "creative",
            Mode::Adaptive => "adaptive",
            Mode::Rigorous => "rigorous",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "creative" => Some(Mode::Creative),
            "adaptive" => Some(Mode::Adaptive),
            "rigorous" => Some(Mode::Rigorous),
            _ => None,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Adaptive
    }
}

/// One cached discovery, keyed by composition formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub formula: String,
    pub properties: Value,
    pub timestamp: DateTime<Utc>,
}

/// One append-only provenance log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [Mode::Creative, Mode::Adaptive, Mode::Rigorous] {
            assert_eq!(Mode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(Mode::from_str("exhaustive"), None);
    }

    #[test]
    fn role_rejects_unknown_values() {
        assert_eq!(MessageRole::from_str("tool"), None);
    }
}
