use super::StoreError;
use crate::domain::types::ChatMessage;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Persists one JSON chat-history file per session id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let path = self.session_path(session_id);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Decode {
                path,
                source,
            }),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    pub fn save(&self, session_id: &str, messages: &[ChatMessage]) -> Result<(), StoreError> {
        let path = self.session_path(session_id);
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        let payload =
            serde_json::to_string_pretty(messages).map_err(|source| StoreError::Encode {
                path: path.clone(),
                source,
            })?;
        debug!(session_id, path = %path.display(), messages = messages.len(), "session history saved");
        fs::write(&path, payload).map_err(|source| StoreError::Write { path, source })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        let safe: String = session_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}
