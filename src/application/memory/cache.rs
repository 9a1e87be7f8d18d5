use super::StoreError;
use crate::domain::types::CacheEntry;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Formula-keyed discovery cache.
///
/// The backing JSON file is read fully at construction and rewritten in
/// full on every insert; last write wins. Entries are never evicted.
#[derive(Debug)]
pub struct DiscoveryCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl DiscoveryCache {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StoreError::Decode {
                    path: path.clone(),
                    source,
                })?
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "discovery cache loaded");
        Ok(Self { path, entries })
    }

    pub fn get(&self, formula: &str) -> Option<&CacheEntry> {
        self.entries.get(formula)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record properties for a formula, stamping the current time, and
    /// rewrite the backing file.
    pub fn insert(&mut self, formula: impl Into<String>, properties: Value) -> Result<(), StoreError> {
        let formula = formula.into();
        let entry = CacheEntry {
            formula: formula.clone(),
            properties,
            timestamp: Utc::now(),
        };
        self.entries.insert(formula, entry);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let payload =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StoreError::Encode {
                path: self.path.clone(),
                source,
            })?;
        fs::write(&self.path, payload).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
