use super::StoreError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_SECTIONS: &[&str] = &["Preferences", "Discoveries", "Notes"];

/// The user's long-lived memory document.
///
/// A single markdown file with `## Section` headings and one entry per
/// line. Loaded fully, mutated in memory, rewritten in full on every
/// append. Search is linear substring matching.
#[derive(Debug)]
pub struct UserMemory {
    path: PathBuf,
    sections: Vec<MemorySection>,
}

#[derive(Debug, Clone)]
struct MemorySection {
    name: String,
    entries: Vec<String>,
}

impl UserMemory {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let sections = match fs::read_to_string(&path) {
            Ok(content) => parse_sections(&content),
            Err(source) if source.kind() == io::ErrorKind::NotFound => DEFAULT_SECTIONS
                .iter()
                .map(|name| MemorySection {
                    name: name.to_string(),
                    entries: Vec::new(),
                })
                .collect(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };
        debug!(path = %path.display(), sections = sections.len(), "user memory loaded");
        Ok(Self { path, sections })
    }

    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|section| section.name.eq_ignore_ascii_case(name))
            .map(|section| section.entries.as_slice())
    }

    /// Append one entry line to a section, creating the section if it
    /// does not exist yet, and rewrite the file.
    pub fn append(&mut self, section: &str, entry: impl Into<String>) -> Result<(), StoreError> {
        let entry = entry.into();
        match self
            .sections
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(section))
        {
            Some(existing) => existing.entries.push(entry),
            None => self.sections.push(MemorySection {
                name: section.to_string(),
                entries: vec![entry],
            }),
        }
        self.save()
    }

    /// Case-insensitive substring search over every entry.
    /// Returns `(section, entry)` pairs.
    pub fn search(&self, needle: &str) -> Vec<(String, String)> {
        let needle = needle.to_lowercase();
        let mut hits = Vec::new();
        for section in &self.sections {
            for entry in &section.entries {
                if entry.to_lowercase().contains(&needle) {
                    hits.push((section.name.clone(), entry.clone()));
                }
            }
        }
        hits
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str("## ");
            out.push_str(&section.name);
            out.push('\n');
            for entry in &section.entries {
                out.push_str("- ");
                out.push_str(entry);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, self.render()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn parse_sections(content: &str) -> Vec<MemorySection> {
    let mut sections: Vec<MemorySection> = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix("## ") {
            sections.push(MemorySection {
                name: name.trim().to_string(),
                entries: Vec::new(),
            });
        } else if !trimmed.is_empty() {
            let entry = trimmed.strip_prefix("- ").unwrap_or(trimmed).to_string();
            match sections.last_mut() {
                Some(section) => section.entries.push(entry),
                // Preamble lines before the first heading.
                None => sections.push(MemorySection {
                    name: "Notes".to_string(),
                    entries: vec![entry],
                }),
            }
        }
    }
    if sections.is_empty() {
        sections = DEFAULT_SECTIONS
            .iter()
            .map(|name| MemorySection {
                name: name.to_string(),
                entries: Vec::new(),
            })
            .collect();
    }
    sections
}
