// File-backed store behaviour: discovery cache round-trips, markdown
// user memory, and per-session history persistence.

use crucible::memory::{DiscoveryCache, SessionStore, UserMemory};
use crucible::types::{ChatMessage, MessageRole};
use serde_json::json;
use std::fs;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn cache_round_trips_properties_with_newer_timestamp() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cache").join("discoveries.json");

    let mut cache = DiscoveryCache::load(&path).expect("empty cache");
    assert!(cache.is_empty());

    let first_properties = json!({"energy_per_atom": -6.1, "space_group": 221});
    cache
        .insert("SrTiO3", first_properties.clone())
        .expect("first insert");
    let first_timestamp = cache.get("SrTiO3").expect("entry").timestamp;

    // Last write wins and must carry a strictly newer timestamp.
    thread::sleep(Duration::from_millis(10));
    let second_properties = json!({"energy_per_atom": -6.4, "space_group": 221});
    cache
        .insert("SrTiO3", second_properties.clone())
        .expect("second insert");

    let entry = cache.get("SrTiO3").expect("entry");
    assert_eq!(entry.properties, second_properties);
    assert!(entry.timestamp > first_timestamp);

    // Reload from disk: identical properties survive the rewrite.
    let reloaded = DiscoveryCache::load(&path).expect("reload");
    assert_eq!(reloaded.len(), 1);
    assert_eq!(
        reloaded.get("SrTiO3").expect("entry").properties,
        second_properties
    );
}

#[test]
fn cache_rejects_corrupt_backing_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("discoveries.json");
    fs::write(&path, "not json at all").expect("write corrupt file");

    assert!(DiscoveryCache::load(&path).is_err());
}

#[test]
fn user_memory_appends_and_searches_sections() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("memory.md");

    let mut memory = UserMemory::load(&path).expect("fresh memory");
    memory
        .append("Preferences", "prefers lead-free perovskites")
        .expect("append preference");
    memory
        .append("Discoveries", "CsSnI3 relaxed to -5.2 eV/atom")
        .expect("append discovery");

    let hits = memory.search("cssni3");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "Discoveries");

    // Reload and confirm the document survived the rewrite.
    let reloaded = UserMemory::load(&path).expect("reload");
    let preferences = reloaded.section("Preferences").expect("section");
    assert_eq!(preferences, ["prefers lead-free perovskites"]);
    assert_eq!(reloaded.search("nothing-here").len(), 0);
}

#[test]
fn user_memory_creates_unknown_sections_on_append() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("memory.md");

    let mut memory = UserMemory::load(&path).expect("fresh memory");
    memory
        .append("Failed Candidates", "Na3Cl rejected by validity screen")
        .expect("append");

    let reloaded = UserMemory::load(&path).expect("reload");
    let section = reloaded.section("Failed Candidates").expect("new section");
    assert_eq!(section.len(), 1);
}

#[test]
fn session_store_round_trips_history() {
    let dir = tempdir().expect("tempdir");
    let store = SessionStore::new(dir.path().join("sessions"));

    assert!(store.load("fresh").expect("missing is empty").is_empty());

    let history = vec![
        ChatMessage::new(MessageRole::User, "screen KNbO3"),
        ChatMessage::new(MessageRole::Assistant, "valid and charge balanced"),
    ];
    store.save("run-42", &history).expect("save");

    let restored = store.load("run-42").expect("load");
    assert_eq!(restored, history);
}

#[test]
fn session_store_sanitises_ids_for_filenames() {
    let dir = tempdir().expect("tempdir");
    let store = SessionStore::new(dir.path().join("sessions"));

    let history = vec![ChatMessage::new(MessageRole::User, "hello")];
    store.save("../escape/attempt", &history).expect("save");

    // Nothing outside the session directory, and the history loads back
    // under the same id.
    assert!(!dir.path().join("escape").exists());
    assert_eq!(store.load("../escape/attempt").expect("load"), history);
}
