#![deny(warnings)]

//! Persistence gateway: the versioned save blob and the stores that hold it.
//!
//! Only replayable facts are serialized: ledger quantities, `(id, level)`
//! pairs, achievement flags, and a minimal snapshot of derived statistics
//! that cannot be recomputed from upgrade levels alone. Cost curves,
//! descriptions, and effects are code, not data.

use chrono::{DateTime, Utc};
use game_core::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Versioned storage key. Incompatible schema changes bump the suffix
/// instead of migrating old data; old-keyed blobs are simply ignored,
/// which is equivalent to a fresh game.
pub const SAVE_KEY: &str = "starfall-save-v2";

/// Errors surfaced by a save store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("save io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("save encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted upgrade level for one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevel {
    pub id: String,
    pub level: u32,
}

/// Persisted unlock flag for one achievement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementFlag {
    pub id: String,
    pub unlocked: bool,
}

/// The small subset of derived statistics that is saved rather than
/// replayed: values with a stochastic history that defaults cannot
/// reproduce. Kept deliberately minimal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default = "default_market_multiplier")]
    pub market_multiplier: f64,
}

fn default_market_multiplier() -> f64 {
    1.0
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            market_multiplier: default_market_multiplier(),
        }
    }
}

/// The whole persisted blob. Every field defaults so a blob written by an
/// older schema (or a partially corrupt one) still loads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(default)]
    pub current: BTreeMap<ResourceKind, f64>,
    #[serde(default)]
    pub lifetime: BTreeMap<ResourceKind, f64>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeLevel>,
    #[serde(default)]
    pub achievements: Vec<AchievementFlag>,
    #[serde(default)]
    pub stats: StatsSnapshot,
    /// Diagnostic only; never read back into game state.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Durable backing for the save blob.
///
/// Stores are best-effort: the engine treats a load failure as a fresh
/// game and logs save failures without interrupting play.
pub trait SaveStore {
    /// Read the blob, if any. A missing or unparsable blob is `Ok(None)`.
    fn load(&self) -> Result<Option<SaveData>, StoreError>;
    /// Write the blob. Called write-through after every mutation.
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError>;
    /// Delete the blob (explicit user-confirmed reset).
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// File-backed store: one JSON document at `<dir>/<SAVE_KEY>.json`.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SAVE_KEY}.json")),
        }
    }

    /// Full path of the blob file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&text) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                // Corrupt data means a fresh game, never a crash.
                warn!(path = %self.path.display(), error = %e, "unreadable save blob; ignoring");
                Ok(None)
            }
        }
    }

    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(data)?;
        // Write to a sibling temp file first so an interrupted write can
        // never truncate the existing blob.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store holding the serialized blob, used by tests and the
/// headless tester. Round-trips through JSON so schema problems surface
/// in tests exactly as they would on disk.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw blob contents, for assertions on the serialized form.
    pub fn raw(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Pre-seed the store with an arbitrary blob (schema-tolerance tests).
    pub fn with_raw(blob: &str) -> Self {
        Self {
            blob: Some(blob.to_string()),
        }
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        match &self.blob {
            None => Ok(None),
            Some(text) => match serde_json::from_str(text) {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    warn!(error = %e, "unreadable save blob; ignoring");
                    Ok(None)
                }
            },
        }
    }

    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        self.blob = Some(serde_json::to_string(data)?);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.blob = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveData {
        let mut current = BTreeMap::new();
        current.insert(ResourceKind::Credits, 1234.5);
        current.insert(ResourceKind::Scrap, 10.0);
        let mut lifetime = BTreeMap::new();
        lifetime.insert(ResourceKind::Credits, 9999.0);
        SaveData {
            current,
            lifetime,
            upgrades: vec![UpgradeLevel {
                id: "appraisal".into(),
                level: 3,
            }],
            achievements: vec![AchievementFlag {
                id: "first_spark".into(),
                unlocked: true,
            }],
            stats: StatsSnapshot {
                market_multiplier: 1.25,
            },
            saved_at: None,
        }
    }

    #[test]
    fn memory_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        let back = store.load().unwrap().unwrap();
        assert_eq!(back, sample());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn empty_blob_loads_with_defaults() {
        let store = MemoryStore::with_raw("{}");
        let data = store.load().unwrap().unwrap();
        assert!(data.current.is_empty());
        assert!(data.upgrades.is_empty());
        assert_eq!(data.stats.market_multiplier, 1.0);
    }

    #[test]
    fn partial_blob_from_older_schema_loads() {
        let store = MemoryStore::with_raw(r#"{"current":{"Credits":50.0}}"#);
        let data = store.load().unwrap().unwrap();
        assert_eq!(data.current.get(&ResourceKind::Credits), Some(&50.0));
        assert!(data.achievements.is_empty());
    }

    #[test]
    fn corrupt_blob_is_treated_as_absent() {
        let store = MemoryStore::with_raw("not json at all {{{");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_roundtrip_and_clear() {
        let dir = std::env::temp_dir().join(format!("starfall-test-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert!(store.path().ends_with(format!("{SAVE_KEY}.json")));
        let back = store.load().unwrap().unwrap();
        assert_eq!(back, sample());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = std::env::temp_dir().join(format!("starfall-corrupt-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut store = FileStore::new(&dir);
        fs::write(store.path(), "garbage").unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
        let _ = fs::remove_dir_all(&dir);
    }
}
