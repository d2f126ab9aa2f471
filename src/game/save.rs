//! # Save Files
//!
//! Career persistence under `~/.paddock/saves/` (or a configured override).
//!
//! Each save is a JSON file (`<uuid>.json`) plus a lightweight index
//! (`saves.json`) that avoids loading every file just to find the latest.
//!
//! All writes use atomic rename (write `.tmp`, then `rename()`) for crash
//! safety. The navigation core never sees any of this — save/load arrive as
//! opaque named actions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::game::actions::Horse;

/// Summary metadata for a save (stored in the index file).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveMeta {
    pub id: String,
    pub horse_name: String,
    pub turn: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Full save data: metadata + the career record.
#[derive(Serialize, Deserialize, Debug)]
pub struct SaveData {
    pub meta: SaveMeta,
    pub horse: Horse,
}

/// Index of all saves, most recently updated first.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct SaveIndex {
    pub saves: Vec<SaveMeta>,
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Disk store rooted at one save directory.
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// A store at `dir`, or the default `~/.paddock/saves/` when `None`.
    pub fn new(dir: Option<PathBuf>) -> io::Result<Self> {
        let dir = match dir {
            Some(d) => d,
            None => {
                let home = dirs::home_dir()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
                home.join(".paddock").join("saves")
            }
        };
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("saves.json")
    }

    fn save_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write `horse` under `id` (a fresh UUID when `None`) and update the
    /// index. Returns the id used.
    pub fn save(&self, horse: &Horse, id: Option<&str>) -> io::Result<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = Utc::now().timestamp();

        let existing = self.load(&id).ok().map(|d| d.meta);
        let meta = SaveMeta {
            id: id.clone(),
            horse_name: horse.name.clone(),
            turn: horse.turn,
            created_at: existing.map(|m| m.created_at).unwrap_or(now),
            updated_at: now,
        };

        let data = SaveData { meta: meta.clone(), horse: horse.clone() };
        atomic_write_json(&self.save_path(&id), &data)?;

        let mut index = self.load_index().unwrap_or_default();
        index.saves.retain(|s| s.id != id);
        index.saves.push(meta);
        index.saves.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        atomic_write_json(&self.index_path(), &index)?;

        debug!("Saved career {} (turn {})", id, horse.turn);
        Ok(id)
    }

    /// Load a save by id.
    pub fn load(&self, id: &str) -> io::Result<SaveData> {
        let json = fs::read_to_string(self.save_path(id))?;
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Load the most recently updated save, if any. A stale index entry
    /// whose file is gone is skipped with a warning.
    pub fn load_latest(&self) -> io::Result<Option<SaveData>> {
        let index = self.load_index().unwrap_or_default();
        for meta in &index.saves {
            match self.load(&meta.id) {
                Ok(data) => return Ok(Some(data)),
                Err(e) => warn!("Skipping unreadable save {}: {}", meta.id, e),
            }
        }
        Ok(None)
    }

    /// Load the save index from disk.
    pub fn load_index(&self) -> io::Result<SaveIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(SaveIndex::default());
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actions::Stats;

    fn temp_store() -> SaveStore {
        let dir = std::env::temp_dir()
            .join("paddock-tests")
            .join(uuid::Uuid::new_v4().to_string());
        SaveStore::new(Some(dir)).unwrap()
    }

    fn horse(name: &str, turn: u32) -> Horse {
        Horse {
            name: name.to_string(),
            stats: Stats::default(),
            turn,
            races_won: 0,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = temp_store();
        let id = store.save(&horse("Storm", 3), None).unwrap();
        let data = store.load(&id).unwrap();
        assert_eq!(data.horse.name, "Storm");
        assert_eq!(data.horse.turn, 3);
        assert_eq!(data.meta.horse_name, "Storm");
    }

    #[test]
    fn test_resave_keeps_id_and_created_at() {
        let store = temp_store();
        let id = store.save(&horse("Storm", 1), None).unwrap();
        let first = store.load(&id).unwrap();
        let id2 = store.save(&horse("Storm", 2), Some(&id)).unwrap();
        assert_eq!(id, id2);
        let second = store.load(&id).unwrap();
        assert_eq!(second.meta.created_at, first.meta.created_at);
        assert_eq!(second.horse.turn, 2);
        // Index holds one entry, not two.
        assert_eq!(store.load_index().unwrap().saves.len(), 1);
    }

    #[test]
    fn test_load_latest_prefers_most_recent() {
        let store = temp_store();
        let older = store.save(&horse("First", 1), None).unwrap();
        let newer = store.save(&horse("Second", 1), None).unwrap();

        // Force a deterministic ordering regardless of timestamp resolution.
        let mut index = store.load_index().unwrap();
        for meta in &mut index.saves {
            if meta.id == newer {
                meta.updated_at += 10;
            }
        }
        index.saves.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        atomic_write_json(&store.index_path(), &index).unwrap();

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.horse.name, "Second");
        assert_ne!(latest.meta.id, older);
    }

    #[test]
    fn test_load_latest_empty_store() {
        let store = temp_store();
        assert!(store.load_latest().unwrap().is_none());
    }
}
