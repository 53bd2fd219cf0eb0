//! Durable snapshot storage on the local filesystem

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    error::{EngineError, Result},
    state::Snapshot,
};

/// JSON file holding the latest engine snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Read the stored snapshot. `Ok(None)` means nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<Snapshot>> {
        let contents = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EngineError::Persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let snapshot = serde_json::from_slice(&contents).map_err(|e| {
            EngineError::Persistence(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    /// Load the stored snapshot, falling back to an empty one when it is missing or unreadable
    pub async fn load_or_default(&self) -> Snapshot {
        match self.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    "Loaded {} timers and {} history records from {}",
                    snapshot.timers.len(),
                    snapshot.history.len(),
                    self.path.display()
                );
                snapshot
            }
            Ok(None) => {
                info!("No saved state at {}, starting empty", self.path.display());
                Snapshot::default()
            }
            Err(e) => {
                warn!("{}, starting empty", e);
                Snapshot::default()
            }
        }
    }

    /// Replace the stored snapshot.
    ///
    /// The write goes to a temporary file first and is renamed into place.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            EngineError::Persistence(format!("Failed to serialize snapshot: {}", e))
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                EngineError::Persistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, &json).await.map_err(|e| {
            EngineError::Persistence(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                warn!("Failed to remove {}: {}", tmp.display(), cleanup);
            }
            return Err(EngineError::Persistence(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    /// Delete the stored snapshot. Succeeds when nothing is stored.
    pub async fn purge(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Deleted saved state at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Persistence(format!(
                "Failed to delete {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineState;
    use chrono::Utc;

    fn sample_snapshot() -> Snapshot {
        let mut state = EngineState::new();
        let focus = state.add("Focus", 2, "Work").unwrap();
        state.add("Nap", 30, "Rest").unwrap();
        state.start(focus.id).unwrap();
        state.tick(Utc::now());
        state.tick(Utc::now());
        state.snapshot()
    }

    #[tokio::test]
    async fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("timers.json"));

        let snapshot = sample_snapshot();
        assert_eq!(snapshot.history.len(), 1);
        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(snapshot));

        store.save(&Snapshot::default()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Snapshot::default()));
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("timers.json"));
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(store.load_or_default().await, Snapshot::default());

        std::fs::write(store.path(), b"{ not json").unwrap();
        assert!(matches!(store.load().await, Err(EngineError::Persistence(_))));
        assert_eq!(store.load_or_default().await, Snapshot::default());
    }

    #[tokio::test]
    async fn purge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("timers.json"));
        store.purge().await.unwrap();

        store.save(&sample_snapshot()).await.unwrap();
        store.purge().await.unwrap();
        assert!(!store.path().exists());
        store.purge().await.unwrap();
    }

    #[tokio::test]
    async fn save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file makes the rename fail
        let path = dir.path().join("timers.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let store = SnapshotStore::new(&path);
        assert!(matches!(
            store.save(&Snapshot::default()).await,
            Err(EngineError::Persistence(_))
        ));
        assert!(!dir.path().join("timers.json.tmp").exists(), "temporary file left behind");
        assert!(path.join("keep").exists());
    }
}
