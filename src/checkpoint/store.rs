//! Checkpoint persistence
//!
//! `FileCheckpointStore` keeps one pretty-printed JSON file per checkpoint:
//! `<dir>/<id>.json`. Writes go to a temp file that is synced and renamed
//! over the target, so a crash never leaves a half-written checkpoint.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::model::{Checkpoint, CheckpointStatus};
use crate::error::{Result, SdpError};

/// Persistence contract used by the execution engine.
///
/// Writes are last-writer-wins; one driving process per feature is assumed.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Fails with `CheckpointNotFound` for unknown ids
    async fn load(&self, id: &str) -> Result<Checkpoint>;

    /// Load with a refreshed `updated_at`
    async fn resume(&self, id: &str) -> Result<Checkpoint> {
        let mut checkpoint = self.load(id).await?;
        checkpoint.touch();
        Ok(checkpoint)
    }
}

/// Reject ids that could escape the checkpoint directory
pub fn validate_checkpoint_id(id: &str) -> Result<()> {
    let reason = if id.trim().is_empty() {
        Some("must not be empty")
    } else if id.contains('/') || id.contains('\\') {
        Some("must not contain path separators")
    } else if id.contains("..") {
        Some("must not contain '..'")
    } else if id.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SdpError::InvalidCheckpointId {
            id: id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// JSON-file checkpoint store
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `.sdp/checkpoints` under the current directory
    pub fn default_dir() -> PathBuf {
        PathBuf::from(".sdp").join("checkpoints")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_checkpoint_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn io_err(id: &str, action: &str, e: std::io::Error) -> SdpError {
        SdpError::CheckpointIo {
            id: id.to_string(),
            reason: format!("{action}: {e}"),
        }
    }

    /// All readable checkpoints, newest first.
    ///
    /// Unreadable or corrupt files are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_err("*", "failed to read checkpoint directory", e)),
        };

        let mut checkpoints = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_err("*", "failed to read checkpoint directory", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load(id).await {
                Ok(cp) => checkpoints.push(cp),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid checkpoint"),
            }
        }

        checkpoints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(checkpoints)
    }

    /// Delete completed checkpoints not updated within `age`.
    ///
    /// Returns how many were removed. Pending, in-progress and failed
    /// checkpoints are always kept.
    pub async fn clean(&self, age: Duration) -> Result<usize> {
        let Some(cutoff) = chrono::Duration::from_std(age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };

        let mut removed = 0;
        for cp in self.list().await? {
            if cp.status != CheckpointStatus::Completed || cp.updated_at >= cutoff {
                continue;
            }
            self.delete(&cp.id).await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Remove one checkpoint; returns false when it did not exist
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_err(id, "failed to remove checkpoint", e)),
        }
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let id = checkpoint.id.as_str();
        let path = self.path_for(id)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_err(id, "failed to create checkpoint directory", e))?;

        let data = serde_json::to_vec_pretty(checkpoint)?;
        let tmp = self.dir.join(format!(".{id}.json.tmp"));

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&tmp)
            .await
            .map_err(|e| Self::io_err(id, "failed to create temp file", e))?;
        file.write_all(&data)
            .await
            .map_err(|e| Self::io_err(id, "failed to write checkpoint", e))?;
        file.sync_all()
            .await
            .map_err(|e| Self::io_err(id, "failed to sync checkpoint", e))?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::io_err(id, "failed to replace checkpoint", e));
        }

        debug!(id, path = %path.display(), "checkpoint written");
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Checkpoint> {
        let path = self.path_for(id)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SdpError::CheckpointNotFound { id: id.to_string() })
            }
            Err(e) => return Err(Self::io_err(id, "failed to read checkpoint", e)),
        };

        serde_json::from_slice(&data).map_err(|e| SdpError::CheckpointCorrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoints"));

        let mut cp = Checkpoint::new("F01");
        cp.completed_workstreams.push("a".into());
        store.save(&cp).await.unwrap();

        let loaded = store.load("F01").await.unwrap();
        assert_eq!(loaded, cp);
        assert!(!dir.path().join("checkpoints/.F01.json.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.save(&Checkpoint::new("F01")).await.unwrap();

        let mode = std::fs::metadata(dir.path().join("F01.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let err = store.load("nope").await.unwrap_err();
        assert!(matches!(err, SdpError::CheckpointNotFound { id } if id == "nope"));
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let err = store.load("bad").await.unwrap_err();
        assert_eq!(err.code(), "SDP-022");
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        for id in ["", "../etc", "a/b", "a\\b"] {
            let err = store.load(id).await.unwrap_err();
            assert!(matches!(err, SdpError::InvalidCheckpointId { .. }), "{id}");
        }
    }

    #[tokio::test]
    async fn test_resume_refreshes_updated_at() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let mut cp = Checkpoint::new("F01");
        cp.updated_at = cp.updated_at - chrono::Duration::hours(1);
        store.save(&cp).await.unwrap();

        let resumed = store.resume("F01").await.unwrap();
        assert!(resumed.updated_at > cp.updated_at);
        assert_eq!(resumed.created_at, cp.created_at);
    }
}
