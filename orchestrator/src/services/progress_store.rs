//! File-backed progress store
//!
//! Snapshots are written to a temporary sibling file, synced, then renamed
//! over the target, so a reader sees either the previous complete snapshot
//! or the new one and never a partial write. On unix the directory is
//! synced after the rename so the new entry itself survives a crash.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use shared::Progress;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::ProgressStore;

/// Progress store writing a pretty-printed JSON snapshot
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temporary file next to the target so the rename stays on one filesystem
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("progress");
        self.path.with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
    }

    /// Directory holding the snapshot; a bare file name lives in `.`
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    #[cfg(unix)]
    async fn sync_parent(&self) -> OrchestratorResult<()> {
        let parent = self.parent_dir();
        let dir = fs::File::open(parent)
            .await
            .map_err(|e| self.io_error("open directory", parent, e))?;
        dir.sync_all()
            .await
            .map_err(|e| self.io_error("sync directory", parent, e))
    }

    #[cfg(not(unix))]
    async fn sync_parent(&self) -> OrchestratorResult<()> {
        Ok(())
    }

    fn io_error(&self, operation: &str, path: &Path, source: std::io::Error) -> OrchestratorError {
        OrchestratorError::PersistenceError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }

    async fn write_temp(&self, temp: &Path, bytes: &[u8]) -> OrchestratorResult<()> {
        let mut file = fs::File::create(temp)
            .await
            .map_err(|e| self.io_error("create temp", temp, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| self.io_error("write temp", temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| self.io_error("sync temp", temp, e))?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn load(&self) -> OrchestratorResult<Option<Progress>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", &self.path, e)),
        };

        let progress = serde_json::from_str::<Progress>(&content).map_err(|e| OrchestratorError::ProgressCorrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %self.path.display(), results = progress.results.len(), "📂 Loaded progress");
        Ok(Some(progress))
    }

    async fn save(&self, progress: &Progress) -> OrchestratorResult<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)
            .await
            .map_err(|e| self.io_error("create directory", parent, e))?;

        let bytes = serde_json::to_vec_pretty(progress)?;
        let temp = self.temp_path();

        if let Err(e) = self.write_temp(&temp, &bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error("rename", &self.path, e))?;
        self.sync_parent().await?;

        tracing::debug!(
            path = %self.path.display(),
            completed = progress.completed_combinations.len(),
            "💾 Progress saved"
        );
        Ok(())
    }

    async fn delete(&self) -> OrchestratorResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "🗑️ Progress removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("delete", &self.path, e)),
        }
    }
}
