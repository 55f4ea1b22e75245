//! Filesystem artifact store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{RunnerError, RunnerResult};
use crate::traits::ArtifactStore;

/// Writes artifacts through a sibling temp file and a rename, so a reader
/// never sees a half-written artifact and concurrent writers to one path
/// leave exactly one complete file behind.
#[derive(Debug, Default, Clone)]
pub struct FileArtifactStore;

impl FileArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn write(&self, path: &Path, contents: &[u8]) -> RunnerResult<()> {
        let persistence = |source| RunnerError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let temp = temp_path(path);
        tokio::fs::write(&temp, contents).await.map_err(persistence)?;

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(persistence(e));
        }

        Ok(())
    }
}
