//! Conditional persistence of found responses

use std::path::{Path, PathBuf};

use crate::error::RunnerResult;
use crate::traits::ArtifactStore;
use crate::types::{
    ExpandedRequest, Outcome, PersistedArtifact, ResponseRecord, ARTIFACT_EXTENSION,
};

/// `<dir>/<fingerprint>.json`
pub fn artifact_path(dir: &Path, fingerprint: &str) -> PathBuf {
    dir.join(format!("{fingerprint}.{ARTIFACT_EXTENSION}"))
}

/// Write the artifact for a found response when an output directory is set.
///
/// Returns the written path, or `None` when nothing had to be written. A
/// later write for the same fingerprint replaces the earlier one.
pub async fn persist<S>(
    store: &S,
    target_dir: Option<&Path>,
    fingerprint: &str,
    request: &ExpandedRequest,
    record: &ResponseRecord,
) -> RunnerResult<Option<PathBuf>>
where
    S: ArtifactStore + ?Sized,
{
    let Some(dir) = target_dir else {
        return Ok(None);
    };
    let Some(filtered) = record.filtered() else {
        return Ok(None);
    };
    if record.outcome() != Outcome::Found {
        return Ok(None);
    }

    let path = artifact_path(dir, fingerprint);
    let contents = serde_json::to_vec_pretty(&PersistedArtifact {
        request,
        response_filtered: filtered,
    })?;

    store.write(&path, &contents).await?;
    Ok(Some(path))
}
