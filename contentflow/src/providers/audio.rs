//! Persisting synthesized audio.

use crate::errors::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes audio bytes under `dir` with a fresh name and returns the path.
pub(crate) async fn write_audio(dir: &Path, audio: &[u8], extension: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.{extension}", Uuid::new_v4()));
    tokio::fs::write(&path, audio).await?;
    tracing::debug!(path = %path.display(), bytes = audio.len(), "Wrote synthesized audio");
    Ok(path)
}
