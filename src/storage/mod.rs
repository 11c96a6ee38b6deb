//! Local image store. Each upload is written once under the store root and
//! referenced by its public path, e.g. `uploads/1729300000000-<uuid>.jpg`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix the store root is served under.
pub const PUBLIC_PREFIX: &str = "uploads";

const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to store {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| StorageError::Io {
            name: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` and flushes them to disk, returning the public path.
    pub async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        let file_name = unique_name(original_name);
        let io_err = |source| StorageError::Io {
            name: file_name.clone(),
            source,
        };

        let path = self.root.join(&file_name);
        let mut file = fs::File::create(&path).await.map_err(io_err)?;
        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        remove_on_failure(&path, written).await.map_err(io_err)?;

        info!(file = %file_name, bytes = bytes.len(), "image stored");
        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }

    /// Removes a previously stored image whose owning record was never written.
    pub async fn discard(&self, public_path: &str) {
        let Some(file_name) = public_path.strip_prefix(&format!("{PUBLIC_PREFIX}/")) else {
            return;
        };
        if file_name.contains(['/', '\\']) {
            return;
        }
        if let Err(err) = fs::remove_file(self.root.join(file_name)).await {
            warn!(error = %err, file = %file_name, "failed to discard orphaned image");
        }
    }
}

/// Deletes a partially written file so a failed upload leaves nothing behind.
async fn remove_on_failure(path: &Path, written: io::Result<()>) -> io::Result<()> {
    if let Err(err) = written {
        if let Err(remove_err) = fs::remove_file(path).await {
            warn!(error = %remove_err, file = %path.display(), "failed to remove partial image");
        }
        return Err(err);
    }
    Ok(())
}

fn unique_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}
