//! Object store backed by a local directory and served under `/files`.
//!
//! Uploads are written to a `.part` file in chunks, reporting byte progress, and renamed
//! into place once complete, so a key only ever resolves to a whole object. An upload
//! that finds a `.part` left by an interrupted attempt of the same payload resumes after
//! its last byte; any other `.part` is discarded.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::watch,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_transferred >= self.total_bytes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url: String = public_base_url.into();
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{prefix}/{owner}/{random}-{file name}` with the file name reduced to a safe charset.
    pub fn object_key(prefix: &str, owner: Uuid, file_name: &str) -> String {
        let mut name: String = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        name = name.trim_start_matches('.').to_string();
        if name.is_empty() {
            name = "file".to_string();
        }
        let nonce = Uuid::new_v4().simple().to_string();
        format!("{prefix}/{owner}/{}-{name}", &nonce[..8])
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Maps a key to a path under the root; absolute keys and `..` are rejected.
    pub fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(AppError::BadRequest(format!("invalid object key {key}")));
        }
        Ok(self.root.join(relative))
    }

    /// Writes `bytes` under `key`, publishing progress on `progress` after every chunk.
    pub async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        progress: Option<&watch::Sender<UploadProgress>>,
    ) -> AppResult<StoredObject> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let total_bytes = bytes.len() as u64;
        let part_path = path.with_file_name(format!(
            "{}.part",
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));

        // A partial file only counts if it is a prefix of this payload.
        let resumed_from = match fs::read(&part_path).await {
            Ok(existing) if bytes.starts_with(&existing) => existing.len() as u64,
            Ok(_) => {
                tracing::debug!(key, "discarding stale partial upload");
                fs::remove_file(&part_path).await?;
                0
            }
            Err(_) => 0,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&part_path)
            .await?;

        let mut state = UploadProgress {
            bytes_transferred: resumed_from,
            total_bytes,
        };
        report(progress, state);

        let offset = usize::try_from(resumed_from).unwrap_or(bytes.len());
        for chunk in bytes[offset..].chunks(CHUNK_SIZE) {
            file.write_all(chunk).await?;
            state.bytes_transferred += chunk.len() as u64;
            report(progress, state);
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&part_path, &path).await?;
        if resumed_from > 0 {
            tracing::debug!(key, resumed_from, "upload resumed");
        }
        tracing::info!(key, bytes = total_bytes, "object stored");

        Ok(StoredObject {
            key: key.to_string(),
            url: self.url_for(key),
            bytes: total_bytes,
        })
    }

    /// [`ObjectStore::put`] with progress reported to the log as it changes.
    pub async fn put_logged(&self, key: &str, bytes: &[u8]) -> AppResult<StoredObject> {
        let (sender, mut receiver) = watch::channel(UploadProgress::default());
        let log_key = key.to_string();
        let reporter = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let progress = *receiver.borrow_and_update();
                tracing::debug!(key = %log_key, percent = progress.percent(), "uploading");
            }
        });

        let stored = self.put(key, bytes, Some(&sender)).await;
        drop(sender);
        if let Err(err) = reporter.await {
            tracing::warn!(error = %err, "upload progress reporter failed");
        }
        stored
    }

    /// Best-effort removal of an object whose owning record was never written.
    pub async fn discard(&self, key: &str) {
        match self.delete(key).await {
            Ok(()) => tracing::debug!(key, "orphaned upload removed"),
            Err(err) => tracing::warn!(key, error = %err, "orphaned upload not removed"),
        }
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(err) => Err(err.into()),
        }
    }
}

fn report(progress: Option<&watch::Sender<UploadProgress>>, state: UploadProgress) {
    if let Some(sender) = progress {
        sender.send_replace(state);
    }
    tracing::trace!(bytes = state.bytes_transferred, total = state.total_bytes, "chunk written");
}
