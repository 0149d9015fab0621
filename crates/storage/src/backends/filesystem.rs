//! Local filesystem storage backend.
//!
//! Objects live at `<root>/<shard>/<digest>`, where the shard is the first
//! byte of the digest in hex. Writes are staged under `<root>/.staging/` (same
//! filesystem, so promotion is a rename) and are never visible at a canonical
//! path until complete.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, CommitOutcome, ObjectMeta, ObjectStore, StagedWrite};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use unhash_core::Digest;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Directory under the root holding in-progress uploads.
pub const STAGING_DIR: &str = ".staging";

/// File name prefix for staged uploads.
const STAGED_PREFIX: &str = "upload-";

/// Local filesystem object store.
pub struct FilesystemStore {
    root: PathBuf,
    staging: PathBuf,
}

impl FilesystemStore {
    /// Open (or create) a store rooted at `root`.
    ///
    /// Staged files left behind by a previous process are removed. Only one
    /// process may serve a given root.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        let staging = root.join(STAGING_DIR);
        fs::create_dir_all(&staging).await?;

        let store = Self { root, staging };
        let purged = store.purge_staging().await?;
        if purged > 0 {
            tracing::warn!(
                count = purged,
                root = %store.root.display(),
                "Removed staged uploads left by a previous run"
            );
        }
        Ok(store)
    }

    /// Data root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path of the object with `digest`.
    pub fn resolve(&self, digest: &Digest) -> PathBuf {
        resolve_path(&self.root, digest)
    }

    /// Delete every staged file. Returns the number removed.
    async fn purge_staging(&self) -> StorageResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

/// Resolve `digest` to `<root>/<shard>/<hex>`.
pub fn resolve_path(root: &Path, digest: &Digest) -> PathBuf {
    root.join(digest.shard()).join(digest.to_hex())
}

fn not_found_or_io(digest: &Digest, e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(digest.to_hex())
    } else {
        StorageError::Io(e)
    }
}

fn join_error(e: tokio::task::JoinError) -> StorageError {
    StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, digest: &Digest) -> StorageResult<bool> {
        fs::try_exists(self.resolve(digest))
            .await
            .map_err(StorageError::Io)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn head(&self, digest: &Digest) -> StorageResult<ObjectMeta> {
        let metadata = fs::metadata(self.resolve(digest))
            .await
            .map_err(|e| not_found_or_io(digest, e))?;

        Ok(ObjectMeta {
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(|t| t.into()),
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, digest: &Digest) -> StorageResult<Bytes> {
        let data = fs::read(self.resolve(digest))
            .await
            .map_err(|e| not_found_or_io(digest, e))?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_stream(&self, digest: &Digest) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let file = fs::File::open(self.resolve(digest))
            .await
            .map_err(|e| not_found_or_io(digest, e))?;

        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn stage(&self) -> StorageResult<Box<dyn StagedWrite>> {
        let staging = self.staging.clone();
        let (file, path) = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(STAGED_PREFIX)
                .tempfile_in(&staging)
                .map(|named| named.into_parts())
        })
        .await
        .map_err(join_error)??;

        Ok(Box::new(FilesystemStagedWrite {
            root: self.root.clone(),
            file: Some(fs::File::from_std(file)),
            path,
            bytes_written: 0,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        for dir in [&self.root, &self.staging] {
            let metadata = fs::metadata(dir).await.map_err(|e| {
                StorageError::Io(std::io::Error::new(
                    e.kind(),
                    format!("storage directory not accessible: {}: {e}", dir.display()),
                ))
            })?;

            if !metadata.is_dir() {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    format!("storage path is not a directory: {}", dir.display()),
                )));
            }
        }
        Ok(())
    }
}

/// Staged upload for the filesystem backend.
///
/// The staged file is owned by a [`TempPath`], which deletes it on drop.
struct FilesystemStagedWrite {
    root: PathBuf,
    file: Option<fs::File>,
    path: TempPath,
    bytes_written: u64,
}

#[async_trait]
impl StagedWrite for FilesystemStagedWrite {
    async fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            StorageError::Io(std::io::Error::other("staged write already finished"))
        })?;
        file.write_all(data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(&mut self) -> StorageResult<u64> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(self.bytes_written)
    }

    async fn promote(mut self: Box<Self>, digest: &Digest) -> StorageResult<CommitOutcome> {
        self.finish().await?;

        let final_path = resolve_path(&self.root, digest);
        if fs::try_exists(&final_path).await? {
            // Dropping self removes the staged file.
            return Ok(CommitOutcome::AlreadyExists);
        }

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // No-clobber rename: of several identical uploads racing here, exactly
        // one lands at the canonical path and the rest see AlreadyExists.
        let staged = *self;
        let persisted = tokio::task::spawn_blocking(move || staged.path.persist_noclobber(&final_path))
            .await
            .map_err(join_error)?;

        match persisted {
            Ok(()) => Ok(CommitOutcome::Created),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Ok(CommitOutcome::AlreadyExists)
            }
            Err(e) => Err(StorageError::Io(e.error)),
        }
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        let staged = *self;
        drop(staged.file);
        match staged.path.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
