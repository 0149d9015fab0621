//! Test doubles for storage failures.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use unhash_core::Digest;
use unhash_storage::{
    ByteStream, CommitOutcome, FilesystemStore, ObjectMeta, ObjectStore, StagedWrite,
    StorageResult,
};

/// Filesystem store whose staged writes fail once `fail_after` bytes are written,
/// as a full disk would.
pub struct FailingWriteStore {
    pub inner: FilesystemStore,
    pub fail_after: u64,
}

#[async_trait]
impl ObjectStore for FailingWriteStore {
    async fn exists(&self, digest: &Digest) -> StorageResult<bool> {
        self.inner.exists(digest).await
    }

    async fn head(&self, digest: &Digest) -> StorageResult<ObjectMeta> {
        self.inner.head(digest).await
    }

    async fn get(&self, digest: &Digest) -> StorageResult<Bytes> {
        self.inner.get(digest).await
    }

    async fn get_stream(&self, digest: &Digest) -> StorageResult<ByteStream> {
        self.inner.get_stream(digest).await
    }

    async fn stage(&self) -> StorageResult<Box<dyn StagedWrite>> {
        Ok(Box::new(FailingWrite {
            inner: self.inner.stage().await?,
            remaining: self.fail_after,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

struct FailingWrite {
    inner: Box<dyn StagedWrite>,
    remaining: u64,
}

#[async_trait]
impl StagedWrite for FailingWrite {
    async fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        if data.len() as u64 > self.remaining {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left on device").into());
        }
        self.remaining -= data.len() as u64;
        self.inner.write(data).await
    }

    async fn finish(&mut self) -> StorageResult<u64> {
        self.inner.finish().await
    }

    async fn promote(self: Box<Self>, digest: &Digest) -> StorageResult<CommitOutcome> {
        self.inner.promote(digest).await
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        self.inner.abort().await
    }
}
