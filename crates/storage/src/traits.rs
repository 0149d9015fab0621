//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use unhash_core::Digest;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Result of promoting a staged write into the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The object was not present and is now stored.
    Created,
    /// An object with the same digest was already stored; the staged bytes were discarded.
    AlreadyExists,
}

impl CommitOutcome {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already_exists",
        }
    }
}

/// Metadata about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time (if available).
    pub last_modified: Option<time::OffsetDateTime>,
}

/// Content-addressed object store.
///
/// Objects are immutable and keyed by the SHA-256 digest of their bytes.
/// Writes go through [`ObjectStore::stage`]: bytes are written to a private
/// staging area and only become visible once promoted under their digest.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, digest: &Digest) -> StorageResult<bool>;

    /// Get an object's size without fetching content.
    async fn head(&self, digest: &Digest) -> StorageResult<ObjectMeta>;

    /// Get an object's content.
    async fn get(&self, digest: &Digest) -> StorageResult<Bytes>;

    /// Get an object as a byte stream.
    async fn get_stream(&self, digest: &Digest) -> StorageResult<ByteStream>;

    /// Open a new staged write in a location unique to this call.
    async fn stage(&self) -> StorageResult<Box<dyn StagedWrite>>;

    /// Get the name of this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is reachable and usable.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// An uncommitted object being written.
///
/// Dropping a staged write without calling [`StagedWrite::promote`] discards
/// its bytes.
#[async_trait]
pub trait StagedWrite: Send {
    /// Append a chunk of data.
    async fn write(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Flush written data to durable storage and return the total bytes written.
    async fn finish(&mut self) -> StorageResult<u64>;

    /// Move the staged bytes to the canonical location for `digest`.
    ///
    /// The caller guarantees `digest` is the SHA-256 of the written bytes.
    /// If the object already exists the staged bytes are discarded.
    async fn promote(self: Box<Self>, digest: &Digest) -> StorageResult<CommitOutcome>;

    /// Discard the staged bytes.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}
