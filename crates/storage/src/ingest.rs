//! Streaming ingestion.
//!
//! An inbound body is consumed one chunk at a time: each chunk is fed to the
//! SHA-256 hasher and appended to a staged write before the next chunk is
//! pulled, so memory use is bounded by a single chunk regardless of object
//! size. The digest is only reported once every byte is hashed and durably
//! written. Any failure discards the staged bytes.

use crate::error::{StorageError, StorageResult};
use crate::traits::{CommitOutcome, ObjectStore, StagedWrite};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use tracing::instrument;
use unhash_core::Digest;

/// A fully received object that has not been committed yet.
pub struct Ingested {
    digest: Digest,
    size: u64,
    staged: Box<dyn StagedWrite>,
}

impl fmt::Debug for Ingested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingested")
            .field("digest", &self.digest)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A committed object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// Digest of the object's bytes.
    pub digest: Digest,
    /// Object size in bytes.
    pub size: u64,
    /// Whether this upload created the object or matched an existing one.
    pub outcome: CommitOutcome,
}

impl Ingested {
    /// Digest of the received bytes.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Number of bytes received.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Promote the staged bytes into the store under their digest.
    pub async fn commit(self) -> StorageResult<StoredObject> {
        let outcome = self.staged.promote(&self.digest).await?;
        Ok(StoredObject {
            digest: self.digest,
            size: self.size,
            outcome,
        })
    }

    /// Discard the staged bytes without committing.
    pub async fn discard(self) -> StorageResult<()> {
        self.staged.abort().await
    }
}

/// Consume `body`, hashing and staging every chunk.
///
/// On a stream error the staged bytes are discarded and
/// [`StorageError::Ingest`] is returned. On a write error the staged bytes are
/// discarded and the write error is returned.
pub async fn ingest<S, E>(store: &dyn ObjectStore, body: S) -> StorageResult<Ingested>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: fmt::Display + Send,
{
    let mut staged = store.stage().await?;
    let mut hasher = Digest::hasher();
    let mut size = 0u64;

    let mut body = std::pin::pin!(body);
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let reason = e.to_string();
                discard_after_failure(staged).await;
                return Err(StorageError::Ingest(reason));
            }
        };

        hasher.update(&chunk);
        if let Err(e) = staged.write(&chunk).await {
            discard_after_failure(staged).await;
            return Err(e);
        }
        size += chunk.len() as u64;
    }

    if let Err(e) = staged.finish().await {
        discard_after_failure(staged).await;
        return Err(e);
    }

    Ok(Ingested {
        digest: hasher.finalize(),
        size,
        staged,
    })
}

/// Ingest `body` and commit it. Convenience for [`ingest`] followed by
/// [`Ingested::commit`].
#[instrument(skip(store, body), fields(backend = store.backend_name()))]
pub async fn store_stream<S, E>(store: &dyn ObjectStore, body: S) -> StorageResult<StoredObject>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: fmt::Display + Send,
{
    let ingested = match ingest(store, body).await {
        Ok(ingested) => ingested,
        Err(e) => {
            tracing::warn!(error = %e, "Ingest failed, staged bytes discarded");
            return Err(e);
        }
    };

    let stored = ingested.commit().await?;
    tracing::debug!(
        digest = %stored.digest,
        size = stored.size,
        outcome = stored.outcome.as_str(),
        "Object committed"
    );
    Ok(stored)
}

async fn discard_after_failure(staged: Box<dyn StagedWrite>) {
    if let Err(e) = staged.abort().await {
        tracing::warn!(error = %e, "Failed to discard staged upload");
    }
}
