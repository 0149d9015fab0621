//! Content-addressed object storage for unhash.
//!
//! This crate provides:
//! - The `ObjectStore` / `StagedWrite` abstraction
//! - A local filesystem backend with atomic, no-clobber promotion
//! - The streaming ingestion pipeline (hash while writing, then commit)

pub mod backends;
pub mod error;
pub mod ingest;
pub mod traits;

pub use backends::filesystem::FilesystemStore;
pub use error::{StorageError, StorageResult};
pub use ingest::{Ingested, StoredObject, ingest, store_stream};
pub use traits::{ByteStream, CommitOutcome, ObjectMeta, ObjectStore, StagedWrite};

use std::sync::Arc;
use unhash_core::config::StorageConfig;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemStore::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use unhash_core::Digest;

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("data"),
        };

        let store = from_config(&config).await.unwrap();
        assert_eq!(store.backend_name(), "filesystem");
        assert!(!store.exists(&Digest::compute(b"hi")).await.unwrap());
        assert!(temp.path().join("data").is_dir());
    }

    #[tokio::test]
    async fn from_config_rejects_empty_path() {
        let config = StorageConfig::Filesystem {
            path: PathBuf::new(),
        };

        match from_config(&config).await {
            Ok(_) => panic!("expected error"),
            Err(StorageError::Config(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}
