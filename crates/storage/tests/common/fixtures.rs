use bytes::Bytes;
use futures::Stream;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Compute SHA-256 hash of data as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Generate deterministic test data using a seeded pseudo-random generator
/// Same seed produces same output (reproducible tests)
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    // Simple LCG (Linear Congruential Generator)
    for chunk in data.chunks_mut(8) {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

/// Split `data` into a body stream of `chunk_size` pieces.
pub fn chunked(data: Bytes, chunk_size: usize) -> impl Stream<Item = Result<Bytes, io::Error>> {
    let chunks: Vec<Result<Bytes, io::Error>> = data
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    futures::stream::iter(chunks)
}

/// A body stream that yields `data` and then fails, as a dropped connection would.
pub fn failing_after(data: Bytes) -> impl Stream<Item = Result<Bytes, io::Error>> {
    futures::stream::iter(vec![
        Ok(data),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
    ])
}

/// Number of files left in the staging area under `root`.
pub fn staged_file_count(root: &Path) -> usize {
    std::fs::read_dir(root.join(".staging"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_seeded_bytes_deterministic() {
        assert_eq!(seeded_bytes(42, 1000), seeded_bytes(42, 1000));
        assert_ne!(seeded_bytes(42, 1000), seeded_bytes(43, 1000));
    }
}
