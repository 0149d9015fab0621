pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)]
pub use fixtures::{chunked, failing_after, seeded_bytes, sha256_hex, staged_file_count};
#[allow(unused_imports)]
pub use mocks::FailingWriteStore;
