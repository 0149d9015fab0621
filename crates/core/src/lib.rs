//! Core domain types for the unhash content-addressed store.
//!
//! This crate defines the data model shared by the storage and server crates:
//! - Object digests and their sharded storage keys
//! - Size-based pricing and quotes
//! - Application configuration

pub mod config;
pub mod digest;
pub mod error;
pub mod price;

pub use config::{AppConfig, PaymentConfig, PricingConfig, ServerConfig, StorageConfig};
pub use digest::{DIGEST_HEX_LEN, Digest, DigestHasher};
pub use error::{Error, Result};
pub use price::{PriceCalculator, Quote};
