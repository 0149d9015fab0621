//! HTTP server for unhash, a pay-to-store content-addressed object store.
//!
//! This crate provides the HTTP surface:
//! - Service discovery
//! - Price quotes for uploads
//! - Paid uploads, deduplicated by SHA-256 digest
//! - Object retrieval by digest
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod headers;
pub mod metrics;
pub mod payment;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, StateError};
