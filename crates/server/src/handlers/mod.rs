//! HTTP request handlers.

pub mod discovery;
pub mod health;
pub mod objects;
pub mod quote;

pub use discovery::*;
pub use health::*;
pub use objects::*;
pub use quote::*;
