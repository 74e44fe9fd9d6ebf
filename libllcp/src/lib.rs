// libllcp-rs/libllcp/src/lib.rs

//! libllcp
//!
//! Pure Rust implementation of the NFC Forum Logical Link Control Protocol.
#![warn(missing_docs)]

pub mod connection;
pub mod constants;
pub mod error;
pub mod link;
/// Common imports
pub mod prelude;
/// PDU, AGF and parameter codecs
pub mod protocol;
pub mod service;
pub mod test_support;
/// MAC transport abstraction
pub mod transport;
/// Shared value types
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the small value types in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
