//! Small helpers shared across the crate: frame dumps for trace logs and
//! link timeout conversions.

pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
