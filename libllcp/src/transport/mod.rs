// libllcp-rs/libllcp/src/transport/mod.rs

/// In-memory transport for tests
pub mod mock;
/// The MAC transport trait
pub mod traits;

pub use mock::{MockPeer, MockTransport};
pub use traits::MacTransport;
