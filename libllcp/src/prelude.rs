// libllcp-rs/libllcp/src/prelude.rs

pub use crate::connection::{Connection, ConnectionKind, ConnectionStatus, WorkerHandle};
pub use crate::link::{ConnectTarget, Link, LinkBuilder, LinkConfig, LinkParameters, LinkState};
pub use crate::protocol::{Parameter, Pdu, PduKind, Sequence};
pub use crate::service::Service;
pub use crate::transport::{MacTransport, MockPeer, MockTransport};
pub use crate::{DisconnectReason, Error, Result, Role, SapRequest, Version};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex_spaced, duration_to_lto, lto_to_duration, ms};
