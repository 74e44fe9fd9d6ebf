// libllcp-rs/libllcp/src/protocol/mod.rs

pub mod agf;
pub mod parameter;
/// Bounds-checked byte readers
pub mod parser;
/// PDU header codec
pub mod pdu;
pub mod tlv;

pub use agf::{aggregate, dispatch};
pub use parameter::Parameter;
pub use pdu::{Pdu, PduKind, Sequence};
pub use tlv::{Tlv, TlvIter};
