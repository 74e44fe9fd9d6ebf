// libllcp-rs/libllcp/src/error.rs

//! Crate error type.

use thiserror::Error;

use crate::types::DisconnectReason;

/// Common error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A PDU could not be decoded or violates the header rules
    #[error("malformed pdu: {0}")]
    MalformedPdu(String),

    /// An AGF operation was given a PDU of another type
    #[error("pdu is not an aggregated frame")]
    NotAggregated,

    /// The output buffer cannot hold the encoded PDU
    #[error("buffer too small: need {needed} bytes, capacity is {capacity}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        capacity: usize,
    },

    /// A payload or field is longer than allowed
    #[error("invalid length: expected at most {expected}, got {actual}")]
    InvalidLength {
        /// Largest accepted length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// A TLV runs past the end of its list
    #[error("incomplete tlv at offset {offset}")]
    IncompleteTlv {
        /// Offset of the truncated tag
        offset: usize,
    },

    /// A parameter value is outside its allowed range
    #[error("invalid value for parameter {tag:#04x}: {reason}")]
    InvalidParameterValue {
        /// TLV tag of the parameter
        tag: u8,
        /// What is wrong with the value
        reason: String,
    },

    /// Every SAP in the requested range is taken
    #[error("no free sap left")]
    NoFreeSap,

    /// The requested SAP already hosts a service
    #[error("sap {0:#04x} already bound")]
    AlreadyBound(u8),

    /// No bound service has this name
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    /// Send or receive state variables would leave the window
    #[error("sequence violation: {0}")]
    SequenceViolation(String),

    /// Link parameters or configuration were rejected
    #[error("link configuration failed: {0}")]
    ConfigurationFailed(String),

    /// The peer answered CONNECT with DM
    #[error("connection rejected by peer: {0}")]
    ConnectionRejected(DisconnectReason),

    /// The connection or link is gone
    #[error("disconnected")]
    Disconnected,

    /// The operation is not valid in the current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The MAC transport failed or timed out
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an out-of-range parameter value.
    pub(crate) fn invalid_value(tag: u8, reason: impl Into<String>) -> Self {
        Error::InvalidParameterValue {
            tag,
            reason: reason.into(),
        }
    }
}
