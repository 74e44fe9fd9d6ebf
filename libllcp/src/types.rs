// libllcp-rs/libllcp/src/types.rs

use derive_more::Display;
use std::convert::TryFrom;

use crate::Error;
use crate::constants::{LLCP_VERSION_MAJOR, LLCP_VERSION_MINOR};

/// LLCP protocol version, two 4-bit nibbles on the wire
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(fmt = "{}.{}", major, minor)]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

impl Version {
    /// Version from its parts
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Pack into the single VERSION byte (major in the high nibble)
    pub fn to_byte(&self) -> u8 {
        ((self.major & 0x0F) << 4) | (self.minor & 0x0F)
    }

    /// Major in the high nibble, minor in the low one
    pub fn from_byte(b: u8) -> Self {
        Self {
            major: b >> 4,
            minor: b & 0x0F,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(LLCP_VERSION_MAJOR, LLCP_VERSION_MINOR)
    }
}

/// Role taken by the local LLC during MAC activation
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends the first frame
    #[display(fmt = "initiator")]
    Initiator,
    /// Answers the initiator
    #[display(fmt = "target")]
    Target,
}

/// Requested SAP when binding a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SapRequest {
    /// First free SAP in [0x10, 0x1F]
    Auto,
    /// This SAP or an error
    Explicit(u8),
}

impl From<u8> for SapRequest {
    fn from(sap: u8) -> Self {
        SapRequest::Explicit(sap)
    }
}

/// Reason carried by a DM PDU
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// DISC acknowledged
    #[display(fmt = "disconnect acknowledged")]
    Acknowledged = 0x00,
    /// No connection on the addressed SAP pair
    #[display(fmt = "no active connection")]
    NoActiveConnection = 0x01,
    /// No service bound at the target SAP
    #[display(fmt = "no service bound to target sap")]
    NoService = 0x02,
    /// Refused by the service
    #[display(fmt = "connect rejected by service")]
    Rejected = 0x03,
    /// Refused for good on this SAP
    #[display(fmt = "connect permanently refused for this sap")]
    PermanentRejectSap = 0x10,
    /// Refused for good on every SAP
    #[display(fmt = "connect permanently refused for any sap")]
    PermanentRejectAny = 0x11,
    /// Refused for now on this SAP
    #[display(fmt = "connect temporarily refused for this sap")]
    TemporaryRejectSap = 0x20,
    /// Refused for now on every SAP
    #[display(fmt = "connect temporarily refused for any sap")]
    TemporaryRejectAny = 0x21,
}

impl DisconnectReason {
    /// CONNECT payload could not be parsed
    pub const SYNTAX_ERROR: Self = Self::PermanentRejectSap;
    /// No free SAP slot to host the connection
    pub const NO_ROOM: Self = Self::TemporaryRejectAny;
    /// Name resolution through SDP failed
    pub const SERVICE_NOT_FOUND: Self = Self::NoService;
}

impl TryFrom<u8> for DisconnectReason {
    type Error = Error;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match code {
            0x00 => Self::Acknowledged,
            0x01 => Self::NoActiveConnection,
            0x02 => Self::NoService,
            0x03 => Self::Rejected,
            0x10 => Self::PermanentRejectSap,
            0x11 => Self::PermanentRejectAny,
            0x20 => Self::TemporaryRejectSap,
            0x21 => Self::TemporaryRejectAny,
            other => {
                return Err(Error::MalformedPdu(format!(
                    "unknown dm reason {:#04x}",
                    other
                )));
            }
        })
    }
}
