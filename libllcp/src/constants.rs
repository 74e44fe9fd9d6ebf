// libllcp-rs/libllcp/src/constants.rs
//! Common protocol constants used across the crate

/// LLCP version implemented locally
pub const LLCP_VERSION_MAJOR: u8 = 1;
/// Minor LLCP version implemented
pub const LLCP_VERSION_MINOR: u8 = 0;

/// LLCP magic number prefixing the parameter list in ATR general bytes
pub const LLCP_MAGIC: [u8; 3] = [0x46, 0x66, 0x6D];

/// Default Maximum Information Unit when no MIUX is exchanged
pub const DEFAULT_MIU: u16 = 128;

/// Largest MIU expressible with an 11-bit MIUX
pub const MAX_MIU: u16 = DEFAULT_MIU + MAX_MIUX;

/// MIUX is an 11-bit value
pub const MAX_MIUX: u16 = 0x07FF;

/// Default link timeout, in milliseconds
pub const DEFAULT_LTO_MS: u64 = 100;

/// Default link service class (connectionless and connection-oriented)
pub const DEFAULT_LSC: u8 = 0x03;

/// Receive window used when a CONNECT/CC carries no RW parameter
pub const DEFAULT_RW: u8 = 2;

/// Largest receive window; sequence numbers are 4 bits wide
pub const MAX_RW: u8 = 0x0F;

/// Sequence number space
pub const SEQUENCE_MODULUS: u8 = 16;

/// Highest SAP value (6-bit address)
pub const MAX_SAP: u8 = 0x3F;

/// Number of SAP slots in the link table
pub const SAP_COUNT: usize = MAX_SAP as usize + 1;

/// SAP 0 is the link management SAP
pub const LINK_MANAGEMENT_SAP: u8 = 0x00;

/// Service discovery SAP
pub const SDP_SAP: u8 = 0x01;

/// Well-known service URI of the service discovery protocol
pub const SDP_URI: &str = "urn:nfc:sn:sdp";

/// Well-known services occupy [0x00, 0x0F]
pub const WELL_KNOWN_SAP_LAST: u8 = 0x0F;

/// Services obtained by AUTO allocation occupy [0x10, 0x1F]
pub const AUTO_SAP_FIRST: u8 = 0x10;
/// Last SAP handed out by automatic binding
pub const AUTO_SAP_LAST: u8 = 0x1F;

/// Services advertised by name can be resolved in [0x01, 0x1F]
pub const ADVERTISED_SAP_LAST: u8 = 0x1F;

/// TLV parameter tags
pub const TLV_VERSION: u8 = 0x01;
/// MIUX parameter tag
pub const TLV_MIUX: u8 = 0x02;
/// WKS parameter tag
pub const TLV_WKS: u8 = 0x03;
/// LTO parameter tag
pub const TLV_LTO: u8 = 0x04;
/// RW parameter tag
pub const TLV_RW: u8 = 0x05;
/// SN parameter tag
pub const TLV_SN: u8 = 0x06;
/// OPT parameter tag
pub const TLV_OPT: u8 = 0x07;

/// Mandatory LLCP header length
pub const PDU_HEADER_LEN: usize = 2;

/// Length prefix of each PDU inside an AGF payload
pub const AGF_LENGTH_PREFIX_LEN: usize = 2;
