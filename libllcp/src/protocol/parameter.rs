// libllcp-rs/libllcp/src/protocol/parameter.rs

//! LLCP TLV parameters.
//!
//! Each kind has its own encode/decode pair. Decoders take the complete
//! TLV (tag, length and value) and check the tag, the declared length and
//! the value range.

use crate::constants::{MAX_MIUX, MAX_RW, TLV_LTO, TLV_MIUX, TLV_OPT, TLV_RW, TLV_SN, TLV_VERSION, TLV_WKS};
use crate::protocol::tlv::Tlv;
use crate::types::Version;
use crate::{Error, Result};

/// A typed TLV parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// LLCP version
    Version(Version),
    /// MIU extension, the MIU is `128 + miux`
    Miux(u16),
    /// Well-known service list; bit 0 is always set
    Wks(u16),
    /// Link timeout in units of 10 ms
    Lto(u8),
    /// Receive window, 0 to 15
    Rw(u8),
    /// Service name
    Sn(String),
    /// Option field; low two bits are the link service class
    Opt(u8),
}

impl Parameter {
    /// TLV tag of the parameter
    pub fn tag(&self) -> u8 {
        match self {
            Self::Version(_) => TLV_VERSION,
            Self::Miux(_) => TLV_MIUX,
            Self::Wks(_) => TLV_WKS,
            Self::Lto(_) => TLV_LTO,
            Self::Rw(_) => TLV_RW,
            Self::Sn(_) => TLV_SN,
            Self::Opt(_) => TLV_OPT,
        }
    }

    /// Append the encoded TLV to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Version(v) => out.extend_from_slice(&encode_version(*v)),
            Self::Miux(m) => out.extend_from_slice(&encode_miux(*m)?),
            Self::Wks(w) => out.extend_from_slice(&encode_wks(*w)),
            Self::Lto(l) => out.extend_from_slice(&encode_lto(*l)),
            Self::Rw(r) => out.extend_from_slice(&encode_rw(*r)?),
            Self::Sn(s) => out.extend(encode_sn(s)?),
            Self::Opt(o) => out.extend_from_slice(&encode_opt(*o)?),
        }
        Ok(())
    }

    /// Decode a walked TLV. Unknown tags yield `Ok(None)`.
    pub fn from_tlv(tlv: &Tlv<'_>) -> Result<Option<Self>> {
        let raw = tlv.raw();
        Ok(Some(match tlv.tag {
            TLV_VERSION => Self::Version(decode_version(raw)?),
            TLV_MIUX => Self::Miux(decode_miux(raw)?),
            TLV_WKS => Self::Wks(decode_wks(raw)?),
            TLV_LTO => Self::Lto(decode_lto(raw)?),
            TLV_RW => Self::Rw(decode_rw(raw)?),
            TLV_SN => Self::Sn(decode_sn(raw)?),
            TLV_OPT => Self::Opt(decode_opt(raw)?),
            _ => return Ok(None),
        }))
    }
}

/// Encode a list of parameters back to back.
pub fn encode_all(params: &[Parameter]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for p in params {
        p.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Check tag and declared length of a fixed-size TLV and return its value.
fn fixed_value(raw: &[u8], tag: u8, len: usize) -> Result<&[u8]> {
    if raw.len() < 2 {
        return Err(Error::IncompleteTlv { offset: 0 });
    }
    if raw[0] != tag {
        return Err(Error::invalid_value(
            tag,
            format!("unexpected tag {:#04x}", raw[0]),
        ));
    }
    if raw[1] as usize != len {
        return Err(Error::invalid_value(
            tag,
            format!("declared length {} instead of {}", raw[1], len),
        ));
    }
    if raw.len() != 2 + len {
        return Err(Error::IncompleteTlv { offset: 0 });
    }
    Ok(&raw[2..])
}

/// Encode the VERSION value
pub fn encode_version(version: Version) -> [u8; 3] {
    [TLV_VERSION, 0x01, version.to_byte()]
}

/// Decode the VERSION value
pub fn decode_version(raw: &[u8]) -> Result<Version> {
    let v = fixed_value(raw, TLV_VERSION, 1)?;
    Ok(Version::from_byte(v[0]))
}

/// Fails above 0x7FF
pub fn encode_miux(miux: u16) -> Result<[u8; 4]> {
    if miux > MAX_MIUX {
        return Err(Error::invalid_value(
            TLV_MIUX,
            format!("miux {:#06x} exceeds {:#06x}", miux, MAX_MIUX),
        ));
    }
    let b = miux.to_be_bytes();
    Ok([TLV_MIUX, 0x02, b[0], b[1]])
}

/// Decode the MIUX value
pub fn decode_miux(raw: &[u8]) -> Result<u16> {
    let v = fixed_value(raw, TLV_MIUX, 2)?;
    let miux = u16::from_be_bytes([v[0], v[1]]);
    if miux > MAX_MIUX {
        return Err(Error::invalid_value(
            TLV_MIUX,
            format!("miux {:#06x} exceeds {:#06x}", miux, MAX_MIUX),
        ));
    }
    Ok(miux)
}

/// Encode the WKS value
pub fn encode_wks(wks: u16) -> [u8; 4] {
    let b = (wks | 0x0001).to_be_bytes();
    [TLV_WKS, 0x02, b[0], b[1]]
}

/// Decode the WKS value
pub fn decode_wks(raw: &[u8]) -> Result<u16> {
    let v = fixed_value(raw, TLV_WKS, 2)?;
    Ok(u16::from_be_bytes([v[0], v[1]]) | 0x0001)
}

/// Encode the LTO value
pub fn encode_lto(lto: u8) -> [u8; 3] {
    [TLV_LTO, 0x01, lto]
}

/// Decode the LTO value
pub fn decode_lto(raw: &[u8]) -> Result<u8> {
    Ok(fixed_value(raw, TLV_LTO, 1)?[0])
}

/// Fails above 15
pub fn encode_rw(rw: u8) -> Result<[u8; 3]> {
    check_rw(rw)?;
    Ok([TLV_RW, 0x01, rw])
}

/// Decode the RW value
pub fn decode_rw(raw: &[u8]) -> Result<u8> {
    let rw = fixed_value(raw, TLV_RW, 1)?[0];
    check_rw(rw)?;
    Ok(rw)
}

fn check_rw(rw: u8) -> Result<()> {
    if rw > MAX_RW {
        return Err(Error::invalid_value(
            TLV_RW,
            format!("rw {} exceeds {}", rw, MAX_RW),
        ));
    }
    Ok(())
}

/// Encode the SN value
pub fn encode_sn(sn: &str) -> Result<Vec<u8>> {
    let len = u8::try_from(sn.len())
        .map_err(|_| Error::invalid_value(TLV_SN, format!("name of {} bytes", sn.len())))?;
    let mut out = Vec::with_capacity(2 + sn.len());
    out.push(TLV_SN);
    out.push(len);
    out.extend_from_slice(sn.as_bytes());
    Ok(out)
}

/// Decode the SN value
pub fn decode_sn(raw: &[u8]) -> Result<String> {
    if raw.len() < 2 {
        return Err(Error::IncompleteTlv { offset: 0 });
    }
    if raw[0] != TLV_SN {
        return Err(Error::invalid_value(
            TLV_SN,
            format!("unexpected tag {:#04x}", raw[0]),
        ));
    }
    if raw.len() != 2 + raw[1] as usize {
        return Err(Error::IncompleteTlv { offset: 0 });
    }
    String::from_utf8(raw[2..].to_vec())
        .map_err(|_| Error::invalid_value(TLV_SN, "service name is not utf-8"))
}

/// Encode the OPT value
pub fn encode_opt(opt: u8) -> Result<[u8; 3]> {
    check_opt(opt)?;
    Ok([TLV_OPT, 0x01, opt])
}

/// Decode the OPT value
pub fn decode_opt(raw: &[u8]) -> Result<u8> {
    let opt = fixed_value(raw, TLV_OPT, 1)?[0];
    check_opt(opt)?;
    Ok(opt)
}

fn check_opt(opt: u8) -> Result<()> {
    if opt > 0x03 {
        return Err(Error::invalid_value(
            TLV_OPT,
            format!("opt {:#04x} exceeds 0x03", opt),
        ));
    }
    Ok(())
}
