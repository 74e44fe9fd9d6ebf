// libllcp-rs/libllcp/src/protocol/tlv.rs

//! TLV list walker shared by link configuration (PAX / general bytes) and
//! CONNECT/CC payloads.

use crate::protocol::parameter::Parameter;
use crate::{Error, Result};

/// One TLV entry borrowed from a parameter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// Tag byte
    pub tag: u8,
    /// Value bytes
    pub value: &'a [u8],
    /// Offset of the tag byte within the list
    pub offset: usize,
    raw: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// The complete entry: tag, length and value.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }
}

/// Iterates the TLVs of a parameter list. A truncated entry yields one
/// `IncompleteTlv` error and ends the walk.
pub struct TlvIter<'a> {
    data: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> TlvIter<'a> {
    /// Iterator over the list in `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<Tlv<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }

        let offset = self.offset;
        if offset + 2 > self.data.len() {
            self.done = true;
            return Some(Err(Error::IncompleteTlv { offset }));
        }
        let len = self.data[offset + 1] as usize;
        let end = offset + 2 + len;
        if end > self.data.len() {
            self.done = true;
            return Some(Err(Error::IncompleteTlv { offset }));
        }

        self.offset = end;
        Some(Ok(Tlv {
            tag: self.data[offset],
            value: &self.data[offset + 2..end],
            offset,
            raw: &self.data[offset..end],
        }))
    }
}

/// Iterate the TLVs of a parameter list
pub fn walk(data: &[u8]) -> TlvIter<'_> {
    TlvIter::new(data)
}

/// Decode every known parameter of a list. Unknown tags are skipped; any
/// malformed or truncated entry fails the whole list.
pub fn decode_all(data: &[u8]) -> Result<Vec<Parameter>> {
    let mut out = Vec::new();
    for tlv in walk(data) {
        let tlv = tlv?;
        match Parameter::from_tlv(&tlv).map_err(|e| relocate(e, tlv.offset))? {
            Some(p) => out.push(p),
            None => log::debug!(
                "skipping unknown tlv {:#04x} (length {}) at offset {}",
                tlv.tag,
                tlv.value.len(),
                tlv.offset
            ),
        }
    }
    Ok(out)
}

/// Per-kind decoders see a single entry; report offsets relative to the list.
fn relocate(err: Error, base: usize) -> Error {
    match err {
        Error::IncompleteTlv { offset } => Error::IncompleteTlv {
            offset: base + offset,
        },
        other => other,
    }
}
