// libllcp-rs/libllcp/src/protocol/pdu.rs

use crate::constants::{MAX_SAP, PDU_HEADER_LEN};
use crate::protocol::parser::{byte_at, ensure_len};
use crate::types::DisconnectReason;
use crate::{Error, Result};

/// Sequence field of I, RR and RNR PDUs: N(S) in the high nibble, N(R)
/// in the low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sequence {
    /// N(S)
    pub ns: u8,
    /// N(R)
    pub nr: u8,
}

impl Sequence {
    /// Sequence field from N(S) and N(R)
    pub const fn new(ns: u8, nr: u8) -> Self {
        Self { ns, nr }
    }

    fn to_byte(self) -> u8 {
        (self.ns << 4) | self.nr
    }

    fn from_byte(b: u8) -> Self {
        Self {
            ns: b >> 4,
            nr: b & 0x0F,
        }
    }
}

/// PDU type. Only I, RR and RNR carry a sequence field, so its presence is
/// decided by the variant alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduKind {
    /// Symmetry
    Symm,
    /// Parameter exchange
    Pax,
    /// Aggregated frame
    Agf,
    /// Unnumbered information
    Ui,
    /// Connect
    Connect,
    /// Disconnect
    Disc,
    /// Connection complete
    Cc,
    /// Disconnected mode
    Dm,
    /// Frame reject
    Frmr,
    /// Information
    I(Sequence),
    /// Receive ready
    Rr(Sequence),
    /// Receive not ready
    Rnr(Sequence),
    /// PTYPE values 0x9-0xB and 0xF
    Reserved(u8),
}

impl PduKind {
    /// The 4-bit PTYPE value
    pub fn ptype(&self) -> u8 {
        match self {
            Self::Symm => 0x0,
            Self::Pax => 0x1,
            Self::Agf => 0x2,
            Self::Ui => 0x3,
            Self::Connect => 0x4,
            Self::Disc => 0x5,
            Self::Cc => 0x6,
            Self::Dm => 0x7,
            Self::Frmr => 0x8,
            Self::I(_) => 0xC,
            Self::Rr(_) => 0xD,
            Self::Rnr(_) => 0xE,
            Self::Reserved(p) => *p,
        }
    }

    /// Sequence field of I, RR and RNR
    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            Self::I(seq) | Self::Rr(seq) | Self::Rnr(seq) => Some(*seq),
            _ => None,
        }
    }

    /// Build a kind from PTYPE, reading the sequence byte only when the
    /// type carries one.
    fn from_ptype(ptype: u8, sequence: impl FnOnce() -> Result<Sequence>) -> Result<Self> {
        Ok(match ptype {
            0x0 => Self::Symm,
            0x1 => Self::Pax,
            0x2 => Self::Agf,
            0x3 => Self::Ui,
            0x4 => Self::Connect,
            0x5 => Self::Disc,
            0x6 => Self::Cc,
            0x7 => Self::Dm,
            0x8 => Self::Frmr,
            0xC => Self::I(sequence()?),
            0xD => Self::Rr(sequence()?),
            0xE => Self::Rnr(sequence()?),
            other => Self::Reserved(other),
        })
    }
}

/// A single LLCP PDU.
///
/// Wire layout: `DSAP(6) PTYPE(4) SSAP(6) [N(S)(4) N(R)(4)] payload`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    /// Destination SAP
    pub dsap: u8,
    /// Source SAP
    pub ssap: u8,
    /// PDU type and sequence field
    pub kind: PduKind,
    /// Information field
    pub payload: Vec<u8>,
}

impl Pdu {
    /// PDU from its parts
    pub fn new(dsap: u8, ssap: u8, kind: PduKind, payload: Vec<u8>) -> Self {
        Self {
            dsap,
            ssap,
            kind,
            payload,
        }
    }

    /// SYMM keeping the link turning
    pub fn symm() -> Self {
        Self::new(0, 0, PduKind::Symm, Vec::new())
    }

    /// PAX carrying a link parameter list
    pub fn pax(parameters: Vec<u8>) -> Self {
        Self::new(0, 0, PduKind::Pax, parameters)
    }

    /// UI carrying `payload`
    pub fn ui(dsap: u8, ssap: u8, payload: Vec<u8>) -> Self {
        Self::new(dsap, ssap, PduKind::Ui, payload)
    }

    /// CONNECT carrying connection parameters
    pub fn connect(dsap: u8, ssap: u8, parameters: Vec<u8>) -> Self {
        Self::new(dsap, ssap, PduKind::Connect, parameters)
    }

    /// DISC
    pub fn disc(dsap: u8, ssap: u8) -> Self {
        Self::new(dsap, ssap, PduKind::Disc, Vec::new())
    }

    /// CC carrying connection parameters
    pub fn cc(dsap: u8, ssap: u8, parameters: Vec<u8>) -> Self {
        Self::new(dsap, ssap, PduKind::Cc, parameters)
    }

    /// DM with a one-byte reason
    pub fn dm(dsap: u8, ssap: u8, reason: DisconnectReason) -> Self {
        Self::new(dsap, ssap, PduKind::Dm, vec![reason as u8])
    }

    /// I PDU carrying `payload`
    pub fn i(dsap: u8, ssap: u8, ns: u8, nr: u8, payload: Vec<u8>) -> Self {
        Self::new(dsap, ssap, PduKind::I(Sequence::new(ns, nr)), payload)
    }

    /// RR acknowledging up to `nr`; N(S) is zero
    pub fn rr(dsap: u8, ssap: u8, nr: u8) -> Self {
        Self::new(dsap, ssap, PduKind::Rr(Sequence::new(0, nr)), Vec::new())
    }

    /// RNR acknowledging up to `nr`
    pub fn rnr(dsap: u8, ssap: u8, nr: u8) -> Self {
        Self::new(dsap, ssap, PduKind::Rnr(Sequence::new(0, nr)), Vec::new())
    }

    /// 4-bit PTYPE code
    pub fn ptype(&self) -> u8 {
        self.kind.ptype()
    }

    /// Packed size in bytes
    pub fn size(&self) -> usize {
        PDU_HEADER_LEN + usize::from(self.kind.sequence().is_some()) + self.payload.len()
    }

    /// Reason code of a DM PDU
    pub fn dm_reason(&self) -> Result<DisconnectReason> {
        if self.kind != PduKind::Dm {
            return Err(Error::MalformedPdu("not a DM pdu".into()));
        }
        DisconnectReason::try_from(byte_at(&self.payload, 0)?)
    }

    fn validate(&self) -> Result<()> {
        if self.dsap > MAX_SAP || self.ssap > MAX_SAP {
            return Err(Error::MalformedPdu(format!(
                "sap out of range (dsap={:#04x}, ssap={:#04x})",
                self.dsap, self.ssap
            )));
        }
        if let PduKind::Reserved(p) = self.kind {
            if !matches!(p, 0x9..=0xB | 0xF) {
                return Err(Error::MalformedPdu(format!(
                    "ptype {:#x} is not reserved",
                    p
                )));
            }
        }
        if let Some(seq) = self.kind.sequence() {
            if seq.ns > 0x0F || seq.nr > 0x0F {
                return Err(Error::MalformedPdu(format!(
                    "sequence out of range (ns={}, nr={})",
                    seq.ns, seq.nr
                )));
            }
        }
        Ok(())
    }

    /// Pack into a caller-supplied buffer, returning the number of bytes
    /// written.
    pub fn pack_into(&self, buffer: &mut [u8]) -> Result<usize> {
        self.validate()?;
        let needed = self.size();
        if buffer.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                capacity: buffer.len(),
            });
        }

        let ptype = self.ptype();
        let mut n = 0usize;
        buffer[n] = (self.dsap << 2) | (ptype >> 2);
        n += 1;
        buffer[n] = (ptype << 6) | self.ssap;
        n += 1;
        if let Some(seq) = self.kind.sequence() {
            buffer[n] = seq.to_byte();
            n += 1;
        }
        buffer[n..n + self.payload.len()].copy_from_slice(&self.payload);
        Ok(n + self.payload.len())
    }

    /// Pack into a freshly allocated buffer.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size()];
        self.pack_into(&mut out)?;
        Ok(out)
    }

    /// Decode a PDU from raw bytes.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        ensure_len(bytes, PDU_HEADER_LEN)?;

        let dsap = bytes[0] >> 2;
        let ptype = ((bytes[0] & 0x03) << 2) | (bytes[1] >> 6);
        let ssap = bytes[1] & 0x3F;

        let kind = PduKind::from_ptype(ptype, || {
            byte_at(bytes, PDU_HEADER_LEN)
                .map(Sequence::from_byte)
                .map_err(|_| {
                    Error::MalformedPdu(format!("ptype {:#x} lacks its sequence field", ptype))
                })
        })?;

        let header_len = PDU_HEADER_LEN + usize::from(kind.sequence().is_some());
        Ok(Self {
            dsap,
            ssap,
            kind,
            payload: bytes[header_len..].to_vec(),
        })
    }
}
