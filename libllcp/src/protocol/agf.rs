// libllcp-rs/libllcp/src/protocol/agf.rs

//! Aggregated frame (AGF) helpers.
//!
//! An AGF payload is a sequence of `[Len(2, big-endian)] [PDU(Len)]`
//! entries. Nested aggregation is refused in both directions.

use crate::constants::AGF_LENGTH_PREFIX_LEN;
use crate::protocol::parser::be_u16_at;
use crate::protocol::pdu::{Pdu, PduKind};
use crate::{Error, Result};

/// Size of the AGF payload needed to carry `pdus`.
pub fn aggregated_len(pdus: &[Pdu]) -> usize {
    pdus.iter().map(|p| AGF_LENGTH_PREFIX_LEN + p.size()).sum()
}

/// Bundle several PDUs into one AGF PDU whose payload must fit in `miu`.
pub fn aggregate(pdus: &[Pdu], miu: usize) -> Result<Pdu> {
    let len = aggregated_len(pdus);
    if len > miu {
        return Err(Error::InvalidLength {
            expected: miu,
            actual: len,
        });
    }

    let mut payload = vec![0u8; len];
    let mut offset = 0usize;
    for pdu in pdus {
        if pdu.kind == PduKind::Agf {
            return Err(Error::MalformedPdu("nested aggregation".into()));
        }
        let size = u16::try_from(pdu.size()).map_err(|_| Error::InvalidLength {
            expected: u16::MAX as usize,
            actual: pdu.size(),
        })?;
        payload[offset..offset + AGF_LENGTH_PREFIX_LEN].copy_from_slice(&size.to_be_bytes());
        offset += AGF_LENGTH_PREFIX_LEN;
        offset += pdu.pack_into(&mut payload[offset..])?;
    }

    Ok(Pdu::new(0, 0, PduKind::Agf, payload))
}

/// Split an AGF PDU back into its components. Either every entry decodes
/// or the whole frame is refused.
pub fn dispatch(pdu: &Pdu) -> Result<Vec<Pdu>> {
    if pdu.kind != PduKind::Agf || pdu.dsap != 0 || pdu.ssap != 0 {
        return Err(Error::NotAggregated);
    }

    let payload = &pdu.payload;
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < payload.len() {
        let len = be_u16_at(payload, offset).map_err(|_| {
            Error::MalformedPdu(format!("truncated length prefix at offset {}", offset))
        })? as usize;
        offset += AGF_LENGTH_PREFIX_LEN;

        if offset + len > payload.len() {
            return Err(Error::MalformedPdu(format!(
                "entry of {} bytes at offset {} overruns {}-byte payload",
                len,
                offset,
                payload.len()
            )));
        }

        let inner = Pdu::unpack(&payload[offset..offset + len])?;
        if inner.kind == PduKind::Agf {
            return Err(Error::MalformedPdu("nested aggregation".into()));
        }
        out.push(inner);
        offset += len;
    }

    Ok(out)
}
