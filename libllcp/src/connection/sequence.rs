// libllcp-rs/libllcp/src/connection/sequence.rs

//! Send/receive sequence variables of a data link connection.
//!
//! `s` is the next N(S) to send, `sa` the last N(R) received from the peer,
//! `r` the next N(S) expected from the peer and `ra` the last N(R) sent
//! back. All four count modulo 16.

use crate::constants::SEQUENCE_MODULUS;
use crate::protocol::pdu::Sequence;
use crate::{Error, Result};

/// Outcome of checking an inbound I PDU against `r`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// In sequence; `r` moved on
    Accepted,
    /// The PDU was discarded; the peer must be told to resume at `expected`
    OutOfOrder {
        /// Next N(S) the receiver accepts
        expected: u8,
    },
}

/// Send and receive state variables of a data link connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceState {
    s: u8,
    sa: u8,
    r: u8,
    ra: u8,
}

fn modulo(v: u8) -> u8 {
    v % SEQUENCE_MODULUS
}

impl SequenceState {
    /// All four variables at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Send state variable V(S)
    pub fn s(&self) -> u8 {
        self.s
    }

    /// Send acknowledge state variable V(SA)
    pub fn sa(&self) -> u8 {
        self.sa
    }

    /// Receive state variable V(R)
    pub fn r(&self) -> u8 {
        self.r
    }

    /// Receive acknowledge state variable V(RA)
    pub fn ra(&self) -> u8 {
        self.ra
    }

    /// Number of sent I PDUs not yet acknowledged, `(s - sa) mod 16`
    pub fn unacknowledged(&self) -> u8 {
        modulo(self.s.wrapping_add(SEQUENCE_MODULUS).wrapping_sub(self.sa))
    }

    /// Fewer than `rwr` I PDUs are unacknowledged
    pub fn can_send(&self, rwr: u8) -> bool {
        self.unacknowledged() < rwr
    }

    /// Claim the sequence field for the next outbound I PDU. N(R) is
    /// piggybacked, so `ra` catches up with `r`.
    pub fn next_send(&mut self, rwr: u8) -> Result<Sequence> {
        if !self.can_send(rwr) {
            return Err(Error::SequenceViolation(format!(
                "send window full: {} unacknowledged, remote window {}",
                self.unacknowledged(),
                rwr
            )));
        }
        let seq = Sequence::new(self.s, self.r);
        self.s = modulo(self.s + 1);
        self.ra = self.r;
        Ok(seq)
    }

    /// Check the N(S) of an inbound I PDU. Only the expected value advances `r`.
    pub fn receive(&mut self, ns: u8) -> Receipt {
        if ns == self.r {
            self.r = modulo(self.r + 1);
            Receipt::Accepted
        } else {
            Receipt::OutOfOrder { expected: self.r }
        }
    }

    /// Apply an N(R) from the peer. It must lie between `sa` and `s`.
    pub fn acknowledge(&mut self, nr: u8) -> Result<()> {
        let acked = modulo(nr.wrapping_add(SEQUENCE_MODULUS).wrapping_sub(self.sa));
        if nr >= SEQUENCE_MODULUS || acked > self.unacknowledged() {
            return Err(Error::SequenceViolation(format!(
                "n(r) {} outside [{}, {}]",
                nr, self.sa, self.s
            )));
        }
        self.sa = nr;
        Ok(())
    }

    /// N(R) for an RR/RNR; records it as sent.
    pub fn ack_value(&mut self) -> u8 {
        self.ra = self.r;
        self.r
    }
}
