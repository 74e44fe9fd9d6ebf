// libllcp-rs/libllcp/src/link/config.rs

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LSC, DEFAULT_LTO_MS, DEFAULT_MIU, DEFAULT_RW, MAX_MIU, MAX_RW, TLV_LTO, TLV_MIUX,
    TLV_OPT, TLV_RW,
};
use crate::utils::MAX_LTO_MS;
use crate::{Error, Result};

/// Capacity of every worker channel unless configured otherwise
pub const DEFAULT_CHANNEL_CAPACITY: usize = 2;

/// Local link settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Local maximum information unit
    pub miu: u16,
    /// Local link timeout in milliseconds
    pub lto_ms: u64,
    /// Link service class (bit 0 connectionless, bit 1 connection-oriented)
    pub lsc: u8,
    /// Receive window assumed when a CONNECT or CC omits RW
    pub default_rw: u8,
    /// Capacity of the bounded channels between the dispatcher and workers
    pub channel_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            miu: DEFAULT_MIU,
            lto_ms: DEFAULT_LTO_MS,
            lsc: DEFAULT_LSC,
            default_rw: DEFAULT_RW,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl LinkConfig {
    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<()> {
        if !(DEFAULT_MIU..=MAX_MIU).contains(&self.miu) {
            return Err(Error::invalid_value(
                TLV_MIUX,
                format!("miu {} outside {}..={}", self.miu, DEFAULT_MIU, MAX_MIU),
            ));
        }
        if self.lto_ms > MAX_LTO_MS {
            return Err(Error::invalid_value(
                TLV_LTO,
                format!("lto {} ms exceeds {} ms", self.lto_ms, MAX_LTO_MS),
            ));
        }
        if self.lsc > 0x03 {
            return Err(Error::invalid_value(
                TLV_OPT,
                format!("link service class {:#04x} exceeds 0x03", self.lsc),
            ));
        }
        if self.default_rw > MAX_RW {
            return Err(Error::invalid_value(
                TLV_RW,
                format!("rw {} exceeds {}", self.default_rw, MAX_RW),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(Error::ConfigurationFailed(
                "channel capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
