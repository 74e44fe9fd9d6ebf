// libllcp-rs/libllcp/src/link/parameters.rs

//! Link-wide parameters and the configuration exchange.

use std::time::Duration;

use log::debug;

use crate::constants::{DEFAULT_LSC, DEFAULT_MIU, LLCP_MAGIC};
use crate::link::config::LinkConfig;
use crate::protocol::parameter::{self, Parameter};
use crate::protocol::tlv;
use crate::types::Version;
use crate::utils::{default_lto, duration_to_lto, lto_to_duration, ms};
use crate::{Error, Result};

/// Parameters negotiated for one activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParameters {
    /// Agreed LLCP version
    pub version: Version,
    /// Our MIU
    pub local_miu: u16,
    /// Peer MIU
    pub remote_miu: u16,
    /// Our well-known service bitmap
    pub local_wks: u16,
    /// Peer well-known service bitmap
    pub remote_wks: u16,
    /// Our link timeout
    pub local_lto: Duration,
    /// Peer link timeout
    pub remote_lto: Duration,
    /// Local link service class
    pub local_lsc: u8,
    /// Remote link service class
    pub remote_lsc: u8,
}

impl Default for LinkParameters {
    fn default() -> Self {
        Self {
            version: Version::default(),
            local_miu: DEFAULT_MIU,
            remote_miu: DEFAULT_MIU,
            local_wks: 0x0001,
            remote_wks: 0x0001,
            local_lto: default_lto(),
            remote_lto: default_lto(),
            local_lsc: DEFAULT_LSC,
            remote_lsc: DEFAULT_LSC,
        }
    }
}

/// Agree on a version with the peer.
///
/// Equal majors keep the lower minor. A newer local major falls back to the
/// remote version when the remote major is at least 1. An older local major
/// is kept as is; the peer is the one expected to fall back.
pub fn version_agreement(local: Version, remote: Version) -> Result<Version> {
    if local.major == remote.major {
        Ok(Version::new(local.major, local.minor.min(remote.minor)))
    } else if local.major > remote.major && remote.major >= 1 {
        Ok(remote)
    } else if local.major < remote.major {
        Ok(local)
    } else {
        Err(Error::ConfigurationFailed(format!(
            "no common version: local {}, remote {}",
            local, remote
        )))
    }
}

impl LinkParameters {
    /// Defaults with the local side taken from `config`.
    pub fn from_config(config: &LinkConfig) -> Self {
        Self {
            local_miu: config.miu,
            local_lto: ms(config.lto_ms),
            local_lsc: config.lsc,
            ..Self::default()
        }
    }

    /// Apply the peer's TLV list. Every parameter is applied to a copy
    /// which replaces `self` only if the whole list was valid.
    pub fn configure(&mut self, tlvs: &[u8]) -> Result<()> {
        let mut staged = *self;
        for p in tlv::decode_all(tlvs)? {
            match p {
                Parameter::Version(v) => {
                    staged.version = version_agreement(staged.version, v)?;
                    debug!("version: remote {}, agreed {}", v, staged.version);
                }
                Parameter::Miux(miux) => {
                    staged.remote_miu = DEFAULT_MIU + miux;
                    debug!("remote miu: {}", staged.remote_miu);
                }
                Parameter::Wks(wks) => {
                    staged.remote_wks = wks;
                    debug!("remote wks: {:#06x}", wks);
                }
                Parameter::Lto(lto) => {
                    staged.remote_lto = lto_to_duration(lto);
                    debug!("remote lto: {:?}", staged.remote_lto);
                }
                Parameter::Opt(opt) => {
                    staged.remote_lsc = opt & 0x03;
                    debug!("remote lsc: {}", staged.remote_lsc);
                }
                other => debug!("ignoring {:?} in link parameters", other),
            }
        }
        *self = staged;
        Ok(())
    }

    /// Local TLV block: VERSION, MIUX, WKS, LTO, OPT.
    pub fn encode(&self) -> Result<Vec<u8>> {
        parameter::encode_all(&[
            Parameter::Version(self.version),
            Parameter::Miux(self.local_miu - DEFAULT_MIU),
            Parameter::Wks(self.local_wks),
            Parameter::Lto(duration_to_lto(self.local_lto)),
            Parameter::Opt(self.local_lsc),
        ])
    }
}

/// Prefix a parameter block with the LLCP magic number for MAC activation.
pub fn general_bytes(parameters: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(LLCP_MAGIC.len() + parameters.len());
    out.extend_from_slice(&LLCP_MAGIC);
    out.extend_from_slice(parameters);
    out
}

/// Check and remove the LLCP magic number from the peer's general bytes.
pub fn strip_magic(general_bytes: &[u8]) -> Result<&[u8]> {
    general_bytes
        .strip_prefix(&LLCP_MAGIC[..])
        .ok_or_else(|| Error::ConfigurationFailed("llcp magic number missing".into()))
}
