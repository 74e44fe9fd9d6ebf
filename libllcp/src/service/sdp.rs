// libllcp-rs/libllcp/src/service/sdp.rs

//! Service discovery system service (SAP 1).
//!
//! Name lookups for CONNECT PDUs addressed to SAP 1 are resolved by the
//! dispatcher. The service itself only refuses connections made to SAP 1
//! directly and drains the connectionless traffic sent to it.

use crate::connection::{Connection, ConnectionKind};
use crate::constants::SDP_URI;
use crate::service::Service;

/// Service discovery, bound at SAP 1
pub fn sdp_service() -> Service {
    Service::new(SDP_URI, run).always_on()
}

async fn run(mut conn: Connection) {
    match conn.kind() {
        ConnectionKind::DataLinkConnection => {
            log::info!(
                "sdp: refusing connection from sap {:#04x}",
                conn.remote_sap()
            );
            if let Err(e) = conn.reject().await {
                log::debug!("sdp: reject failed: {}", e);
            }
        }
        ConnectionKind::LogicalDataLink => {
            while let Ok((from, data)) = conn.recv_from().await {
                log::debug!(
                    "sdp: dropping {} bytes of connectionless data from sap {:#04x}",
                    data.len(),
                    from
                );
            }
        }
    }
}
