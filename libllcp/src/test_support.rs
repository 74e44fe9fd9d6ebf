//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize the MockTransport link setup and the symmetry
//! exchange so tests across the crate and tests/ directory can drive a live
//! link from the peer side.
#![allow(dead_code)]

use std::time::Duration;

use crate::connection::{Connection, ConnectionStatus};
use crate::link::{Link, LinkConfig};
use crate::protocol::pdu::{Pdu, PduKind};
use crate::service::Service;
use crate::transport::{MockPeer, MockTransport};
use crate::types::{Role, SapRequest};
use crate::{Error, Result};

/// Frames exchanged before `run_until` gives up.
pub const MAX_TURNS: usize = 32;

/// Time allowed for the link to answer a single frame.
pub const TURN_TIMEOUT: Duration = Duration::from_secs(2);

/// Service that accepts every connection and sends each received SDU back.
#[doc(hidden)]
pub fn echo_service(name: &str) -> Service {
    Service::new(name, |mut conn: Connection| async move {
        if conn.status() == ConnectionStatus::ConnectionRequested && conn.accept().await.is_err() {
            return;
        }
        loop {
            let Ok((from, data)) = conn.recv_from().await else {
                break;
            };
            if conn.wait_for_window().await.is_err() {
                break;
            }
            let sent = if conn.remote_sap() == 0 {
                conn.send_to(from, &data).await
            } else {
                conn.send(&data).await
            };
            if sent.is_err() {
                break;
            }
        }
    })
}

/// Bind `services`, then activate a link in the target role over a mock
/// transport so the returned peer speaks first.
#[doc(hidden)]
pub async fn activated_link(
    config: LinkConfig,
    services: Vec<(Service, SapRequest)>,
    peer_parameters: &[u8],
) -> Result<(Link, MockPeer)> {
    let mut link = Link::new(config)?;
    for (service, sap) in services {
        link.bind(service, sap)?;
    }
    let (mock, peer) = MockTransport::pair();
    link.activate(Role::Target, Box::new(mock), peer_parameters)
        .await?;
    Ok((link, peer))
}

/// One symmetry turn: send `pdu` and return the PDUs of the link's answer,
/// split out of an AGF when needed.
#[doc(hidden)]
pub async fn turn(peer: &mut MockPeer, pdu: &Pdu) -> Result<Vec<Pdu>> {
    peer.push_pdu(pdu)?;
    tokio::time::timeout(TURN_TIMEOUT, peer.next_pdus())
        .await
        .map_err(|_| Error::Transport("no answer from link".into()))?
        .ok_or_else(|| Error::Transport("link closed the transport".into()))?
}

/// Send `first`, then keep the link turning with SYMM until it sends a PDU
/// matching `matches`. Returns every non-SYMM PDU received on the way,
/// including the whole frame holding the match.
#[doc(hidden)]
pub async fn run_until<F>(peer: &mut MockPeer, first: Pdu, mut matches: F) -> Result<Vec<Pdu>>
where
    F: FnMut(&Pdu) -> bool,
{
    let mut seen = Vec::new();
    let mut next = first;
    for _ in 0..MAX_TURNS {
        let pdus = turn(peer, &next).await?;
        let found = pdus.iter().any(&mut matches);
        seen.extend(pdus.into_iter().filter(|p| p.kind != PduKind::Symm));
        if found {
            return Ok(seen);
        }
        next = Pdu::symm();
    }
    Err(Error::Transport(format!(
        "no matching pdu after {} turns",
        MAX_TURNS
    )))
}

/// Like [`run_until`] but returns only the matching PDU.
#[doc(hidden)]
pub async fn expect_pdu<F>(peer: &mut MockPeer, first: Pdu, mut matches: F) -> Result<Pdu>
where
    F: FnMut(&Pdu) -> bool,
{
    let seen = run_until(peer, first, &mut matches).await?;
    seen.into_iter()
        .find(|p| matches(p))
        .ok_or_else(|| Error::Transport("matching pdu vanished".into()))
}
