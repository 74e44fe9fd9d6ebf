#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{self, ECHO_URI};
use common::helpers::echo_link;
use libllcp::constants::SDP_SAP;
use libllcp::protocol::{Parameter, Pdu, PduKind, tlv};
use libllcp::test_support::expect_pdu;
use libllcp::{DisconnectReason, SapRequest};

fn is_cc(p: &Pdu) -> bool {
    p.kind == PduKind::Cc
}

fn is_dm(p: &Pdu) -> bool {
    p.kind == PduKind::Dm
}

#[tokio::test]
async fn connect_by_name_is_accepted_from_resolved_sap() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    assert_eq!(link.find_sap_by_uri(ECHO_URI), Some(0x10));

    let connect = Pdu::connect(
        SDP_SAP,
        0x20,
        fixtures::connect_parameters(2, Some(ECHO_URI)),
    );
    let cc = expect_pdu(&mut peer, connect, is_cc).await.unwrap();
    assert_eq!(cc.dsap, 0x20);
    assert_eq!(cc.ssap, 0x10);
    assert_eq!(
        tlv::decode_all(&cc.payload).unwrap(),
        vec![Parameter::Miux(0), Parameter::Rw(2)]
    );

    // the first slot is taken, the next connection gets the one above it
    let connect = Pdu::connect(
        SDP_SAP,
        0x21,
        fixtures::connect_parameters(2, Some(ECHO_URI)),
    );
    let cc = expect_pdu(&mut peer, connect, is_cc).await.unwrap();
    assert_eq!((cc.dsap, cc.ssap), (0x21, 0x11));

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn unknown_service_name_is_refused() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    let connect = Pdu::connect(
        SDP_SAP,
        0x20,
        fixtures::connect_parameters(2, Some("com.example.missing")),
    );
    let dm = expect_pdu(&mut peer, connect, is_dm).await.unwrap();
    assert_eq!((dm.dsap, dm.ssap), (0x20, SDP_SAP));
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::SERVICE_NOT_FOUND);
    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn connect_to_unbound_sap_is_refused() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    let dm = expect_pdu(&mut peer, Pdu::connect(0x05, 0x20, Vec::new()), is_dm)
        .await
        .unwrap();
    assert_eq!((dm.dsap, dm.ssap), (0x20, 0x05));
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::NoService);
    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn malformed_connect_parameters_are_refused() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    let truncated = vec![0x02, 0x02, 0x00];
    let dm = expect_pdu(&mut peer, Pdu::connect(0x10, 0x20, truncated), is_dm)
        .await
        .unwrap();
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::SYNTAX_ERROR);
    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn direct_connect_to_discovery_sap_is_rejected() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    let dm = expect_pdu(&mut peer, Pdu::connect(SDP_SAP, 0x20, Vec::new()), is_dm)
        .await
        .unwrap();
    assert_eq!((dm.dsap, dm.ssap), (0x20, SDP_SAP));
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::Rejected);
    link.deactivate().await.unwrap();
}
