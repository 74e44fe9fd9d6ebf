#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use common::fixtures;
use common::helpers::{echo_link, init_logger};
use libllcp::protocol::parameter::{self, Parameter};
use libllcp::protocol::{Pdu, PduKind};
use libllcp::test_support::{expect_pdu, turn};
use libllcp::{DisconnectReason, LinkBuilder, LinkState, MockTransport, Role, SapRequest};

fn is_dm(p: &Pdu) -> bool {
    p.kind == PduKind::Dm
}

#[tokio::test]
async fn disc_closes_connection_and_is_acknowledged() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    let connect = Pdu::connect(0x10, 0x20, fixtures::connect_parameters(2, None));
    expect_pdu(&mut peer, connect, |p| p.kind == PduKind::Cc)
        .await
        .unwrap();

    let dm = expect_pdu(&mut peer, Pdu::disc(0x10, 0x20), is_dm)
        .await
        .unwrap();
    assert_eq!((dm.dsap, dm.ssap), (0x20, 0x10));
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::Acknowledged);

    // the slot is gone, data for it is refused
    let dm = expect_pdu(&mut peer, Pdu::i(0x10, 0x20, 0, 0, vec![1]), is_dm)
        .await
        .unwrap();
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::NoActiveConnection);

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn disc_for_unknown_connection_is_refused() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    let dm = expect_pdu(&mut peer, Pdu::disc(0x15, 0x20), is_dm)
        .await
        .unwrap();
    assert_eq!((dm.dsap, dm.ssap), (0x20, 0x15));
    assert_eq!(dm.dm_reason().unwrap(), DisconnectReason::NoActiveConnection);
    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn pax_updates_remote_parameters() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    assert_eq!(link.parameters().remote_miu, 128);
    assert_eq!(link.parameters().remote_lto, Duration::from_millis(500));

    let pax = parameter::encode_all(&[Parameter::Miux(0x80), Parameter::Lto(20)]).unwrap();
    turn(&mut peer, &Pdu::pax(pax)).await.unwrap();
    assert_eq!(link.parameters().remote_miu, 256);
    assert_eq!(link.parameters().remote_lto, Duration::from_millis(200));

    // an invalid update leaves everything as it was
    turn(&mut peer, &Pdu::pax(vec![0x02, 0x02, 0x08, 0x00]))
        .await
        .unwrap();
    assert_eq!(link.parameters().remote_miu, 256);

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn peer_disc_on_link_management_sap_deactivates_link() {
    let (mut link, peer) = echo_link(SapRequest::Auto).await.unwrap();
    peer.push_pdu(&Pdu::disc(0, 0)).unwrap();
    link.wait().await.unwrap();
    assert_eq!(link.state(), LinkState::Inactive);
    assert!(peer.is_aborted());
}

#[tokio::test]
async fn deactivate_stops_workers_and_aborts_transport() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    let connect = Pdu::connect(0x10, 0x20, fixtures::connect_parameters(2, None));
    expect_pdu(&mut peer, connect, |p| p.kind == PduKind::Cc)
        .await
        .unwrap();

    link.deactivate().await.unwrap();
    assert_eq!(link.state(), LinkState::Inactive);
    assert!(peer.is_aborted());
    assert!(peer.next_frame().await.is_none());
}

#[tokio::test]
async fn initiator_sends_first_and_uses_larger_peer_miu() {
    init_logger();
    let mut link = LinkBuilder::new().miu(248).build().unwrap();
    let (mock, mut peer) = MockTransport::pair();
    link.activate(
        Role::Initiator,
        Box::new(mock),
        &fixtures::peer_parameters_miu_256(),
    )
    .await
    .unwrap();
    assert_eq!(peer.next_frame().await, Some(vec![0x00, 0x00]));
    assert_eq!(link.parameters().remote_miu, 256);
    assert_eq!(link.parameters().local_miu, 248);
    link.deactivate().await.unwrap();
}
