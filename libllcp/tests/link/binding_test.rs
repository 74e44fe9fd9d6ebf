#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{self, ECHO_URI};
use libllcp::protocol::{Pdu, PduKind};
use libllcp::test_support::{self, expect_pdu};
use libllcp::transport::MockTransport;
use libllcp::{DisconnectReason, Error, LinkBuilder, Role, SapRequest};

#[test]
fn auto_bindings_get_distinct_saps() {
    let mut link = LinkBuilder::new().build().unwrap();
    let a = link
        .bind(test_support::echo_service("a"), SapRequest::Auto)
        .unwrap();
    let b = link
        .bind(test_support::echo_service("b"), SapRequest::Auto)
        .unwrap();
    assert_eq!((a, b), (0x10, 0x11));

    assert_eq!(
        link.bind(test_support::echo_service("c"), 0x10u8),
        Err(Error::AlreadyBound(0x10))
    );
    // only SAPs below 16 show up in the well-known bitmap
    assert_eq!(link.wks(), 0x0003);
}

#[test]
fn unbind_makes_name_unresolvable() {
    let mut link = LinkBuilder::new()
        .service(test_support::echo_service(ECHO_URI), SapRequest::Auto)
        .build()
        .unwrap();
    assert_eq!(link.find_sap_by_uri(ECHO_URI), Some(0x10));
    link.unbind(0x10).unwrap();
    assert_eq!(link.find_sap_by_uri(ECHO_URI), None);
}

#[tokio::test]
async fn bindings_made_while_active_apply_from_next_activation() -> anyhow::Result<()> {
    let (mut link, mut peer) = common::helpers::link_with(Vec::new()).await?;
    assert_eq!(link.bind(test_support::echo_service(ECHO_URI), 0x12u8)?, 0x12);

    let dm = expect_pdu(&mut peer, Pdu::connect(0x12, 0x20, Vec::new()), |p| {
        p.kind == PduKind::Dm
    })
    .await?;
    assert_eq!(dm.dm_reason()?, DisconnectReason::NoService);
    link.deactivate().await?;

    let (mock, mut peer) = MockTransport::pair();
    link.activate(Role::Target, Box::new(mock), &fixtures::peer_parameters())
        .await?;
    let cc = expect_pdu(&mut peer, Pdu::connect(0x12, 0x20, Vec::new()), |p| {
        p.kind == PduKind::Cc
    })
    .await?;
    assert_eq!((cc.dsap, cc.ssap), (0x20, 0x12));
    link.deactivate().await?;
    Ok(())
}
