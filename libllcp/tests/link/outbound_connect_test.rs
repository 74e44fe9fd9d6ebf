#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{self, ECHO_URI};
use common::helpers::echo_link;
use libllcp::constants::SDP_SAP;
use libllcp::protocol::{Parameter, Pdu, PduKind, Sequence, tlv};
use libllcp::test_support::{expect_pdu, turn};
use libllcp::{ConnectTarget, DisconnectReason, Error, SapRequest};

fn is_connect(p: &Pdu) -> bool {
    p.kind == PduKind::Connect
}

#[tokio::test]
async fn connect_to_sap_and_exchange_data() -> anyhow::Result<()> {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await?;

    let (handle, connect) = tokio::join!(link.connect(0x10, ConnectTarget::Sap(0x04)), async {
        let connect = expect_pdu(&mut peer, Pdu::symm(), is_connect).await?;
        let cc = Pdu::cc(connect.ssap, connect.dsap, fixtures::connect_parameters(4, None));
        turn(&mut peer, &cc).await?;
        Ok::<_, Error>(connect)
    });
    let connect = connect?;
    assert_eq!((connect.dsap, connect.ssap), (0x04, 0x10));
    let handle = handle?;
    assert_eq!((handle.local_sap(), handle.remote_sap()), (0x10, 0x04));

    let echoed = expect_pdu(&mut peer, Pdu::i(0x10, 0x04, 0, 0, b"ping".to_vec()), |p| {
        matches!(p.kind, PduKind::I(_))
    })
    .await?;
    assert_eq!((echoed.dsap, echoed.ssap), (0x04, 0x10));
    assert_eq!(echoed.kind, PduKind::I(Sequence::new(0, 1)));
    assert_eq!(echoed.payload, b"ping");

    handle.stop().await?;
    link.deactivate().await?;
    Ok(())
}

#[tokio::test]
async fn connect_by_name_goes_through_discovery_sap() -> anyhow::Result<()> {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await?;

    let target = ConnectTarget::Name("urn:nfc:sn:snep".into());
    let (handle, connect) = tokio::join!(link.connect(0x10, target), async {
        let connect = expect_pdu(&mut peer, Pdu::symm(), is_connect).await?;
        let cc = Pdu::cc(connect.ssap, 0x04, Vec::new());
        turn(&mut peer, &cc).await?;
        Ok::<_, Error>(connect)
    });
    let connect = connect?;
    assert_eq!(connect.dsap, SDP_SAP);
    assert!(
        tlv::decode_all(&connect.payload)?.contains(&Parameter::Sn("urn:nfc:sn:snep".into()))
    );
    assert_eq!(handle?.remote_sap(), 0x04);

    link.deactivate().await?;
    Ok(())
}

#[tokio::test]
async fn rejected_connect_reports_reason() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();

    let (result, _) = tokio::join!(link.connect(0x10, ConnectTarget::Sap(0x04)), async {
        let connect = expect_pdu(&mut peer, Pdu::symm(), is_connect).await.unwrap();
        let dm = Pdu::dm(connect.ssap, connect.dsap, DisconnectReason::Rejected);
        turn(&mut peer, &dm).await.unwrap();
    });
    assert!(matches!(
        result,
        Err(Error::ConnectionRejected(DisconnectReason::Rejected))
    ));
    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn connect_without_local_service_fails() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    // requests are picked up when the link takes its turn
    let symm = Pdu::symm();
    let (result, _) = tokio::join!(
        link.connect(0x30, ConnectTarget::Sap(0x04)),
        turn(&mut peer, &symm)
    );
    assert!(matches!(result, Err(Error::ServiceNotFound(_))));
    assert_eq!(link.find_sap_by_uri(ECHO_URI), Some(0x10));
    link.deactivate().await.unwrap();
}
