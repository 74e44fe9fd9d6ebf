#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use common::helpers::echo_link;
use libllcp::protocol::{Pdu, PduKind, Sequence, aggregate};
use libllcp::test_support::{expect_pdu, run_until, turn};
use libllcp::SapRequest;

fn is_i(p: &Pdu) -> bool {
    matches!(p.kind, PduKind::I(_))
}

#[tokio::test]
async fn send_window_holds_back_until_acknowledged() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    // remote receive window of one
    let connect = Pdu::connect(0x10, 0x20, fixtures::connect_parameters(1, None));
    expect_pdu(&mut peer, connect, |p| p.kind == PduKind::Cc)
        .await
        .unwrap();

    let burst = aggregate(
        &[
            Pdu::i(0x10, 0x20, 0, 0, b"one".to_vec()),
            Pdu::i(0x10, 0x20, 1, 0, b"two".to_vec()),
        ],
        128,
    )
    .unwrap();
    let seen = run_until(&mut peer, burst, is_i).await.unwrap();
    let first = seen.iter().find(|p| is_i(p)).unwrap();
    assert_eq!(first.kind, PduKind::I(Sequence::new(0, 1)));
    assert_eq!(first.payload, b"one");
    assert!(seen
        .iter()
        .any(|p| matches!(p.kind, PduKind::Rr(seq) if seq.nr >= 1)));

    // the second echo waits for the window to open
    for _ in 0..4 {
        let pdus = turn(&mut peer, &Pdu::symm()).await.unwrap();
        assert!(!pdus.iter().any(is_i), "sent past the window: {:?}", pdus);
    }

    let second = expect_pdu(&mut peer, Pdu::rr(0x10, 0x20, 1), is_i)
        .await
        .unwrap();
    assert_eq!(second.kind, PduKind::I(Sequence::new(1, 2)));
    assert_eq!(second.payload, b"two");

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn out_of_order_i_pdu_is_answered_with_expected_sequence() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    let connect = Pdu::connect(0x10, 0x20, fixtures::connect_parameters(2, None));
    expect_pdu(&mut peer, connect, |p| p.kind == PduKind::Cc)
        .await
        .unwrap();

    let rr = expect_pdu(&mut peer, Pdu::i(0x10, 0x20, 3, 0, b"late".to_vec()), |p| {
        matches!(p.kind, PduKind::Rr(_))
    })
    .await
    .unwrap();
    assert_eq!(rr.kind, PduKind::Rr(Sequence::new(0, 0)));

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn connectionless_data_is_echoed() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x11)).await.unwrap();
    let ui = expect_pdu(&mut peer, Pdu::ui(0x11, 0x21, b"hi".to_vec()), |p| {
        p.kind == PduKind::Ui
    })
    .await
    .unwrap();
    assert_eq!((ui.dsap, ui.ssap), (0x21, 0x11));
    assert_eq!(ui.payload, b"hi");

    // a second remote SAP gets its own logical data link
    let ui = expect_pdu(&mut peer, Pdu::ui(0x11, 0x22, b"ho".to_vec()), |p| {
        p.kind == PduKind::Ui
    })
    .await
    .unwrap();
    assert_eq!((ui.dsap, ui.ssap), (0x22, 0x11));

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn idle_link_answers_with_symm() {
    let (mut link, mut peer) = echo_link(SapRequest::Auto).await.unwrap();
    for _ in 0..3 {
        assert_eq!(
            turn(&mut peer, &Pdu::symm()).await.unwrap(),
            vec![Pdu::symm()]
        );
    }
    // connectionless data for the discovery SAP is drained silently
    assert_eq!(
        turn(&mut peer, &Pdu::ui(0x01, 0x20, vec![0x01])).await.unwrap(),
        vec![Pdu::symm()]
    );
    link.deactivate().await.unwrap();
}
