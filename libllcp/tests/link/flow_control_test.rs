#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::fixtures;
use common::helpers::{echo_link, link_with};
use libllcp::protocol::{Pdu, PduKind, Sequence};
use libllcp::test_support::{expect_pdu, turn};
use libllcp::{Connection, SapRequest, Service};

const FLOOD_URI: &str = "com.example.flood";
const FLOOD_COUNT: usize = 500;

fn is_i(p: &Pdu) -> bool {
    matches!(p.kind, PduKind::I(_))
}

/// Answers the first UI with a stream of 100-byte UI PDUs, counting each
/// one the link took.
fn flooding_service(sent: Arc<AtomicUsize>) -> Service {
    Service::new(FLOOD_URI, move |mut conn: Connection| {
        let sent = sent.clone();
        async move {
            let Ok((from, _)) = conn.recv_from().await else {
                return;
            };
            for _ in 0..FLOOD_COUNT {
                if conn.send_to(from, &[0x5a; 100]).await.is_err() {
                    return;
                }
                sent.fetch_add(1, Ordering::SeqCst);
            }
        }
    })
}

/// Accepts and returns without stopping the connection.
fn accept_and_leave() -> Service {
    Service::new(fixtures::ECHO_URI, |mut conn: Connection| async move {
        let _ = conn.accept().await;
    })
}

#[tokio::test]
async fn flooding_worker_is_held_to_the_symmetry_pace() {
    let sent = Arc::new(AtomicUsize::new(0));
    let (mut link, mut peer) = link_with(vec![(
        flooding_service(sent.clone()),
        SapRequest::Explicit(0x11),
    )])
    .await
    .unwrap();

    let mut received = 0;
    let mut next = Pdu::ui(0x11, 0x21, b"go".to_vec());
    for _ in 0..60 {
        let pdus = turn(&mut peer, &next).await.unwrap();
        received += pdus.iter().filter(|p| p.kind == PduKind::Ui).count();
        next = Pdu::symm();
    }
    // give the worker time to push whatever it still can
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sent = sent.load(Ordering::SeqCst);
    assert!(received > 0);
    assert!(sent < FLOOD_COUNT);
    // at most a full backlog and a full request channel in flight
    assert!(
        sent <= received + 5,
        "worker queued {} pdus, only {} left the link",
        sent,
        received
    );

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn oversized_i_pdu_is_dropped() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x10)).await.unwrap();
    let connect = Pdu::connect(0x10, 0x20, fixtures::connect_parameters(2, None));
    expect_pdu(&mut peer, connect, |p| p.kind == PduKind::Cc)
        .await
        .unwrap();

    // the echo service advertised the default MIU of 128
    let mut next = Pdu::i(0x10, 0x20, 0, 0, vec![0xaa; 1000]);
    for _ in 0..4 {
        let pdus = turn(&mut peer, &next).await.unwrap();
        assert!(
            !pdus
                .iter()
                .any(|p| is_i(p) || matches!(p.kind, PduKind::Rr(_))),
            "oversized pdu was taken: {:?}",
            pdus
        );
        next = Pdu::symm();
    }

    let echo = expect_pdu(&mut peer, Pdu::i(0x10, 0x20, 0, 0, b"fits".to_vec()), is_i)
        .await
        .unwrap();
    assert_eq!(echo.kind, PduKind::I(Sequence::new(0, 1)));
    assert_eq!(echo.payload, b"fits");

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn oversized_ui_pdu_is_dropped() {
    let (mut link, mut peer) = echo_link(SapRequest::Explicit(0x11)).await.unwrap();

    let mut next = Pdu::ui(0x11, 0x21, vec![0xaa; 200]);
    for _ in 0..4 {
        let pdus = turn(&mut peer, &next).await.unwrap();
        assert!(
            !pdus.iter().any(|p| p.kind == PduKind::Ui),
            "oversized pdu was echoed: {:?}",
            pdus
        );
        next = Pdu::symm();
    }

    let ui = expect_pdu(&mut peer, Pdu::ui(0x11, 0x21, b"small".to_vec()), |p| {
        p.kind == PduKind::Ui
    })
    .await
    .unwrap();
    assert_eq!(ui.payload, b"small");

    link.deactivate().await.unwrap();
}

#[tokio::test]
async fn slot_is_reused_after_worker_returns() {
    let (mut link, mut peer) = link_with(vec![(accept_and_leave(), SapRequest::Explicit(0x10))])
        .await
        .unwrap();

    for ssap in 0x20..0x24 {
        let connect = Pdu::connect(0x10, ssap, fixtures::connect_parameters(1, None));
        let cc = expect_pdu(&mut peer, connect, |p| p.kind == PduKind::Cc)
            .await
            .unwrap();
        assert_eq!((cc.dsap, cc.ssap), (ssap, 0x10));
        turn(&mut peer, &Pdu::symm()).await.unwrap();
    }

    link.deactivate().await.unwrap();
}
