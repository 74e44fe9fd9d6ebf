use libllcp::protocol::{Pdu, PduKind, aggregate, dispatch};
use libllcp::Error;

#[test]
fn aggregate_then_dispatch_preserves_order() {
    let pdus = vec![
        Pdu::connect(0x01, 0x20, vec![0x06, 0x01, b'x']),
        Pdu::i(0x21, 0x11, 0, 0, b"hello".to_vec()),
        Pdu::rr(0x22, 0x12, 3),
    ];
    let agf = aggregate(&pdus, 128).expect("aggregate");
    assert_eq!(agf.kind, PduKind::Agf);
    let frame = agf.pack().unwrap();
    // AGF header is dsap 0, ptype 2, ssap 0
    assert_eq!(&frame[..2], &[0x00, 0x80]);

    let back = Pdu::unpack(&frame).unwrap();
    assert_eq!(dispatch(&back).unwrap(), pdus);
}

#[test]
fn aggregate_respects_miu() {
    let pdus = vec![Pdu::ui(0x10, 0x20, vec![0; 60]), Pdu::ui(0x10, 0x20, vec![0; 60])];
    assert!(matches!(
        aggregate(&pdus, 100),
        Err(Error::InvalidLength { expected: 100, .. })
    ));
}

#[test]
fn nested_aggregation_is_refused() {
    let inner = aggregate(&[Pdu::symm()], 128).unwrap();
    assert!(aggregate(&[inner.clone()], 128).is_err());

    let inner_bytes = inner.pack().unwrap();
    let mut payload = (inner_bytes.len() as u16).to_be_bytes().to_vec();
    payload.extend_from_slice(&inner_bytes);
    let outer = Pdu::new(0, 0, PduKind::Agf, payload);
    assert!(matches!(dispatch(&outer), Err(Error::MalformedPdu(_))));
}

#[test]
fn dispatch_refuses_overrun_and_non_agf() {
    let truncated = Pdu::new(0, 0, PduKind::Agf, vec![0x00, 0x05, 0x00, 0x00]);
    assert!(matches!(dispatch(&truncated), Err(Error::MalformedPdu(_))));
    assert!(matches!(
        dispatch(&Pdu::symm()),
        Err(Error::NotAggregated)
    ));
}
