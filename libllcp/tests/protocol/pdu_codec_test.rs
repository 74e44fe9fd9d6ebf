use libllcp::protocol::{Pdu, PduKind, Sequence};
use libllcp::{DisconnectReason, Error};

#[test]
fn connect_header_matches_wire_capture() {
    let frame = hex::decode("0520050102").unwrap();
    let pdu = Pdu::unpack(&frame).expect("unpack");
    assert_eq!(pdu.dsap, 0x01);
    assert_eq!(pdu.ssap, 0x20);
    assert_eq!(pdu.kind, PduKind::Connect);
    assert_eq!(pdu.payload, vec![0x05, 0x01, 0x02]);
    assert_eq!(pdu.pack().unwrap(), frame);
}

#[test]
fn sequenced_pdus_carry_extra_byte() {
    let i = Pdu::i(0x20, 0x10, 2, 7, b"abc".to_vec());
    let bytes = i.pack().unwrap();
    assert_eq!(bytes.len(), 6);
    assert_eq!(bytes[2], 0x27);
    assert_eq!(
        Pdu::unpack(&bytes).unwrap().kind,
        PduKind::I(Sequence::new(2, 7))
    );

    let rnr = Pdu::rnr(0x20, 0x10, 9);
    assert_eq!(rnr.pack().unwrap(), vec![0x83, 0x90, 0x09]);
}

#[test]
fn dm_reason_round_trip() {
    let dm = Pdu::dm(0x20, 0x10, DisconnectReason::NO_ROOM);
    let back = Pdu::unpack(&dm.pack().unwrap()).unwrap();
    assert_eq!(back.dm_reason().unwrap(), DisconnectReason::TemporaryRejectAny);
}

#[test]
fn pack_into_reports_small_buffer() {
    let pdu = Pdu::ui(0x10, 0x20, vec![0; 10]);
    let mut buf = [0u8; 4];
    assert!(matches!(
        pdu.pack_into(&mut buf),
        Err(Error::BufferTooSmall {
            needed: 12,
            capacity: 4
        })
    ));
}

#[test]
fn out_of_range_sap_is_refused() {
    assert!(Pdu::ui(0x40, 0x01, vec![]).pack().is_err());
}
