// fixtures.rs: provides commonly used parameter blocks and service names

use libllcp::protocol::parameter::{self, Parameter};
use libllcp::Version;

pub const ECHO_URI: &str = "com.example.echo";

/// Peer parameter block: VERSION 1.0, MIUX 0, WKS 0x0013, LTO 500 ms, OPT 3.
pub fn peer_parameters() -> Vec<u8> {
    hex::decode("0101100202000003020013040132070103").unwrap()
}

/// Same block with a larger MIU (MIUX 0x80, so 256 bytes).
pub fn peer_parameters_miu_256() -> Vec<u8> {
    parameter::encode_all(&[
        Parameter::Version(Version::new(1, 0)),
        Parameter::Miux(0x80),
        Parameter::Wks(0x0013),
        Parameter::Lto(50),
        Parameter::Opt(3),
    ])
    .unwrap()
}

/// CONNECT parameters with a receive window and an optional service name.
pub fn connect_parameters(rw: u8, service_name: Option<&str>) -> Vec<u8> {
    let mut params = vec![Parameter::Miux(0), Parameter::Rw(rw)];
    if let Some(name) = service_name {
        params.push(Parameter::Sn(name.to_string()));
    }
    parameter::encode_all(&params).unwrap()
}
