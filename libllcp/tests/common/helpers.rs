// helpers.rs: link setup shared by the link integration tests

use libllcp::link::LinkConfig;
use libllcp::test_support;
use libllcp::{Link, MockPeer, Result, SapRequest, Service};

use super::fixtures;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Active link (target role) with `services` bound, driven by the returned
/// peer.
pub async fn link_with(services: Vec<(Service, SapRequest)>) -> Result<(Link, MockPeer)> {
    init_logger();
    test_support::activated_link(
        LinkConfig::default(),
        services,
        &fixtures::peer_parameters(),
    )
    .await
}

/// Active link with the echo service bound at `sap`.
pub async fn echo_link(sap: SapRequest) -> Result<(Link, MockPeer)> {
    link_with(vec![(test_support::echo_service(fixtures::ECHO_URI), sap)]).await
}
