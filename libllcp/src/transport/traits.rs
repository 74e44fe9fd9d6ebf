// libllcp-rs/libllcp/src/transport/traits.rs

use async_trait::async_trait;

use crate::Result;

/// Duplex channel to the MAC layer. The link dispatcher is its only user
/// once a link is active.
#[async_trait]
pub trait MacTransport: Send {
    /// Send one LLCP frame to the peer
    async fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Wait for the next LLCP frame from the peer
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Release the channel. Called once when the link goes down; further
    /// sends and receives may fail.
    fn abort(&mut self);
}
