// libllcp-rs/libllcp/src/transport/mock.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::agf;
use crate::protocol::pdu::{Pdu, PduKind};
use crate::transport::traits::MacTransport;
use crate::{Error, Result};

/// In-memory MAC transport for tests. Frames sent by the link are readable
/// from the paired [`MockPeer`], frames pushed on the peer are what the
/// link receives.
#[derive(Debug)]
pub struct MockTransport {
    to_peer: mpsc::UnboundedSender<Vec<u8>>,
    from_peer: mpsc::UnboundedReceiver<Vec<u8>>,
    aborted: Arc<AtomicBool>,
}

/// Scripted remote end of a [`MockTransport`]
#[derive(Debug)]
pub struct MockPeer {
    sent: mpsc::UnboundedReceiver<Vec<u8>>,
    inject: mpsc::UnboundedSender<Vec<u8>>,
    aborted: Arc<AtomicBool>,
}

impl MockTransport {
    /// Connected transport and peer
    pub fn pair() -> (MockTransport, MockPeer) {
        let (to_peer, sent) = mpsc::unbounded_channel();
        let (inject, from_peer) = mpsc::unbounded_channel();
        let aborted = Arc::new(AtomicBool::new(false));
        (
            MockTransport {
                to_peer,
                from_peer,
                aborted: aborted.clone(),
            },
            MockPeer {
                sent,
                inject,
                aborted,
            },
        )
    }
}

#[async_trait]
impl MacTransport for MockTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        if self.aborted.load(Ordering::SeqCst) {
            return Err(Error::Transport("transport aborted".into()));
        }
        self.to_peer
            .send(frame.to_vec())
            .map_err(|_| Error::Transport("peer closed".into()))
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        self.from_peer
            .recv()
            .await
            .ok_or_else(|| Error::Transport("peer closed".into()))
    }

    fn abort(&mut self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.from_peer.close();
    }
}

impl MockPeer {
    /// Queue a raw frame for the link to receive.
    pub fn push(&self, frame: Vec<u8>) {
        // the link side may already be gone; tests observe that through
        // next_frame returning None
        let _ = self.inject.send(frame);
    }

    /// Queue `pdu` as the next frame the link receives
    pub fn push_pdu(&self, pdu: &Pdu) -> Result<()> {
        self.push(pdu.pack()?);
        Ok(())
    }

    /// Next frame sent by the link, `None` once the link dropped its end.
    pub async fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.sent.recv().await
    }

    /// Next frame sent by the link, with AGF frames split into their PDUs.
    pub async fn next_pdus(&mut self) -> Option<Result<Vec<Pdu>>> {
        let frame = self.next_frame().await?;
        Some(Pdu::unpack(&frame).and_then(|pdu| {
            if pdu.kind == PduKind::Agf {
                agf::dispatch(&pdu)
            } else {
                Ok(vec![pdu])
            }
        }))
    }

    /// Whether the link aborted the transport
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
