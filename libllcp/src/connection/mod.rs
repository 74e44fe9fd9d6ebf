// libllcp-rs/libllcp/src/connection/mod.rs

//! Connection endpoints.
//!
//! A [`Connection`] is handed by value to the service worker that owns it,
//! so its sequence state is only ever touched from that worker. It talks to
//! the link dispatcher through two bounded channels: inbound PDUs addressed
//! to it, and outbound requests shared by every worker of the link.

/// Join handle of a spawned worker
pub mod handle;
pub mod sequence;

use std::collections::VecDeque;

use derive_more::Display;
use log::{debug, info, trace, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::link::dispatcher::Request;
use crate::protocol::parameter::{self, Parameter};
use crate::protocol::pdu::{Pdu, PduKind};
use crate::types::DisconnectReason;
use crate::{Error, Result};

pub use handle::WorkerHandle;
pub use sequence::{Receipt, SequenceState};

/// Transport flavour of a connection
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Connectionless transport (UI PDUs)
    #[display(fmt = "logical data link")]
    LogicalDataLink,
    /// Connection-oriented transport (I, RR, RNR PDUs)
    #[display(fmt = "data link connection")]
    DataLinkConnection,
}

/// Lifecycle state of a connection
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Closed by either side, or rejected
    #[display(fmt = "disconnected")]
    Disconnected,
    /// Inbound CONNECT waiting for accept or reject
    #[display(fmt = "connection requested")]
    ConnectionRequested,
    /// Data may flow
    #[display(fmt = "connected")]
    Connected,
}

/// Negotiated limits of a data link connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    /// Largest information field the peer accepts
    pub miu: u16,
    /// Largest information field we accept, advertised in CC
    pub local_miu: u16,
    pub rwr: u8,
    pub rwl: u8,
}

/// Dispatcher side of the channels, set up by the dispatcher for each
/// endpoint it creates.
pub(crate) struct Channels {
    pub id: u64,
    pub inbound: mpsc::Receiver<Pdu>,
    pub outbound: mpsc::Sender<Request>,
    pub token: CancellationToken,
}

/// One endpoint of a logical data link or data link connection, owned by its worker
pub struct Connection {
    id: u64,
    kind: ConnectionKind,
    status: ConnectionStatus,
    local_sap: u8,
    remote_sap: u8,
    window: Window,
    seq: SequenceState,
    peer_busy: bool,
    received: VecDeque<(u8, Vec<u8>)>,
    /// PDUs read off `inbound` while waiting for room on `outbound`
    pending: VecDeque<Pdu>,
    inbound: mpsc::Receiver<Pdu>,
    outbound: mpsc::Sender<Request>,
    token: CancellationToken,
}

impl Connection {
    /// Connectionless endpoint. A `remote_sap` of 0 accepts UI PDUs from
    /// any remote SAP.
    pub(crate) fn logical(local_sap: u8, remote_sap: u8, miu: u16, channels: Channels) -> Self {
        let window = Window {
            miu,
            local_miu: miu,
            rwr: 0,
            rwl: 0,
        };
        Self::new(
            ConnectionKind::LogicalDataLink,
            ConnectionStatus::Connected,
            local_sap,
            remote_sap,
            window,
            channels,
        )
    }

    pub(crate) fn data_link(
        status: ConnectionStatus,
        local_sap: u8,
        remote_sap: u8,
        window: Window,
        channels: Channels,
    ) -> Self {
        Self::new(
            ConnectionKind::DataLinkConnection,
            status,
            local_sap,
            remote_sap,
            window,
            channels,
        )
    }

    fn new(
        kind: ConnectionKind,
        status: ConnectionStatus,
        local_sap: u8,
        remote_sap: u8,
        window: Window,
        channels: Channels,
    ) -> Self {
        Self {
            id: channels.id,
            kind,
            status,
            local_sap,
            remote_sap,
            window,
            seq: SequenceState::new(),
            peer_busy: false,
            received: VecDeque::new(),
            pending: VecDeque::new(),
            inbound: channels.inbound,
            outbound: channels.outbound,
            token: channels.token,
        }
    }

    /// Logical data link or data link connection
    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// Current lifecycle state
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// SAP this endpoint is bound to
    pub fn local_sap(&self) -> u8 {
        self.local_sap
    }

    /// Remote SAP, 0 for a logical data link accepting any sender
    pub fn remote_sap(&self) -> u8 {
        self.remote_sap
    }

    /// Largest payload accepted by [`send`](Self::send)
    pub fn miu(&self) -> u16 {
        self.window.miu
    }

    /// Receive window of the peer
    pub fn rwr(&self) -> u8 {
        self.window.rwr
    }

    /// Our receive window
    pub fn rwl(&self) -> u8 {
        self.window.rwl
    }

    /// Sequence state variables
    pub fn sequence(&self) -> &SequenceState {
        &self.seq
    }

    /// The peer sent RNR and has not sent RR since
    pub fn is_peer_busy(&self) -> bool {
        self.peer_busy
    }

    /// Accept a connection request.
    ///
    /// # Panics
    ///
    /// If the connection is not in `ConnectionRequested`.
    pub async fn accept(&mut self) -> Result<()> {
        assert!(
            self.kind == ConnectionKind::DataLinkConnection
                && self.status == ConnectionStatus::ConnectionRequested,
            "accept() on a {} in state {}",
            self.kind,
            self.status
        );
        let mut params = Vec::new();
        Parameter::Miux(self.window.local_miu - crate::constants::DEFAULT_MIU)
            .encode_into(&mut params)?;
        Parameter::Rw(self.window.rwl).encode_into(&mut params)?;

        self.transmit(Pdu::cc(self.remote_sap, self.local_sap, params))
            .await?;
        self.status = ConnectionStatus::Connected;
        info!(
            "connection {:#04x} <- {:#04x} accepted (miu {}, rwr {})",
            self.local_sap, self.remote_sap, self.window.miu, self.window.rwr
        );
        Ok(())
    }

    /// Refuse a connection request and release its slot.
    ///
    /// # Panics
    ///
    /// If the connection is not in `ConnectionRequested`.
    pub async fn reject(&mut self) -> Result<()> {
        assert!(
            self.kind == ConnectionKind::DataLinkConnection
                && self.status == ConnectionStatus::ConnectionRequested,
            "reject() on a {} in state {}",
            self.kind,
            self.status
        );
        self.status = ConnectionStatus::Disconnected;
        self.transmit(Pdu::dm(
            self.remote_sap,
            self.local_sap,
            DisconnectReason::Rejected,
        ))
        .await?;
        info!(
            "connection {:#04x} <- {:#04x} rejected",
            self.local_sap, self.remote_sap
        );
        self.release().await
    }

    /// Send one payload to the peer.
    ///
    /// On a data link connection this is an I PDU and fails with
    /// `SequenceViolation` while the remote window is full or the peer
    /// reported itself busy.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.check_miu(data)?;
        match self.kind {
            ConnectionKind::LogicalDataLink => {
                if self.remote_sap == 0 {
                    return Err(Error::InvalidState(
                        "logical data link has no fixed remote sap, use send_to".into(),
                    ));
                }
                let remote = self.remote_sap;
                self.send_to(remote, data).await
            }
            ConnectionKind::DataLinkConnection => {
                if self.status != ConnectionStatus::Connected {
                    return Err(Error::Disconnected);
                }
                if self.peer_busy {
                    return Err(Error::SequenceViolation("peer is busy".into()));
                }
                let seq = self.seq.next_send(self.window.rwr)?;
                trace!(
                    "{:#04x} -> {:#04x}: I n(s)={} n(r)={} ({} bytes)",
                    self.local_sap,
                    self.remote_sap,
                    seq.ns,
                    seq.nr,
                    data.len()
                );
                self.transmit(Pdu::i(
                    self.remote_sap,
                    self.local_sap,
                    seq.ns,
                    seq.nr,
                    data.to_vec(),
                ))
                .await
            }
        }
    }

    /// Send a UI PDU to an explicit remote SAP.
    pub async fn send_to(&mut self, remote_sap: u8, data: &[u8]) -> Result<()> {
        if self.kind != ConnectionKind::LogicalDataLink {
            return Err(Error::InvalidState(
                "send_to is only valid on a logical data link".into(),
            ));
        }
        self.check_miu(data)?;
        self.transmit(Pdu::ui(remote_sap, self.local_sap, data.to_vec()))
            .await
    }

    /// Next payload from the peer.
    pub async fn recv(&mut self) -> Result<Vec<u8>> {
        self.recv_from().await.map(|(_, data)| data)
    }

    /// Next payload from the peer together with its source SAP.
    pub async fn recv_from(&mut self) -> Result<(u8, Vec<u8>)> {
        if self.status == ConnectionStatus::ConnectionRequested {
            return Err(Error::InvalidState(
                "connection must be accepted before receiving".into(),
            ));
        }
        loop {
            if let Some(item) = self.received.pop_front() {
                return Ok(item);
            }
            if self.status == ConnectionStatus::Disconnected {
                return Err(Error::Disconnected);
            }
            let pdu = self.next_inbound().await?;
            self.process(pdu).await?;
        }
    }

    /// Process inbound PDUs until an I PDU may be sent. Payloads that
    /// arrive meanwhile are kept for [`recv`](Self::recv).
    pub async fn wait_for_window(&mut self) -> Result<()> {
        if self.kind != ConnectionKind::DataLinkConnection {
            return Ok(());
        }
        while self.peer_busy || !self.seq.can_send(self.window.rwr) {
            if self.status != ConnectionStatus::Connected {
                return Err(Error::Disconnected);
            }
            let pdu = self.next_inbound().await?;
            self.process(pdu).await?;
        }
        Ok(())
    }

    /// Disconnect from the owning worker. Sends DISC when connected and
    /// releases the slot; a second call does nothing.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status == ConnectionStatus::Disconnected {
            return Ok(());
        }
        let was_connected = self.status == ConnectionStatus::Connected;
        self.status = ConnectionStatus::Disconnected;
        if self.kind == ConnectionKind::DataLinkConnection && was_connected {
            if let Err(e) = self
                .transmit(Pdu::disc(self.remote_sap, self.local_sap))
                .await
            {
                debug!("disc for {:#04x} not sent: {}", self.local_sap, e);
                return Ok(());
            }
        }
        info!(
            "{} {:#04x} <-> {:#04x} stopped",
            self.kind, self.local_sap, self.remote_sap
        );
        // the dispatcher is gone when the link went down first
        let _ = self.release().await;
        Ok(())
    }

    fn check_miu(&self, data: &[u8]) -> Result<()> {
        if data.len() > usize::from(self.window.miu) {
            return Err(Error::InvalidLength {
                expected: usize::from(self.window.miu),
                actual: data.len(),
            });
        }
        Ok(())
    }

    async fn next_inbound(&mut self) -> Result<Pdu> {
        if let Some(pdu) = self.pending.pop_front() {
            return Ok(pdu);
        }
        tokio::select! {
            _ = self.token.cancelled() => {
                self.status = ConnectionStatus::Disconnected;
                Err(Error::Disconnected)
            }
            pdu = self.inbound.recv() => pdu.ok_or_else(|| {
                self.status = ConnectionStatus::Disconnected;
                Error::Disconnected
            }),
        }
    }

    /// Apply one inbound PDU; any payload it carries is queued in `received`.
    async fn process(&mut self, pdu: Pdu) -> Result<()> {
        match pdu.kind {
            PduKind::Ui => {
                self.received.push_back((pdu.ssap, pdu.payload));
            }
            PduKind::I(seq) => {
                if self.status != ConnectionStatus::Connected {
                    debug!("dropping I pdu on {} connection", self.status);
                    return Ok(());
                }
                match self.seq.receive(seq.ns) {
                    Receipt::Accepted => {
                        self.apply_ack(seq.nr);
                        self.received.push_back((pdu.ssap, pdu.payload));
                        let nr = self.seq.ack_value();
                        self.transmit(Pdu::rr(self.remote_sap, self.local_sap, nr))
                            .await?;
                    }
                    Receipt::OutOfOrder { expected } => {
                        warn!(
                            "{:#04x}: out of order n(s) {} (expected {}), resynchronising",
                            self.local_sap, seq.ns, expected
                        );
                        self.transmit(Pdu::rr(self.remote_sap, self.local_sap, expected))
                            .await?;
                    }
                }
            }
            PduKind::Rr(seq) => {
                self.peer_busy = false;
                self.apply_ack(seq.nr);
            }
            PduKind::Rnr(seq) => {
                self.peer_busy = true;
                self.apply_ack(seq.nr);
            }
            PduKind::Disc | PduKind::Dm | PduKind::Frmr => {
                info!(
                    "{:#04x} <-> {:#04x} closed by peer ({:?})",
                    self.local_sap, self.remote_sap, pdu.kind
                );
                self.status = ConnectionStatus::Disconnected;
            }
            other => debug!("{:#04x}: ignoring {:?}", self.local_sap, other),
        }
        Ok(())
    }

    fn apply_ack(&mut self, nr: u8) {
        if let Err(e) = self.seq.acknowledge(nr) {
            warn!("{:#04x}: {}", self.local_sap, e);
        }
    }

    async fn transmit(&mut self, pdu: Pdu) -> Result<()> {
        self.request(Request::Transmit(pdu)).await
    }

    async fn release(&mut self) -> Result<()> {
        self.request(Request::Release {
            kind: self.kind,
            local_sap: self.local_sap,
            remote_sap: self.remote_sap,
            id: self.id,
        })
        .await
    }

    /// Queue a request for the dispatcher. The dispatcher stops taking
    /// requests while its backlog is full, so inbound PDUs are buffered
    /// here meanwhile to keep its deliveries moving.
    async fn request(&mut self, request: Request) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.token.cancelled() => return Err(Error::Disconnected),
                permit = self.outbound.reserve() => {
                    let permit = permit.map_err(|_| Error::Disconnected)?;
                    permit.send(request);
                    return Ok(());
                }
                Some(pdu) = self.inbound.recv() => self.pending.push_back(pdu),
            }
        }
    }
}

/// Connection parameters carried by CONNECT or CC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Negotiated {
    pub miux: Option<u16>,
    pub rw: Option<u8>,
    pub sn: Option<String>,
}

impl Negotiated {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut out = Self::default();
        for p in crate::protocol::tlv::decode_all(payload)? {
            match p {
                Parameter::Miux(m) => out.miux = Some(m),
                Parameter::Rw(r) => out.rw = Some(r),
                Parameter::Sn(s) => out.sn = Some(s),
                other => debug!("ignoring {:?} in connection parameters", other),
            }
        }
        Ok(out)
    }

    pub fn miu(&self) -> u16 {
        crate::constants::DEFAULT_MIU + self.miux.unwrap_or(0)
    }

    pub fn rw_or(&self, default: u8) -> u8 {
        self.rw.unwrap_or(default)
    }
}

/// CONNECT payload for an outgoing connection.
pub(crate) fn connect_parameters(local: &[u8], service_name: Option<&str>) -> Result<Vec<u8>> {
    let mut out = local.to_vec();
    if let Some(name) = service_name {
        out.extend(parameter::encode_sn(name)?);
    }
    Ok(out)
}
