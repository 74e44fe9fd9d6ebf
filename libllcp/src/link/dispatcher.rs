// libllcp-rs/libllcp/src/link/dispatcher.rs

//! The link dispatcher task.
//!
//! Sole owner of the MAC transport and of the connection slots while the
//! link is active. Frames alternate strictly between the two sides; the
//! initiator sends first and a SYMM goes out whenever nothing is queued.

use std::collections::VecDeque;
use std::sync::Arc;

use derive_more::Display;
use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::{
    self, Channels, Connection, ConnectionKind, ConnectionStatus, Negotiated, Window, WorkerHandle,
};
use crate::constants::{AGF_LENGTH_PREFIX_LEN, LINK_MANAGEMENT_SAP, MAX_SAP, SAP_COUNT, SDP_SAP};
use crate::link::config::LinkConfig;
use crate::link::parameters::LinkParameters;
use crate::link::sap_table::SapTable;
use crate::protocol::agf;
use crate::protocol::pdu::{Pdu, PduKind};
use crate::service::Service;
use crate::transport::MacTransport;
use crate::types::{DisconnectReason, Role};
use crate::utils::frame_summary;
use crate::{Error, Result};

/// Remote end of an outgoing connection
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// A SAP on the peer
    #[display(fmt = "sap {:#04x}", _0)]
    Sap(u8),
    /// Resolved by the peer's service discovery SAP
    #[display(fmt = "'{}'", _0)]
    Name(String),
}

/// Messages from workers and from the [`Link`](crate::link::Link) handle
#[derive(Debug)]
pub(crate) enum Request {
    Transmit(Pdu),
    Release {
        kind: ConnectionKind,
        local_sap: u8,
        remote_sap: u8,
        /// Endpoint identity, so a late release cannot free a reused slot
        id: u64,
    },
    Connect {
        local_sap: u8,
        target: ConnectTarget,
        reply: oneshot::Sender<Result<WorkerHandle>>,
    },
}

/// Dispatcher side of a running worker
struct Endpoint {
    id: u64,
    remote_sap: u8,
    /// Largest information field accepted from the peer
    miu: u16,
    inbound: mpsc::Sender<Pdu>,
    token: CancellationToken,
    /// `None` when the join handle was given to the caller of `connect`
    join: Option<JoinHandle<()>>,
}

impl Endpoint {
    /// The worker dropped its connection without releasing it.
    fn is_abandoned(&self) -> bool {
        self.inbound.is_closed()
    }
}

struct PendingConnect {
    service: Arc<Service>,
    reply: oneshot::Sender<Result<WorkerHandle>>,
}

enum Slot {
    Pending(PendingConnect),
    Open(Endpoint),
}

struct DataLink {
    local_sap: u8,
    /// 0 matches any remote SAP
    remote_sap: u8,
    endpoint: Endpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    Closed,
    Cancelled,
}

/// What the [`Link`](crate::link::Link) keeps of a spawned dispatcher
pub(crate) struct Running {
    pub requests: mpsc::Sender<Request>,
    pub parameters: watch::Receiver<LinkParameters>,
    pub token: CancellationToken,
    pub join: JoinHandle<Result<()>>,
}

pub(crate) struct Dispatcher {
    role: Role,
    transport: Box<dyn MacTransport>,
    params: LinkParameters,
    params_tx: watch::Sender<LinkParameters>,
    services: Arc<SapTable>,
    config: LinkConfig,
    requests: mpsc::Receiver<Request>,
    request_tx: mpsc::Sender<Request>,
    backlog: VecDeque<Pdu>,
    connections: Vec<Option<Slot>>,
    data_links: Vec<Option<DataLink>>,
    next_id: u64,
    token: CancellationToken,
}

pub(crate) fn spawn(
    role: Role,
    transport: Box<dyn MacTransport>,
    params: LinkParameters,
    services: Arc<SapTable>,
    config: &LinkConfig,
) -> Running {
    let (request_tx, requests) = mpsc::channel(config.channel_capacity);
    let (params_tx, parameters) = watch::channel(params);
    let token = CancellationToken::new();

    let dispatcher = Dispatcher {
        role,
        transport,
        params,
        params_tx,
        services,
        config: config.clone(),
        requests,
        request_tx: request_tx.clone(),
        backlog: VecDeque::new(),
        connections: (0..SAP_COUNT).map(|_| None).collect(),
        data_links: (0..SAP_COUNT).map(|_| None).collect(),
        next_id: 0,
        token: token.clone(),
    };

    Running {
        requests: request_tx,
        parameters,
        token,
        join: tokio::spawn(dispatcher.run()),
    }
}

impl Dispatcher {
    async fn run(mut self) -> Result<()> {
        info!("dispatcher started as {}", self.role);
        self.start_always_on();
        let result = self.exchange().await;
        if let Err(e) = &result {
            error!("link dispatcher failed: {}", e);
        }
        self.shutdown().await;
        result
    }

    /// Symmetry loop. Returns `Ok` when cancelled.
    async fn exchange(&mut self) -> Result<()> {
        if self.role == Role::Initiator && !self.transmit().await? {
            return Ok(());
        }
        loop {
            let frame = tokio::select! {
                _ = self.token.cancelled() => return Ok(()),
                frame = self.transport.receive() => frame?,
            };
            self.handle_frame(&frame).await;
            if self.token.is_cancelled() {
                return Ok(());
            }
            // let workers woken by this frame queue their answers
            tokio::task::yield_now().await;
            if !self.transmit().await? {
                return Ok(());
            }
        }
    }

    /// Send the next frame. Returns `false` when cancelled.
    async fn transmit(&mut self) -> Result<bool> {
        self.drain_requests();
        let pdu = self.next_pdu();
        let frame = match pdu.pack() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping {:?} pdu: {}", pdu.kind, e);
                Pdu::symm().pack()?
            }
        };
        trace!("tx {:?} {}", pdu.kind, frame_summary(&frame));
        tokio::select! {
            _ = self.token.cancelled() => Ok(false),
            res = self.transport.send(&frame) => res.map(|_| true),
        }
    }

    /// Front of the backlog, aggregated when several PDUs fit in the
    /// remote MIU, or SYMM when nothing is queued.
    fn next_pdu(&mut self) -> Pdu {
        let miu = usize::from(self.params.remote_miu);
        let mut count = 0;
        let mut len = 0;
        for pdu in &self.backlog {
            let add = AGF_LENGTH_PREFIX_LEN + pdu.size();
            if len + add > miu {
                break;
            }
            len += add;
            count += 1;
        }

        if count < 2 {
            return self.backlog.pop_front().unwrap_or_else(Pdu::symm);
        }
        let batch: Vec<Pdu> = self.backlog.drain(..count).collect();
        agf::aggregate(&batch, miu).unwrap_or_else(|e| {
            warn!("dropping {} pdus that failed to aggregate: {}", batch.len(), e);
            Pdu::symm()
        })
    }

    /// Take worker requests until the backlog holds a frame's worth of
    /// PDUs. Workers beyond that wait on the bounded request channel.
    fn drain_requests(&mut self) {
        while !self.backlog_full() {
            match self.requests.try_recv() {
                Ok(request) => self.handle_request(request),
                Err(_) => break,
            }
        }
    }

    fn backlog_full(&self) -> bool {
        let queued: usize = self
            .backlog
            .iter()
            .map(|pdu| AGF_LENGTH_PREFIX_LEN + pdu.size())
            .sum();
        self.backlog.len() >= self.config.channel_capacity
            || queued >= usize::from(self.params.remote_miu)
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Transmit(pdu) => self.backlog.push_back(pdu),
            Request::Release {
                kind,
                local_sap,
                remote_sap,
                id,
            } => self.release(kind, local_sap, remote_sap, id),
            Request::Connect {
                local_sap,
                target,
                reply,
            } => self.open_connection(local_sap, target, reply),
        }
    }

    fn release(&mut self, kind: ConnectionKind, local_sap: u8, remote_sap: u8, id: u64) {
        match kind {
            ConnectionKind::DataLinkConnection => {
                let idx = usize::from(local_sap);
                if matches!(self.connections.get(idx), Some(Some(Slot::Open(ep))) if ep.id == id) {
                    self.connections[idx] = None;
                    debug!("released connection slot {:#04x}", local_sap);
                }
            }
            ConnectionKind::LogicalDataLink => {
                let found = self.data_links.iter().position(|dl| {
                    dl.as_ref().is_some_and(|dl| dl.endpoint.id == id)
                });
                if let Some(idx) = found {
                    self.data_links[idx] = None;
                    debug!(
                        "released logical data link {:#04x} <-> {:#04x}",
                        local_sap, remote_sap
                    );
                }
            }
        }
    }

    fn open_connection(
        &mut self,
        local_sap: u8,
        target: ConnectTarget,
        reply: oneshot::Sender<Result<WorkerHandle>>,
    ) {
        // the caller may have given up waiting; nothing to do then
        let fail = |reply: oneshot::Sender<Result<WorkerHandle>>, e: Error| {
            let _ = reply.send(Err(e));
        };

        let Some(service) = self.services.get(local_sap).cloned() else {
            return fail(
                reply,
                Error::ServiceNotFound(format!("no service bound at sap {:#04x}", local_sap)),
            );
        };
        let (dsap, name) = match &target {
            ConnectTarget::Sap(sap) if *sap == LINK_MANAGEMENT_SAP || *sap > MAX_SAP => {
                return fail(
                    reply,
                    Error::InvalidState(format!("cannot connect to sap {:#04x}", sap)),
                );
            }
            ConnectTarget::Sap(sap) => (*sap, None),
            ConnectTarget::Name(name) => (SDP_SAP, Some(name.as_str())),
        };
        let Some(slot) = self.free_slot(local_sap) else {
            return fail(reply, Error::NoFreeSap);
        };
        let params = match service
            .connection_parameters()
            .and_then(|local| connection::connect_parameters(&local, name))
        {
            Ok(params) => params,
            Err(e) => return fail(reply, e),
        };

        info!(
            "connecting '{}' on sap {:#04x} to {}",
            service.name(),
            slot,
            target
        );
        self.backlog.push_back(Pdu::connect(dsap, slot, params));
        self.connections[usize::from(slot)] = Some(Slot::Pending(PendingConnect { service, reply }));
    }

    /// First unoccupied connection slot at or above `from`. A slot whose
    /// worker went away without releasing it counts as free.
    fn free_slot(&mut self, from: u8) -> Option<u8> {
        let idx = (usize::from(from)..SAP_COUNT).find(|&idx| match &self.connections[idx] {
            None => true,
            Some(Slot::Open(ep)) => ep.is_abandoned(),
            Some(Slot::Pending(_)) => false,
        })?;
        if self.connections[idx].take().is_some() {
            debug!("reclaimed abandoned connection slot {:#04x}", idx);
        }
        Some(idx as u8)
    }

    /// Largest payload the worker on `local_sap` advertised.
    fn connection_miu(&self, local_sap: u8) -> u16 {
        match self.connections.get(usize::from(local_sap)) {
            Some(Some(Slot::Open(ep))) => ep.miu,
            _ => self.params.local_miu,
        }
    }

    fn open_endpoint(&self, local_sap: u8, remote_sap: u8) -> Option<mpsc::Sender<Pdu>> {
        match self.connections.get(usize::from(local_sap)) {
            Some(Some(Slot::Open(ep))) if ep.remote_sap == remote_sap => Some(ep.inbound.clone()),
            _ => None,
        }
    }

    fn endpoint(&mut self, remote_sap: u8, miu: u16) -> (Endpoint, Channels) {
        let (inbound_tx, inbound) = mpsc::channel(self.config.channel_capacity);
        let token = CancellationToken::new();
        let id = self.next_id;
        self.next_id += 1;
        let endpoint = Endpoint {
            id,
            remote_sap,
            miu,
            inbound: inbound_tx,
            token: token.clone(),
            join: None,
        };
        let channels = Channels {
            id,
            inbound,
            outbound: self.request_tx.clone(),
            token,
        };
        (endpoint, channels)
    }

    /// Hand a PDU to a worker, waiting while its channel is full. Workers
    /// keep reading their inbound channel while blocked on a request, so
    /// this never waits on the request channel.
    async fn deliver(token: CancellationToken, inbound: mpsc::Sender<Pdu>, pdu: Pdu) -> Delivery {
        tokio::select! {
            permit = inbound.reserve() => match permit {
                Ok(permit) => {
                    permit.send(pdu);
                    Delivery::Delivered
                }
                Err(_) => Delivery::Closed,
            },
            _ = token.cancelled() => Delivery::Cancelled,
        }
    }

    async fn handle_frame(&mut self, bytes: &[u8]) {
        let pdu = match Pdu::unpack(bytes) {
            Ok(pdu) => pdu,
            Err(e) => {
                warn!("dropping frame {}: {}", frame_summary(bytes), e);
                return;
            }
        };
        trace!("rx {:?} {}", pdu.kind, frame_summary(bytes));

        if pdu.kind != PduKind::Agf {
            self.route(pdu).await;
            return;
        }
        match agf::dispatch(&pdu) {
            Ok(pdus) => {
                for pdu in pdus {
                    self.route(pdu).await;
                }
            }
            Err(e) => warn!("dropping aggregated frame: {}", e),
        }
    }

    async fn route(&mut self, pdu: Pdu) {
        match pdu.kind {
            PduKind::Symm => {}
            PduKind::Pax => self.handle_pax(&pdu),
            PduKind::Agf => warn!("dropping nested aggregated frame"),
            PduKind::Ui => self.handle_ui(pdu).await,
            PduKind::Connect => self.handle_connect(pdu).await,
            PduKind::Cc => self.handle_cc(pdu),
            PduKind::Disc => self.handle_disc(pdu).await,
            PduKind::Dm | PduKind::Frmr => self.handle_close(pdu).await,
            PduKind::I(_) | PduKind::Rr(_) | PduKind::Rnr(_) => self.handle_data(pdu).await,
            PduKind::Reserved(ptype) => warn!("ignoring pdu of reserved type {:#x}", ptype),
        }
    }

    fn handle_pax(&mut self, pdu: &Pdu) {
        match self.params.configure(&pdu.payload) {
            Ok(()) => {
                self.params_tx.send_replace(self.params);
                info!("link parameters updated by pax");
            }
            Err(e) => warn!("pax refused, keeping current parameters: {}", e),
        }
    }

    async fn handle_ui(&mut self, pdu: Pdu) {
        let (local, remote) = (pdu.dsap, pdu.ssap);
        if pdu.payload.len() > usize::from(self.params.local_miu) {
            warn!(
                "dropping ui pdu for {:#04x}: {} bytes exceed local miu {}",
                local,
                pdu.payload.len(),
                self.params.local_miu
            );
            return;
        }
        let idx = match self.data_link_index(local, remote) {
            Some(idx) => idx,
            None => match self.services.get(local).cloned() {
                Some(service) => match self.spawn_data_link(local, remote, &service) {
                    Some(idx) => idx,
                    None => {
                        warn!("no room for a logical data link to {:#04x}", local);
                        return;
                    }
                },
                None => {
                    debug!("no service at {:#04x}, dropping ui pdu", local);
                    return;
                }
            },
        };

        let Some(inbound) = self.data_links[idx]
            .as_ref()
            .map(|dl| dl.endpoint.inbound.clone())
        else {
            return;
        };
        if Self::deliver(self.token.clone(), inbound, pdu).await == Delivery::Closed {
            debug!("logical data link on {:#04x} closed", local);
            self.data_links[idx] = None;
        }
    }

    /// Exact `(local, remote)` match first, then a link accepting any remote.
    fn data_link_index(&self, local_sap: u8, remote_sap: u8) -> Option<usize> {
        let find = |remote: u8| {
            self.data_links.iter().position(|dl| {
                dl.as_ref().is_some_and(|dl| {
                    dl.local_sap == local_sap
                        && dl.remote_sap == remote
                        && !dl.endpoint.is_abandoned()
                })
            })
        };
        find(remote_sap).or_else(|| find(0))
    }

    fn spawn_data_link(&mut self, local_sap: u8, remote_sap: u8, service: &Service) -> Option<usize> {
        let idx = self.data_links.iter().position(|dl| match dl {
            None => true,
            Some(dl) => dl.endpoint.is_abandoned(),
        })?;
        let miu = self.params.local_miu;
        let (mut endpoint, channels) = self.endpoint(remote_sap, miu);
        let conn = Connection::logical(local_sap, remote_sap, self.params.remote_miu, channels);
        endpoint.join = Some(service.spawn(conn));
        info!(
            "logical data link for '{}' on {:#04x} <-> {:#04x}",
            service.name(),
            local_sap,
            remote_sap
        );
        self.data_links[idx] = Some(DataLink {
            local_sap,
            remote_sap,
            endpoint,
        });
        Some(idx)
    }

    fn start_always_on(&mut self) {
        let services = self.services.clone();
        for (sap, service) in services.iter().filter(|(_, s)| s.is_always_on()) {
            if self.spawn_data_link(sap, 0, service).is_none() {
                warn!("no room to start '{}'", service.name());
            }
        }
    }

    fn refuse(&mut self, pdu: &Pdu, reason: DisconnectReason) {
        warn!(
            "refusing connect from {:#04x} to {:#04x}: {}",
            pdu.ssap, pdu.dsap, reason
        );
        self.backlog.push_back(Pdu::dm(pdu.ssap, pdu.dsap, reason));
    }

    async fn handle_connect(&mut self, pdu: Pdu) {
        let negotiated = match Negotiated::decode(&pdu.payload) {
            Ok(n) => n,
            Err(e) => {
                warn!("malformed connect parameters: {}", e);
                return self.refuse(&pdu, DisconnectReason::SYNTAX_ERROR);
            }
        };

        let target = match (pdu.dsap, negotiated.sn.as_deref()) {
            (SDP_SAP, Some(name)) => match self.services.find_sap_by_uri(name) {
                Some(sap) => {
                    debug!("'{}' resolved to sap {:#04x}", name, sap);
                    sap
                }
                None => return self.refuse(&pdu, DisconnectReason::SERVICE_NOT_FOUND),
            },
            (dsap, _) => dsap,
        };
        let Some(service) = self.services.get(target).cloned() else {
            return self.refuse(&pdu, DisconnectReason::NoService);
        };
        let Some(slot) = self.free_slot(target) else {
            return self.refuse(&pdu, DisconnectReason::NO_ROOM);
        };

        let window = Window {
            miu: negotiated.miu(),
            local_miu: service.requested_miu(),
            rwr: negotiated.rw_or(self.config.default_rw),
            rwl: service.requested_rw(),
        };
        let (mut endpoint, channels) = self.endpoint(pdu.ssap, window.local_miu);
        let conn = Connection::data_link(
            ConnectionStatus::ConnectionRequested,
            slot,
            pdu.ssap,
            window,
            channels,
        );
        info!(
            "connect from {:#04x} for '{}' on sap {:#04x}",
            pdu.ssap,
            service.name(),
            slot
        );
        endpoint.join = Some(service.spawn(conn));
        self.connections[usize::from(slot)] = Some(Slot::Open(endpoint));
    }

    fn handle_cc(&mut self, pdu: Pdu) {
        let local = usize::from(pdu.dsap);
        let pending = match self.connections.get_mut(local) {
            Some(slot @ Some(Slot::Pending(_))) => match slot.take() {
                Some(Slot::Pending(pending)) => pending,
                _ => return,
            },
            _ => {
                debug!("cc for {:#04x} without a pending connect", pdu.dsap);
                return;
            }
        };

        let negotiated = match Negotiated::decode(&pdu.payload) {
            Ok(n) => n,
            Err(e) => {
                warn!("malformed cc parameters, disconnecting: {}", e);
                self.backlog.push_back(Pdu::disc(pdu.ssap, pdu.dsap));
                let _ = pending.reply.send(Err(e));
                return;
            }
        };

        let window = Window {
            miu: negotiated.miu(),
            local_miu: pending.service.requested_miu(),
            rwr: negotiated.rw_or(self.config.default_rw),
            rwl: pending.service.requested_rw(),
        };
        let (endpoint, channels) = self.endpoint(pdu.ssap, window.local_miu);
        let conn = Connection::data_link(
            ConnectionStatus::Connected,
            pdu.dsap,
            pdu.ssap,
            window,
            channels,
        );
        info!(
            "connection {:#04x} -> {:#04x} established (miu {}, rwr {})",
            pdu.dsap, pdu.ssap, window.miu, window.rwr
        );
        let join = pending.service.spawn(conn);
        let handle = WorkerHandle::new(pdu.dsap, pdu.ssap, endpoint.token.clone(), join);
        if pending.reply.send(Ok(handle)).is_err() {
            debug!("connect caller for {:#04x} went away", pdu.dsap);
        }
        self.connections[local] = Some(Slot::Open(endpoint));
    }

    /// DM and FRMR close the addressed connection or fail a pending connect.
    async fn handle_close(&mut self, pdu: Pdu) {
        let local = usize::from(pdu.dsap);
        if let Some(slot @ Some(Slot::Pending(_))) = self.connections.get_mut(local) {
            if let Some(Slot::Pending(pending)) = slot.take() {
                let err = match pdu.kind {
                    PduKind::Dm => pdu
                        .dm_reason()
                        .map_or_else(|e| e, Error::ConnectionRejected),
                    _ => Error::MalformedPdu("connect answered with frmr".into()),
                };
                info!("connect from {:#04x} failed: {}", pdu.dsap, err);
                let _ = pending.reply.send(Err(err));
            }
            return;
        }

        match self.open_endpoint(pdu.dsap, pdu.ssap) {
            Some(inbound) => {
                let (dsap, kind) = (pdu.dsap, pdu.kind);
                if Self::deliver(self.token.clone(), inbound, pdu).await != Delivery::Cancelled {
                    self.connections[local] = None;
                }
                info!("connection on {:#04x} closed by peer ({:?})", dsap, kind);
            }
            None => debug!(
                "{:?} for unknown connection {:#04x} <- {:#04x}",
                pdu.kind, pdu.dsap, pdu.ssap
            ),
        }
    }

    async fn handle_disc(&mut self, pdu: Pdu) {
        let (local, remote) = (pdu.dsap, pdu.ssap);
        if local == LINK_MANAGEMENT_SAP && remote == LINK_MANAGEMENT_SAP {
            info!("link deactivated by peer");
            self.token.cancel();
            return;
        }

        match self.open_endpoint(local, remote) {
            Some(inbound) => {
                if Self::deliver(self.token.clone(), inbound, pdu).await != Delivery::Cancelled {
                    self.connections[usize::from(local)] = None;
                }
                info!("connection {:#04x} <-> {:#04x} disconnected by peer", local, remote);
                self.backlog
                    .push_back(Pdu::dm(remote, local, DisconnectReason::Acknowledged));
            }
            None => {
                debug!("disc for unknown connection {:#04x} <- {:#04x}", local, remote);
                self.backlog
                    .push_back(Pdu::dm(remote, local, DisconnectReason::NoActiveConnection));
            }
        }
    }

    /// I, RR and RNR go to the worker owning the connection.
    async fn handle_data(&mut self, pdu: Pdu) {
        let (local, remote) = (pdu.dsap, pdu.ssap);
        let Some(inbound) = self.open_endpoint(local, remote) else {
            debug!("{:?} for unknown connection {:#04x} <- {:#04x}", pdu.kind, local, remote);
            self.backlog
                .push_back(Pdu::dm(remote, local, DisconnectReason::NoActiveConnection));
            return;
        };
        let miu = self.connection_miu(local);
        if pdu.payload.len() > usize::from(miu) {
            warn!(
                "dropping {:?} for {:#04x}: {} bytes exceed connection miu {}",
                pdu.kind,
                local,
                pdu.payload.len(),
                miu
            );
            return;
        }
        if Self::deliver(self.token.clone(), inbound, pdu).await == Delivery::Closed {
            info!("worker for {:#04x} is gone, releasing its slot", local);
            self.connections[usize::from(local)] = None;
            self.backlog
                .push_back(Pdu::dm(remote, local, DisconnectReason::NoActiveConnection));
        }
    }

    /// Stop every worker in descending SAP order, then release the transport.
    async fn shutdown(&mut self) {
        self.requests.close();

        let mut endpoints: Vec<(u8, Endpoint)> = Vec::new();
        for (sap, slot) in self.connections.iter_mut().enumerate() {
            match slot.take() {
                Some(Slot::Open(ep)) => endpoints.push((sap as u8, ep)),
                Some(Slot::Pending(pending)) => {
                    let _ = pending.reply.send(Err(Error::Disconnected));
                }
                None => {}
            }
        }
        for dl in self.data_links.iter_mut().filter_map(Option::take) {
            endpoints.push((dl.local_sap, dl.endpoint));
        }
        endpoints.sort_by(|a, b| b.0.cmp(&a.0));

        for (sap, ep) in endpoints {
            ep.token.cancel();
            if let Some(join) = ep.join {
                if let Err(e) = join.await {
                    warn!("worker on sap {:#04x} ended abnormally: {}", sap, e);
                }
            }
        }

        while let Ok(request) = self.requests.try_recv() {
            if let Request::Connect { reply, .. } = request {
                let _ = reply.send(Err(Error::Disconnected));
            }
        }
        self.transport.abort();
        info!("dispatcher stopped");
    }
}
