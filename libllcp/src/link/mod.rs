// libllcp-rs/libllcp/src/link/mod.rs

//! LLCP link: negotiated parameters, service bindings and the activation
//! state machine.
//!
//! ```text
//! Inactive -> Activating -> Active -> Deactivating -> Inactive
//! ```
//!
//! While active, a dispatcher task owns the MAC transport and every
//! connection slot; the [`Link`] only keeps a handle on it.

/// Fluent link construction
pub mod builder;
/// Link configuration
pub mod config;
pub(crate) mod dispatcher;
pub mod parameters;
pub mod sap_table;

use std::sync::Arc;

use derive_more::Display;
use log::{debug, info, warn};
use tokio::sync::oneshot;

use crate::connection::WorkerHandle;
use crate::constants::SDP_SAP;
use crate::service::{Service, sdp_service};
use crate::transport::MacTransport;
use crate::types::{Role, SapRequest};
use crate::{Error, Result};

pub use builder::LinkBuilder;
pub use config::LinkConfig;
pub use dispatcher::ConnectTarget;
pub use parameters::{LinkParameters, general_bytes, strip_magic, version_agreement};
pub use sap_table::SapTable;

use dispatcher::{Request, Running};

/// Lifecycle state of a [`Link`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No MAC link
    #[display(fmt = "inactive")]
    Inactive,
    /// Parameters exchanged, dispatcher starting
    #[display(fmt = "activating")]
    Activating,
    /// Dispatcher running
    #[display(fmt = "active")]
    Active,
    /// Dispatcher shutting down
    #[display(fmt = "deactivating")]
    Deactivating,
}

/// An LLCP link: service bindings, configuration and, once activated, the running dispatcher
pub struct Link {
    config: LinkConfig,
    state: LinkState,
    role: Option<Role>,
    params: LinkParameters,
    services: SapTable,
    running: Option<Running>,
}

impl Link {
    /// New inactive link with the service discovery service bound at SAP 1.
    pub fn new(config: LinkConfig) -> Result<Self> {
        config.validate()?;
        let mut services = SapTable::new();
        services.bind(sdp_service(), SapRequest::Explicit(SDP_SAP))?;
        Ok(Self {
            params: LinkParameters::from_config(&config),
            config,
            state: LinkState::Inactive,
            role: None,
            services,
            running: None,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Role taken at activation, `None` while inactive
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Configuration the link was built with
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Current link parameters, including updates received by PAX while
    /// active.
    pub fn parameters(&self) -> LinkParameters {
        match &self.running {
            Some(running) => *running.parameters.borrow(),
            None => self.params,
        }
    }

    /// Bind a service. Bindings are taken into account at the next
    /// activation.
    pub fn bind(&mut self, service: Service, sap: impl Into<SapRequest>) -> Result<u8> {
        if self.state != LinkState::Inactive {
            debug!("binding while {}: effective from the next activation", self.state);
        }
        self.services.bind(service, sap.into())
    }

    /// Remove the service bound at `sap`
    pub fn unbind(&mut self, sap: u8) -> Option<Arc<Service>> {
        self.services.unbind(sap)
    }

    /// Bound services by SAP
    pub fn services(&self) -> &SapTable {
        &self.services
    }

    /// SAP of the service bound under `name`
    pub fn find_sap_by_uri(&self, name: &str) -> Option<u8> {
        self.services.find_sap_by_uri(name)
    }

    /// Well-known service bitmap of the bound services
    pub fn wks(&self) -> u16 {
        self.services.wks()
    }

    /// Local parameter block: VERSION, MIUX, WKS, LTO, OPT.
    pub fn encode_parameters(&self) -> Result<Vec<u8>> {
        let mut params = self.parameters();
        params.local_wks = self.wks();
        params.encode()
    }

    /// Local parameters prefixed with the LLCP magic number, as exchanged
    /// during MAC activation.
    pub fn general_bytes(&self) -> Result<Vec<u8>> {
        Ok(general_bytes(&self.encode_parameters()?))
    }

    /// Apply the peer's parameter block. Nothing changes unless every
    /// parameter is valid.
    pub fn configure(&mut self, tlvs: &[u8]) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::InvalidState(
                "link parameters are owned by the dispatcher while active".into(),
            ));
        }
        self.params.configure(tlvs)
    }

    /// Activate the link over `transport` with the peer's parameter block.
    ///
    /// On failure the link is deactivated again and the transport aborted.
    pub async fn activate(
        &mut self,
        role: Role,
        mut transport: Box<dyn MacTransport>,
        peer_parameters: &[u8],
    ) -> Result<()> {
        if self.state != LinkState::Inactive {
            return Err(Error::InvalidState(format!(
                "cannot activate a link that is {}",
                self.state
            )));
        }
        info!("activating link as {}", role);
        self.state = LinkState::Activating;
        self.role = Some(role);
        self.params = LinkParameters::from_config(&self.config);
        self.params.local_wks = self.wks();

        if let Err(e) = self.params.configure(peer_parameters) {
            warn!("link activation failed: {}", e);
            transport.abort();
            self.deactivate().await?;
            return Err(e);
        }

        info!(
            "link active: version {}, miu {}/{}, lto {:?}/{:?}",
            self.params.version,
            self.params.local_miu,
            self.params.remote_miu,
            self.params.local_lto,
            self.params.remote_lto
        );
        self.running = Some(dispatcher::spawn(
            role,
            transport,
            self.params,
            Arc::new(self.services.clone()),
            &self.config,
        ));
        self.state = LinkState::Active;
        Ok(())
    }

    /// Stop every worker and the dispatcher and release the transport. A
    /// no-op on an inactive link.
    pub async fn deactivate(&mut self) -> Result<()> {
        if self.state == LinkState::Inactive {
            return Ok(());
        }
        self.state = LinkState::Deactivating;
        let result = match self.running.take() {
            Some(running) => {
                self.params = *running.parameters.borrow();
                running.token.cancel();
                join_dispatcher(running).await
            }
            None => Ok(()),
        };
        self.state = LinkState::Inactive;
        self.role = None;
        info!("link deactivated");
        result
    }

    /// Wait until the dispatcher stops on its own (transport failure or
    /// deactivation by the peer), then finish deactivation.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        self.params = *running.parameters.borrow();
        let result = join_dispatcher(running).await;
        self.state = LinkState::Inactive;
        self.role = None;
        result
    }

    /// Open a data link connection from the service bound at `local_sap`
    /// and start its entry point once the peer accepts.
    pub async fn connect(&self, local_sap: u8, target: ConnectTarget) -> Result<WorkerHandle> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| Error::InvalidState("link is not active".into()))?;
        let (reply, response) = oneshot::channel();
        running
            .requests
            .send(Request::Connect {
                local_sap,
                target,
                reply,
            })
            .await
            .map_err(|_| Error::Disconnected)?;
        response.await.map_err(|_| Error::Disconnected)?
    }
}

async fn join_dispatcher(running: Running) -> Result<()> {
    running
        .join
        .await
        .map_err(|e| Error::InvalidState(format!("dispatcher task failed: {}", e)))?
}
