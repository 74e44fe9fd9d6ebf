// libllcp-rs/libllcp/src/service/mod.rs

//! Service registration.
//!
//! A service is a named entry point bound to a SAP. The dispatcher calls the
//! entry point with a fresh [`Connection`] for every inbound CONNECT and for
//! the first UI PDU of each logical data link. Always-on services are also
//! started once when the link comes up.

pub mod sdp;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::constants::{DEFAULT_MIU, DEFAULT_RW, MAX_MIU, MAX_RW, TLV_MIUX, TLV_RW, TLV_SN};
use crate::protocol::parameter::{self, Parameter};
use crate::{Error, Result};

pub use sdp::sdp_service;

/// Future returned by a service entry point
pub type ServiceFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type EntryPoint = dyn Fn(Connection) -> ServiceFuture + Send + Sync;

/// A named entry point bound to a SAP
#[derive(Clone)]
pub struct Service {
    name: String,
    entry_point: Arc<EntryPoint>,
    requested_miu: u16,
    requested_rw: u8,
    always_on: bool,
}

impl Service {
    /// Service running `entry_point` once per connection
    pub fn new<F, Fut>(name: impl Into<String>, entry_point: F) -> Self
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.into(),
            entry_point: Arc::new(move |conn| Box::pin(entry_point(conn)) as ServiceFuture),
            requested_miu: DEFAULT_MIU,
            requested_rw: DEFAULT_RW,
            always_on: false,
        }
    }

    /// Largest payload this service accepts on its connections
    pub fn with_miu(mut self, miu: u16) -> Self {
        self.requested_miu = miu;
        self
    }

    /// Local receive window offered on its connections
    pub fn with_rw(mut self, rw: u8) -> Self {
        self.requested_rw = rw;
        self
    }

    /// Start the entry point once at link activation
    pub fn always_on(mut self) -> Self {
        self.always_on = true;
        self
    }

    /// Name used for SDP lookups
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIU advertised on connections
    pub fn requested_miu(&self) -> u16 {
        self.requested_miu
    }

    /// Receive window advertised on connections
    pub fn requested_rw(&self) -> u8 {
        self.requested_rw
    }

    /// Started as a logical data link when the link activates
    pub fn is_always_on(&self) -> bool {
        self.always_on
    }

    /// Check the registration can be expressed in CONNECT/CC parameters.
    pub fn validate(&self) -> Result<()> {
        if !(DEFAULT_MIU..=MAX_MIU).contains(&self.requested_miu) {
            return Err(Error::invalid_value(
                TLV_MIUX,
                format!(
                    "service miu {} outside {}..={}",
                    self.requested_miu, DEFAULT_MIU, MAX_MIU
                ),
            ));
        }
        if self.requested_rw > MAX_RW {
            return Err(Error::invalid_value(
                TLV_RW,
                format!("service rw {} exceeds {}", self.requested_rw, MAX_RW),
            ));
        }
        if self.name.len() > usize::from(u8::MAX) {
            return Err(Error::invalid_value(
                TLV_SN,
                format!("service name of {} bytes", self.name.len()),
            ));
        }
        Ok(())
    }

    /// MIUX and RW advertised in CONNECT and CC PDUs.
    pub(crate) fn connection_parameters(&self) -> Result<Vec<u8>> {
        parameter::encode_all(&[
            Parameter::Miux(self.requested_miu - DEFAULT_MIU),
            Parameter::Rw(self.requested_rw),
        ])
    }

    pub(crate) fn spawn(&self, connection: Connection) -> JoinHandle<()> {
        tokio::spawn((self.entry_point)(connection))
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("requested_miu", &self.requested_miu)
            .field("requested_rw", &self.requested_rw)
            .field("always_on", &self.always_on)
            .finish_non_exhaustive()
    }
}
