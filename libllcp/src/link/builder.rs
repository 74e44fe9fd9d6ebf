// libllcp-rs/libllcp/src/link/builder.rs

use crate::link::{Link, LinkConfig};
use crate::service::Service;
use crate::types::SapRequest;
use crate::Result;

/// Helper to construct a Link with its configuration and services.
#[derive(Debug, Default)]
pub struct LinkBuilder {
    config: LinkConfig,
    services: Vec<(Service, SapRequest)>,
}

impl LinkBuilder {
    /// Builder with the default configuration and no services
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Local MIU
    pub fn miu(mut self, miu: u16) -> Self {
        self.config.miu = miu;
        self
    }

    /// Local link timeout in milliseconds
    pub fn lto_ms(mut self, lto_ms: u64) -> Self {
        self.config.lto_ms = lto_ms;
        self
    }

    /// Bind `service` on `sap` at build time
    pub fn service(mut self, service: Service, sap: impl Into<SapRequest>) -> Self {
        self.services.push((service, sap.into()));
        self
    }

    /// Validate the configuration and bind every service in order.
    pub fn build(self) -> Result<Link> {
        let mut link = Link::new(self.config)?;
        for (service, sap) in self.services {
            link.bind(service, sap)?;
        }
        Ok(link)
    }
}
