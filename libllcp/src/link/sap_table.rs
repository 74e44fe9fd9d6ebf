// libllcp-rs/libllcp/src/link/sap_table.rs

//! Service bindings indexed by SAP.

use std::sync::Arc;

use log::info;

use crate::constants::{
    ADVERTISED_SAP_LAST, AUTO_SAP_FIRST, AUTO_SAP_LAST, LINK_MANAGEMENT_SAP, MAX_SAP, SAP_COUNT,
    SDP_SAP, WELL_KNOWN_SAP_LAST,
};
use crate::service::Service;
use crate::types::SapRequest;
use crate::{Error, Result};

/// Fixed table of 64 slots, each empty or holding a bound service
#[derive(Debug, Clone)]
pub struct SapTable {
    slots: [Option<Arc<Service>>; SAP_COUNT],
}

impl Default for SapTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SapTable {
    /// Table holding only the SDP service
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Bind `service` and return the SAP it got.
    pub fn bind(&mut self, service: Service, request: SapRequest) -> Result<u8> {
        service.validate()?;
        let sap = match request {
            SapRequest::Auto => (AUTO_SAP_FIRST..=AUTO_SAP_LAST)
                .find(|&sap| self.slots[usize::from(sap)].is_none())
                .ok_or(Error::NoFreeSap)?,
            SapRequest::Explicit(sap) => {
                if sap == LINK_MANAGEMENT_SAP || sap > MAX_SAP {
                    return Err(Error::InvalidState(format!(
                        "sap {:#04x} cannot be bound",
                        sap
                    )));
                }
                if self.slots[usize::from(sap)].is_some() {
                    return Err(Error::AlreadyBound(sap));
                }
                sap
            }
        };
        info!("service '{}' bound to sap {:#04x}", service.name(), sap);
        self.slots[usize::from(sap)] = Some(Arc::new(service));
        Ok(sap)
    }

    /// Clear a slot. Connections already spawned from the service keep
    /// running.
    pub fn unbind(&mut self, sap: u8) -> Option<Arc<Service>> {
        let service = self.slots.get_mut(usize::from(sap))?.take();
        if let Some(s) = &service {
            info!("service '{}' unbound from sap {:#04x}", s.name(), sap);
        }
        service
    }

    /// Service bound at `sap`
    pub fn get(&self, sap: u8) -> Option<&Arc<Service>> {
        self.slots.get(usize::from(sap))?.as_ref()
    }

    /// SAP of the service advertising `name`, scanning [0x01, 0x1F].
    pub fn find_sap_by_uri(&self, name: &str) -> Option<u8> {
        (SDP_SAP..=ADVERTISED_SAP_LAST).find(|&sap| {
            self.get(sap)
                .is_some_and(|service| service.name() == name)
        })
    }

    /// Well-known service bitmap: bit n set when SAP n in [0, 15] is bound.
    /// Bit 0 (link management) is always set.
    pub fn wks(&self) -> u16 {
        (0..=WELL_KNOWN_SAP_LAST)
            .filter(|&sap| self.get(sap).is_some())
            .fold(1u16, |wks, sap| wks | (1 << sap))
    }

    /// Bound services in ascending SAP order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Arc<Service>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(sap, slot)| slot.as_ref().map(|s| (sap as u8, s)))
    }
}
