use std::net::Ipv4Addr;

use pnet::util::MacAddr;

/// A responsive host as reported by the discovery tool.
///
/// `address` is the identity key within one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub address: Ipv4Addr,
    pub link_layer_id: Option<MacAddr>,
    pub vendor: Option<String>,
}

impl HostIdentity {
    pub fn new(address: Ipv4Addr) -> Self {
        Self {
            address,
            link_layer_id: None,
            vendor: None,
        }
    }

    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.link_layer_id = Some(mac);
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }
}
