//! Capability traits for the external tools the pipeline drives.
//!
//! Implementations live in `netmind-core` (process-backed) and in the test
//! crates (scripted fakes). The pipeline only ever sees these traits.

use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::error::{DiscoveryError, ProbeError};
use crate::network::host::HostIdentity;
use crate::network::subnet::Subnet;

/// Resolves a subnet into its responsive hosts.
#[async_trait]
pub trait DiscoveryAdapter: Send + Sync {
    /// Returns the hosts that answered, in the order the tool reported them.
    async fn discover(&self, subnet: &Subnet) -> Result<Vec<HostIdentity>, DiscoveryError>;
}

/// Runs one reachability probe against a single host.
#[async_trait]
pub trait ProbeAdapter: Send + Sync {
    /// Returns the raw textual output of the probe tool.
    async fn probe(&self, address: Ipv4Addr) -> Result<String, ProbeError>;
}
