//! # Subnet Model
//!
//! A validated IPv4 network in CIDR notation (e.g. `192.168.1.0/24`).
//!
//! Parsing is strict: the `/prefix` mask is mandatory and the address part must
//! be the network address itself, so `10.0.0.0` and `10.0.0.1/24` are both
//! rejected with [`ScanError::InvalidSubnet`].

use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    network: Ipv4Network,
}

impl Subnet {
    pub fn network_addr(&self) -> Ipv4Addr {
        self.network.network()
    }

    pub fn broadcast_addr(&self) -> Ipv4Addr {
        self.network.broadcast()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }

    /// Identifier safe for table and file names: `10.0.0.0/30` becomes `10_0_0_0_30`.
    pub fn storage_key(&self) -> String {
        let [a, b, c, d] = self.network_addr().octets();
        format!("{a}_{b}_{c}_{d}_{}", self.prefix())
    }
}

impl FromStr for Subnet {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ScanError::InvalidSubnet {
            input: s.to_string(),
            reason,
        };

        let Some((ip_str, prefix_str)) = s.trim().split_once('/') else {
            return Err(invalid("missing '/prefix' network mask".to_string()));
        };

        let ipv4_addr = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|e| invalid(format!("invalid IP '{ip_str}': {e}")))?;

        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|e| invalid(format!("invalid prefix '{prefix_str}': {e}")))?;

        let network = Ipv4Network::new(ipv4_addr, prefix).map_err(|e| invalid(e.to_string()))?;

        if network.network() != ipv4_addr {
            return Err(invalid(format!(
                "host bits set, the network address is {}/{prefix}",
                network.network()
            )));
        }

        Ok(Self { network })
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_addr(), self.prefix())
    }
}

impl Ord for Subnet {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |s: &Subnet| (u32::from(s.network_addr()), s.prefix());
        key(self).cmp(&key(other))
    }
}

impl PartialOrd for Subnet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Subnet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Subnet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses every entry before returning, so one bad subnet rejects the whole batch.
pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Subnet>, ScanError> {
    inputs.iter().map(|s| s.as_ref().parse()).collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
