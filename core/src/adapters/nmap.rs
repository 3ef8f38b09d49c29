//! # Nmap Discovery
//!
//! Runs `nmap` in host-discovery mode (ARP ping, no port scan) and reads the
//! normal-format report from stdout.
//!
//! Vendor names come from nmap's own `MAC Address:` line when it knows them;
//! hosts it leaves unnamed fall back to the OUI [`VendorRepository`].

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use netmind_common::config::DiscoveryConfig;
use netmind_common::error::DiscoveryError;
use netmind_common::network::host::HostIdentity;
use netmind_common::network::mac;
use netmind_common::network::subnet::Subnet;
use netmind_common::scanning::DiscoveryAdapter;
use netmind_common::vendors::VendorRepository;
use tokio::process::Command;
use tracing::{debug, info};

const REPORT_PREFIX: &str = "Nmap scan report for ";
const MAC_PREFIX: &str = "MAC Address: ";

pub struct NmapDiscovery {
    nmap_path: PathBuf,
    arguments: Vec<String>,
    timeout: Duration,
    vendor_repo: Option<Box<dyn VendorRepository>>,
}

impl NmapDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            nmap_path: config.nmap_path.clone(),
            arguments: config.arguments.clone(),
            timeout: config.timeout(),
            vendor_repo: None,
        }
    }

    pub fn with_vendor_repo(mut self, vendor_repo: Box<dyn VendorRepository>) -> Self {
        self.vendor_repo = Some(vendor_repo);
        self
    }

    fn enrich_vendors(&self, hosts: &mut [HostIdentity]) {
        let Some(repo) = &self.vendor_repo else {
            return;
        };
        for host in hosts.iter_mut().filter(|host| host.vendor.is_none()) {
            if let Some(mac) = host.link_layer_id {
                host.vendor = repo.get_vendor(mac);
            }
        }
    }
}

#[async_trait]
impl DiscoveryAdapter for NmapDiscovery {
    async fn discover(&self, subnet: &Subnet) -> Result<Vec<HostIdentity>, DiscoveryError> {
        let mut command = Command::new(&self.nmap_path);
        command
            .args(["-oN", "-"])
            .args(&self.arguments)
            .arg(subnet.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        debug!("running {command:?}");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| DiscoveryError::Timeout(self.timeout))?
            .map_err(DiscoveryError::Launch)?;

        if !output.status.success() {
            return Err(DiscoveryError::Exited {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut hosts = parse_report(&String::from_utf8_lossy(&output.stdout));
        self.enrich_vendors(&mut hosts);

        info!("nmap reported {} live host(s) in {subnet}", hosts.len());
        Ok(hosts)
    }
}

/// Extracts hosts from an nmap normal-format report, in report order.
///
/// A `MAC Address:` line belongs to the host block it appears in. Repeated
/// addresses keep their first block only.
pub fn parse_report(report: &str) -> Vec<HostIdentity> {
    let mut hosts: Vec<HostIdentity> = Vec::new();
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    let mut current: Option<usize> = None;

    for line in report.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(REPORT_PREFIX) {
            current = None;
            let Some(address) = report_address(rest) else {
                debug!("skipping unparsable report line: {line}");
                continue;
            };
            if seen.insert(address) {
                hosts.push(HostIdentity::new(address));
                current = Some(hosts.len() - 1);
            }
        } else if let Some(rest) = line.strip_prefix(MAC_PREFIX) {
            let Some(host) = current.and_then(|idx| hosts.get_mut(idx)) else {
                continue;
            };
            let (mac_str, vendor) = match rest.split_once(' ') {
                Some((mac_str, vendor)) => (mac_str, Some(vendor)),
                None => (rest, None),
            };
            host.link_layer_id = mac::parse_mac(mac_str);
            host.vendor = vendor.and_then(report_vendor);
        }
    }

    hosts
}

/// `192.168.1.1` or `router.lan (192.168.1.1)`.
fn report_address(rest: &str) -> Option<Ipv4Addr> {
    let candidate = match (rest.rfind('('), rest.strip_suffix(')')) {
        (Some(open), Some(inner)) => &inner[open + 1..],
        _ => rest.split_whitespace().last()?,
    };
    candidate.parse().ok()
}

/// `(Raspberry Pi Trading)`; nmap prints `(Unknown)` for unlisted prefixes.
fn report_vendor(raw: &str) -> Option<String> {
    let vendor = raw.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if vendor.is_empty() || vendor.eq_ignore_ascii_case("unknown") {
        None
    } else {
        Some(vendor.to_string())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
