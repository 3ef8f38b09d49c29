use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use netmind_common::network::host::HostIdentity;
use netmind_common::network::probe::ProbeResult;
use netmind_common::network::record::EnrichedHostRecord;
use tracing::{debug, trace};

/// Joins discovery identities with probe results on the host address.
///
/// Discovery is the authoritative host universe: the output holds exactly one
/// record per identity, in discovery order. A missing probe result yields
/// unknown probe fields, and probe results for addresses discovery never
/// reported are ignored.
pub fn enrich(
    identities: &[HostIdentity],
    probes: &HashMap<Ipv4Addr, ProbeResult>,
) -> Vec<EnrichedHostRecord> {
    let records: Vec<EnrichedHostRecord> = identities
        .iter()
        .map(|identity| {
            let probe = probes
                .get(&identity.address)
                .copied()
                .unwrap_or_else(ProbeResult::unknown);
            let record = EnrichedHostRecord::from_parts(identity, probe);
            trace!(?record, "enriched host");
            record
        })
        .collect();

    let known: HashSet<Ipv4Addr> = identities.iter().map(|identity| identity.address).collect();
    let orphaned = probes.keys().filter(|addr| !known.contains(*addr)).count();
    if orphaned > 0 {
        debug!("discarded {orphaned} probe result(s) for undiscovered addresses");
    }

    records
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::util::MacAddr;

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn identities() -> Vec<HostIdentity> {
        vec![
            HostIdentity::new(ip(7))
                .with_mac(MacAddr::new(0, 1, 2, 3, 4, 5))
                .with_vendor("Raspberry Pi Trading"),
            HostIdentity::new(ip(2)),
            HostIdentity::new(ip(5)).with_mac(MacAddr::new(6, 7, 8, 9, 10, 11)),
        ]
    }

    #[test]
    fn follows_discovery_order_and_carries_identity() {
        let probes = HashMap::from([
            (ip(5), ProbeResult::new(Some(0.0), Some(1.5))),
            (ip(7), ProbeResult::new(Some(20.0), Some(12.5))),
            (ip(2), ProbeResult::new(Some(100.0), None)),
        ]);

        let records = enrich(&identities(), &probes);
        let order: Vec<Ipv4Addr> = records.iter().map(|r| r.address).collect();
        assert_eq!(order, vec![ip(7), ip(2), ip(5)]);

        assert_eq!(records[0].vendor.as_deref(), Some("Raspberry Pi Trading"));
        assert_eq!(records[0].link_layer_id, Some(MacAddr::new(0, 1, 2, 3, 4, 5)));
        assert_eq!(records[0].packet_loss_percent, Some(20.0));
        assert_eq!(records[0].avg_latency_ms, Some(12.5));
        assert_eq!(records[1].packet_loss_percent, Some(100.0));
        assert_eq!(records[1].avg_latency_ms, None);
    }

    #[test]
    fn missing_probe_yields_unknown_fields_not_zero() {
        let probes = HashMap::from([(ip(7), ProbeResult::new(Some(5.0), Some(3.2)))]);

        let records = enrich(&identities(), &probes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].packet_loss_percent, None);
        assert_eq!(records[1].avg_latency_ms, None);
        assert_eq!(records[2].probe(), ProbeResult::unknown());
    }

    #[test]
    fn undiscovered_probe_results_are_discarded() {
        let probes = HashMap::from([
            (ip(7), ProbeResult::new(Some(0.0), Some(1.0))),
            (ip(99), ProbeResult::new(Some(0.0), Some(1.0))),
        ]);

        let records = enrich(&identities(), &probes);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.address != ip(99)));
    }

    #[test]
    fn is_deterministic() {
        let probes = HashMap::from([
            (ip(2), ProbeResult::new(Some(0.0), Some(0.4))),
            (ip(5), ProbeResult::unknown()),
        ]);

        let first = enrich(&identities(), &probes);
        let second = enrich(&identities(), &probes);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_discovery_yields_no_records() {
        let probes = HashMap::from([(ip(1), ProbeResult::new(Some(0.0), Some(1.0)))]);
        assert!(enrich(&[], &probes).is_empty());
    }
}
