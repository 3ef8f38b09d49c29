//! # Scan Records
//!
//! The merged output of the pipeline and the shapes it takes in the stores.
//!
//! Serialized records keep the field names used by earlier releases of the
//! cache and document stores (`ip`, `mac`, `vendor`, `packet_loss`,
//! `avg_latency`) so stored values stay readable across versions.

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};

use crate::network::host::HostIdentity;
use crate::network::mac;
use crate::network::probe::ProbeResult;
use crate::network::subnet::Subnet;

/// One discovered host joined with its probe figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedHostRecord {
    #[serde(rename = "ip")]
    pub address: Ipv4Addr,
    #[serde(rename = "mac", with = "mac::option", default)]
    pub link_layer_id: Option<MacAddr>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(rename = "packet_loss", default)]
    pub packet_loss_percent: Option<f64>,
    #[serde(rename = "avg_latency", default)]
    pub avg_latency_ms: Option<f64>,
}

impl EnrichedHostRecord {
    pub fn from_parts(identity: &HostIdentity, probe: ProbeResult) -> Self {
        Self {
            address: identity.address,
            link_layer_id: identity.link_layer_id,
            vendor: identity.vendor.clone(),
            packet_loss_percent: probe.packet_loss_percent,
            avg_latency_ms: probe.avg_latency_ms,
        }
    }

    pub fn probe(&self) -> ProbeResult {
        ProbeResult {
            packet_loss_percent: self.packet_loss_percent,
            avg_latency_ms: self.avg_latency_ms,
        }
    }
}

/// Result of scanning one subnet. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetScanResult {
    subnet: Subnet,
    records: Vec<EnrichedHostRecord>,
    scan_duration: Duration,
    scanned_at: DateTime<Utc>,
}

impl SubnetScanResult {
    pub fn new(
        subnet: Subnet,
        records: Vec<EnrichedHostRecord>,
        scan_duration: Duration,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subnet,
            records,
            scan_duration,
            scanned_at,
        }
    }

    pub fn subnet(&self) -> &Subnet {
        &self.subnet
    }

    /// Records in discovery order.
    pub fn records(&self) -> &[EnrichedHostRecord] {
        &self.records
    }

    pub fn scan_duration(&self) -> Duration {
        self.scan_duration
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary::from_records(&self.records)
    }

    pub fn to_document(&self) -> ScanDocument {
        ScanDocument {
            subnet: self.subnet,
            scan_time: self.scanned_at,
            hosts: self.records.clone(),
        }
    }
}

/// Aggregate figures over a record set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanSummary {
    pub hosts: usize,
    /// Hosts that answered at least one echo (loss below 100%).
    pub reachable: usize,
    /// Hosts with a measured loss of 100%.
    pub unreachable: usize,
    /// Hosts whose probe failed or could not be parsed.
    pub unknown: usize,
    pub mean_latency_ms: Option<f64>,
}

impl ScanSummary {
    pub fn from_records(records: &[EnrichedHostRecord]) -> Self {
        let mut summary = ScanSummary {
            hosts: records.len(),
            ..Default::default()
        };

        for record in records {
            match record.packet_loss_percent {
                Some(loss) if loss < 100.0 => summary.reachable += 1,
                Some(_) => summary.unreachable += 1,
                None => summary.unknown += 1,
            }
        }

        let latencies: Vec<f64> = records.iter().filter_map(|r| r.avg_latency_ms).collect();
        if !latencies.is_empty() {
            summary.mean_latency_ms = Some(latencies.iter().sum::<f64>() / latencies.len() as f64);
        }

        summary
    }
}

/// One document per scan per subnet, as kept by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDocument {
    pub subnet: Subnet,
    pub scan_time: DateTime<Utc>,
    pub hosts: Vec<EnrichedHostRecord>,
}

/// A record read back from the relational store with its row timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStatsRow {
    pub record: EnrichedHostRecord,
    pub timestamp: DateTime<Utc>,
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

    fn record(last: u8, loss: Option<f64>, latency: Option<f64>) -> EnrichedHostRecord {
        EnrichedHostRecord {
            address: Ipv4Addr::new(10, 0, 0, last),
            link_layer_id: None,
            vendor: None,
            packet_loss_percent: loss,
            avg_latency_ms: latency,
        }
    }

    #[test]
    fn record_serializes_with_wire_names_and_nulls() {
        let record = EnrichedHostRecord {
            address: Ipv4Addr::new(10, 0, 0, 2),
            link_layer_id: Some(MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff)),
            vendor: Some("Netgear".to_string()),
            packet_loss_percent: None,
            avg_latency_ms: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ip": "10.0.0.2",
                "mac": "aa:bb:cc:dd:ee:ff",
                "vendor": "Netgear",
                "packet_loss": null,
                "avg_latency": null,
            })
        );

        let back: EnrichedHostRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn record_deserializes_with_missing_optional_fields() {
        let back: EnrichedHostRecord = serde_json::from_str(r#"{"ip":"10.0.0.1"}"#).unwrap();
        assert_eq!(back, record(1, None, None));
    }

    #[test]
    fn summary_counts_each_bucket() {
        let records = vec![
            record(1, Some(0.0), Some(2.0)),
            record(2, Some(20.0), Some(4.0)),
            record(3, Some(100.0), None),
            record(4, None, None),
        ];

        let summary = ScanSummary::from_records(&records);
        assert_eq!(summary.hosts, 4);
        assert_eq!(summary.reachable, 2);
        assert_eq!(summary.unreachable, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.mean_latency_ms, Some(3.0));
    }

    #[test]
    fn summary_of_empty_set_has_no_latency() {
        let summary = ScanSummary::from_records(&[]);
        assert_eq!(summary, ScanSummary::default());
    }

    #[test]
    fn document_mirrors_result() {
        let subnet: Subnet = "10.0.0.0/30".parse().unwrap();
        let scanned_at = Utc::now();
        let result = SubnetScanResult::new(
            subnet,
            vec![record(1, Some(5.0), Some(3.2))],
            Duration::from_millis(1200),
            scanned_at,
        );

        let document = result.to_document();
        assert_eq!(document.subnet, subnet);
        assert_eq!(document.scan_time, scanned_at);
        assert_eq!(document.hosts, result.records());
    }
}
