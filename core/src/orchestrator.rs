//! # Scan Orchestrator
//!
//! Implements the core "scan subnets" use case.
//!
//! For each subnet, in order:
//! 1. **Discovery**: the [`DiscoveryAdapter`] resolves the subnet into live hosts.
//! 2. **Probing**: the [`HostProber`] pings every discovered address concurrently.
//! 3. **Enrichment**: identities and probe figures are joined per host.
//! 4. **Publishing**: the result goes to every configured sink concurrently.
//!
//! Subnets are isolated from each other: a discovery failure is recorded for
//! that subnet and the batch carries on. Sink failures are logged and never
//! change the returned result.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use netmind_common::error::{DiscoveryError, ScanError, SinkError};
use netmind_common::network::host::HostIdentity;
use netmind_common::network::record::SubnetScanResult;
use netmind_common::network::subnet::{self, Subnet};
use netmind_common::scanning::DiscoveryAdapter;
use netmind_common::sinks::{self, CacheSink, DocumentSink, RelationalSink};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::enricher;
use crate::prober::HostProber;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3000);

/// Per-subnet outcome of one run, ordered by subnet.
pub type ScanOutcomes = BTreeMap<Subnet, Result<SubnetScanResult, ScanError>>;

pub struct ScanOrchestrator {
    discovery: Arc<dyn DiscoveryAdapter>,
    prober: HostProber,
    cache: Option<(Arc<dyn CacheSink>, Duration)>,
    relational: Option<Arc<dyn RelationalSink>>,
    documents: Option<Arc<dyn DocumentSink>>,
    cancel: CancellationToken,
}

impl ScanOrchestrator {
    pub fn new(discovery: Arc<dyn DiscoveryAdapter>, prober: HostProber) -> Self {
        Self {
            discovery,
            prober,
            cache: None,
            relational: None,
            documents: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheSink>, ttl: Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    pub fn with_relational(mut self, relational: Arc<dyn RelationalSink>) -> Self {
        self.relational = Some(relational);
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentSink>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Cancelling `token` stops discovery and abandons in-flight probes.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.prober = self.prober.with_cancellation(token.clone());
        self.cancel = token;
        self
    }

    /// Validates every subnet string, then scans them.
    ///
    /// Nothing is scanned if any input is malformed.
    pub async fn run<S: AsRef<str>>(&self, subnets: &[S]) -> Result<ScanOutcomes, ScanError> {
        let subnets = subnet::parse_all(subnets)?;
        Ok(self.run_subnets(&subnets).await)
    }

    /// Scans each subnet in input order. A subnet listed twice is scanned once.
    ///
    /// Every failure is scoped to its subnet and lands in the returned map.
    pub async fn run_subnets(&self, subnets: &[Subnet]) -> ScanOutcomes {
        let mut outcomes = ScanOutcomes::new();

        for subnet in subnets {
            if outcomes.contains_key(subnet) {
                continue;
            }

            let span = info_span!("scan", %subnet);
            let outcome = self.scan_and_publish(subnet).instrument(span).await;
            if let Err(err) = &outcome {
                error!("{subnet}: {err}");
            }
            outcomes.insert(*subnet, outcome);
        }

        outcomes
    }

    async fn scan_and_publish(&self, subnet: &Subnet) -> Result<SubnetScanResult, ScanError> {
        let result = self.scan_subnet(subnet).await?;
        let summary = result.summary();
        info!(
            "{subnet}: {} host(s), {} reachable, {} unreachable, {} unknown in {:.2?}",
            summary.hosts,
            summary.reachable,
            summary.unreachable,
            summary.unknown,
            result.scan_duration()
        );
        self.publish(&result).await;
        Ok(result)
    }

    /// Discovers, probes and enriches one subnet without publishing.
    pub async fn scan_subnet(&self, subnet: &Subnet) -> Result<SubnetScanResult, ScanError> {
        let started = Instant::now();

        let discovered = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DiscoveryError::Cancelled),
            found = self.discovery.discover(subnet) => found,
        }
        .map_err(|source| ScanError::Discovery {
            subnet: *subnet,
            source,
        })?;

        let identities = dedupe_by_address(discovered);
        let addresses: Vec<Ipv4Addr> = identities.iter().map(|host| host.address).collect();
        info!("{} live host(s) in {subnet}, probing", addresses.len());

        let probes = self.prober.probe_all(&addresses).await?;
        let records = enricher::enrich(&identities, &probes);

        Ok(SubnetScanResult::new(
            *subnet,
            records,
            started.elapsed(),
            Utc::now(),
        ))
    }

    async fn publish_cache(&self, result: &SubnetScanResult) -> Result<(), SinkError> {
        let Some((cache, ttl)) = &self.cache else {
            return Ok(());
        };
        let value = serde_json::to_string(result.records())?;
        cache.put(&sinks::cache_key(result.subnet()), value, *ttl).await
    }

    /// Writes `result` to every configured sink at once. Failures are logged per sink.
    async fn publish(&self, result: &SubnetScanResult) {
        let subnet = result.subnet();

        let cache = self.publish_cache(result);

        let relational = async {
            match &self.relational {
                Some(store) => {
                    store
                        .insert_many(subnet, result.records(), result.scanned_at())
                        .await
                }
                None => Ok(()),
            }
        };

        let documents = async {
            match &self.documents {
                Some(store) => store.insert_scan(&result.to_document()).await,
                None => Ok(()),
            }
        };

        let (cache, relational, documents) = tokio::join!(cache, relational, documents);

        for (sink, outcome) in [("cache", cache), ("relational", relational), ("document", documents)] {
            match outcome {
                Ok(()) => debug!("{sink} sink updated for {subnet}"),
                Err(e) => warn!("{sink} sink failed for {subnet}: {e}"),
            }
        }
    }
}

/// Keeps the first identity reported for each address.
fn dedupe_by_address(identities: Vec<HostIdentity>) -> Vec<HostIdentity> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::with_capacity(identities.len());
    let total = identities.len();
    let unique: Vec<HostIdentity> = identities
        .into_iter()
        .filter(|host| seen.insert(host.address))
        .collect();

    if unique.len() < total {
        debug!("dropped {} duplicate discovery entries", total - unique.len());
    }
    unique
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
