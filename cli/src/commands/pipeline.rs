//! Wiring of the core pipeline from configuration.

use std::sync::Arc;

use anyhow::{Context, bail};
use netmind_common::config::Config;
use netmind_common::network::subnet::{self, Subnet};
use netmind_core::adapters::{NmapDiscovery, PingProbe};
use netmind_core::prober::ProgressCallback;
use netmind_core::sinks::{JsonlDocumentStore, SqliteStore, TtlCache};
use netmind_core::vendors::MacOuiRepo;
use netmind_core::{HostProber, ScanOrchestrator, StatsService};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct Stores {
    pub cache: Option<Arc<TtlCache>>,
    pub relational: Option<Arc<SqliteStore>>,
    pub documents: Option<Arc<JsonlDocumentStore>>,
}

impl Stores {
    /// Sinks a scan publishes to, as enabled in `config`.
    pub fn for_scanning(config: &Config) -> anyhow::Result<Self> {
        let mut stores = Stores::default();

        if config.cache.enabled {
            stores.cache = Some(Arc::new(TtlCache::new()));
        }
        if config.storage.enabled {
            stores.relational = Some(Arc::new(open_sqlite(config)?));
            stores.documents = Some(Arc::new(JsonlDocumentStore::new(&config.storage.documents_dir)));
        }

        Ok(stores)
    }

    /// The relational store only; read commands never write.
    pub fn for_reading(config: &Config) -> anyhow::Result<Self> {
        Ok(Stores {
            relational: Some(Arc::new(open_sqlite(config)?)),
            ..Stores::default()
        })
    }
}

fn open_sqlite(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = &config.storage.sqlite_path;
    SqliteStore::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

/// Subnets from the command line, or from the config file when none were given.
pub fn resolve_subnets(args: &[String], config: &Config) -> anyhow::Result<Vec<Subnet>> {
    let inputs: &[String] = if args.is_empty() { &config.subnets } else { args };
    if inputs.is_empty() {
        bail!("no subnets given on the command line or in the config file");
    }
    Ok(subnet::parse_all(inputs)?)
}

pub fn orchestrator(
    config: &Config,
    stores: &Stores,
    cancel: CancellationToken,
    progress: ProgressCallback,
) -> ScanOrchestrator {
    let discovery = NmapDiscovery::new(&config.discovery).with_vendor_repo(Box::new(MacOuiRepo));
    let prober = HostProber::new(Arc::new(PingProbe::new(&config.probe)))
        .with_concurrency(config.probe.concurrency)
        .with_progress(progress);

    let mut orchestrator = ScanOrchestrator::new(Arc::new(discovery), prober).with_cancellation(cancel);
    if let Some(cache) = &stores.cache {
        orchestrator = orchestrator.with_cache(cache.clone(), config.cache.ttl());
    }
    if let Some(relational) = &stores.relational {
        orchestrator = orchestrator.with_relational(relational.clone());
    }
    if let Some(documents) = &stores.documents {
        orchestrator = orchestrator.with_documents(documents.clone());
    }
    orchestrator
}

pub fn stats(stores: &Stores) -> StatsService {
    let mut stats = StatsService::new();
    if let Some(cache) = &stores.cache {
        stats = stats.with_cache(cache.clone());
    }
    if let Some(relational) = &stores.relational {
        stats = stats.with_relational(relational.clone());
    }
    stats
}
