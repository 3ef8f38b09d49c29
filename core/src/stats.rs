//! # Stats Service
//!
//! Read side of the pipeline: answers "what did the last scan see" and "how did
//! a subnet look over time" from the sinks the orchestrator writes to.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use netmind_common::error::{ScanError, SinkError};
use netmind_common::network::record::{EnrichedHostRecord, HostStatsRow};
use netmind_common::network::subnet::Subnet;
use netmind_common::sinks::{self, CacheSink, RelationalSink};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Cache,
    Store,
}

/// Records of the most recent scan of a subnet.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSnapshot {
    pub records: Vec<EnrichedHostRecord>,
    pub source: SnapshotSource,
    /// Only known when read from the relational store.
    pub scanned_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct StatsService {
    cache: Option<Arc<dyn CacheSink>>,
    relational: Option<Arc<dyn RelationalSink>>,
}

impl StatsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheSink>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_relational(mut self, relational: Arc<dyn RelationalSink>) -> Self {
        self.relational = Some(relational);
        self
    }

    /// Latest records for `subnet`: the cache entry if one is live, otherwise
    /// the newest scan in the relational store.
    ///
    /// A failing or corrupt cache falls through to the store.
    pub async fn latest(&self, subnet: &Subnet) -> Result<Option<LatestSnapshot>, ScanError> {
        if let Some(records) = self.cached(subnet).await {
            return Ok(Some(LatestSnapshot {
                records,
                source: SnapshotSource::Cache,
                scanned_at: None,
            }));
        }

        let Some(relational) = &self.relational else {
            return Ok(None);
        };

        let rows = relational.select_latest(subnet).await?;
        let Some(newest) = rows.first().map(|row| row.timestamp) else {
            return Ok(None);
        };

        let records = rows.into_iter().map(|row| row.record).collect();

        Ok(Some(LatestSnapshot {
            records,
            source: SnapshotSource::Store,
            scanned_at: Some(newest),
        }))
    }

    /// Stored rows for `subnet` with `start <= timestamp <= end`, newest first.
    pub async fn history(
        &self,
        subnet: &Subnet,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HostStatsRow>, ScanError> {
        if start > end {
            return Err(ScanError::InvalidRange { start, end });
        }

        let relational = self
            .relational
            .as_ref()
            .ok_or_else(|| SinkError::backend("relational", "no relational store configured"))?;

        Ok(relational.select_range(subnet, start, end).await?)
    }

    async fn cached(&self, subnet: &Subnet) -> Option<Vec<EnrichedHostRecord>> {
        let cache = self.cache.as_ref()?;
        let key = sinks::cache_key(subnet);

        match cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(records) => Some(records),
                Err(e) => {
                    warn!("discarding unreadable cache entry {key}: {e}");
                    None
                }
            },
            Ok(None) => {
                debug!("cache miss for {key}");
                None
            }
            Err(e) => {
                warn!("cache lookup for {key} failed: {e}");
                None
            }
        }
    }
}
