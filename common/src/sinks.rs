//! # Sink Contracts
//!
//! Read/write contracts for the stores that receive scan results.
//!
//! Every sink is an independent failure domain: the orchestrator calls each one
//! separately, logs a [`SinkError`] and moves on. No sink call is retried and no
//! atomicity across sinks is provided.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SinkError;
use crate::network::record::{EnrichedHostRecord, HostStatsRow, ScanDocument};
use crate::network::subnet::Subnet;

pub const CACHE_KEY_SUFFIX: &str = "_network_latency_cache";

/// Cache key of a subnet's latest records: `{subnet}_network_latency_cache`.
pub fn cache_key(subnet: &Subnet) -> String {
    format!("{subnet}{CACHE_KEY_SUFFIX}")
}

/// Short-lived key/value store holding serialized record sets.
#[async_trait]
pub trait CacheSink: Send + Sync {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), SinkError>;

    /// Returns `None` once the entry expired or if it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, SinkError>;
}

/// Durable row store partitioned by subnet.
#[async_trait]
pub trait RelationalSink: Send + Sync {
    /// Inserts all records of one scan, stamped with `timestamp`.
    async fn insert_many(
        &self,
        subnet: &Subnet,
        records: &[EnrichedHostRecord],
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError>;

    /// Rows with `start <= timestamp <= end`, newest first.
    async fn select_range(
        &self,
        subnet: &Subnet,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HostStatsRow>, SinkError>;

    /// Rows of the most recent scan only. Empty when nothing was stored yet.
    async fn select_latest(&self, subnet: &Subnet) -> Result<Vec<HostStatsRow>, SinkError>;
}

/// Durable store keeping one document per scan.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn insert_scan(&self, document: &ScanDocument) -> Result<(), SinkError>;
}
