//! Scripted stand-ins for the external tools and stores.

use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmind_common::error::{DiscoveryError, ProbeError, SinkError};
use netmind_common::network::host::HostIdentity;
use netmind_common::network::record::{EnrichedHostRecord, HostStatsRow, ScanDocument};
use netmind_common::network::subnet::Subnet;
use netmind_common::scanning::{DiscoveryAdapter, ProbeAdapter};
use netmind_common::sinks::{CacheSink, DocumentSink, RelationalSink};
use rand::Rng;

pub fn ping_output(loss: f64, avg_ms: f64) -> String {
    format!(
        "--- ping statistics ---\n\
         5 packets transmitted, 5 received, {loss}% packet loss, time 4005ms\n\
         rtt min/avg/max/mdev = 0.100/{avg_ms}/9.900/0.500 ms\n"
    )
}

pub fn subnet(raw: &str) -> Subnet {
    raw.parse().unwrap()
}

/// Discovery answering from a fixed table. Unlisted subnets fail.
#[derive(Default)]
pub struct FakeDiscovery {
    hosts: HashMap<Subnet, Vec<HostIdentity>>,
    pub calls: AtomicUsize,
}

impl FakeDiscovery {
    pub fn with(mut self, raw_subnet: &str, hosts: Vec<HostIdentity>) -> Self {
        self.hosts.insert(subnet(raw_subnet), hosts);
        self
    }
}

#[async_trait]
impl DiscoveryAdapter for FakeDiscovery {
    async fn discover(&self, subnet: &Subnet) -> Result<Vec<HostIdentity>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hosts.get(subnet).cloned().ok_or_else(|| DiscoveryError::Exited {
            status: "exit status: 1".to_string(),
            stderr: format!("Failed to resolve \"{subnet}\""),
        })
    }
}

pub enum Scripted {
    Output(String),
    Timeout,
    Missing,
}

/// Probe with a scripted answer per address and a random delay, so completion
/// order differs from submission order.
#[derive(Default)]
pub struct FakeProbe {
    answers: HashMap<Ipv4Addr, Scripted>,
    max_delay_ms: u64,
}

impl FakeProbe {
    pub fn new(max_delay_ms: u64) -> Self {
        Self {
            answers: HashMap::new(),
            max_delay_ms,
        }
    }

    pub fn answer(mut self, address: Ipv4Addr, answer: Scripted) -> Self {
        self.answers.insert(address, answer);
        self
    }
}

#[async_trait]
impl ProbeAdapter for FakeProbe {
    async fn probe(&self, address: Ipv4Addr) -> Result<String, ProbeError> {
        if self.max_delay_ms > 0 {
            let delay = rand::rng().random_range(0..=self.max_delay_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match self.answers.get(&address) {
            Some(Scripted::Output(raw)) => Ok(raw.clone()),
            Some(Scripted::Timeout) => Err(ProbeError::Timeout(Duration::from_secs(15))),
            Some(Scripted::Missing) => Err(ProbeError::Launch(io::Error::new(
                io::ErrorKind::NotFound,
                "ping: not found",
            ))),
            None => Ok(String::new()),
        }
    }
}

/// Cache whose every call fails.
pub struct BrokenCache;

#[async_trait]
impl CacheSink for BrokenCache {
    async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), SinkError> {
        Err(SinkError::backend("cache", "connection refused"))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, SinkError> {
        Err(SinkError::backend("cache", "connection refused"))
    }
}

/// Relational and document sink that remembers what it was given.
#[derive(Default)]
pub struct RecordingStore {
    pub inserts: Mutex<Vec<(Subnet, Vec<EnrichedHostRecord>)>>,
    pub documents: Mutex<Vec<ScanDocument>>,
}

#[async_trait]
impl RelationalSink for RecordingStore {
    async fn insert_many(
        &self,
        subnet: &Subnet,
        records: &[EnrichedHostRecord],
        _timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        self.inserts.lock().unwrap().push((*subnet, records.to_vec()));
        Ok(())
    }

    async fn select_range(
        &self,
        _subnet: &Subnet,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<HostStatsRow>, SinkError> {
        Ok(Vec::new())
    }

    async fn select_latest(&self, _subnet: &Subnet) -> Result<Vec<HostStatsRow>, SinkError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl DocumentSink for RecordingStore {
    async fn insert_scan(&self, document: &ScanDocument) -> Result<(), SinkError> {
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }
}
