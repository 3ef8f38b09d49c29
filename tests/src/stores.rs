use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use netmind_common::network::host::HostIdentity;
use netmind_core::sinks::{JsonlDocumentStore, SqliteStore, TtlCache};
use netmind_core::stats::SnapshotSource;
use netmind_core::{HostProber, ScanOrchestrator, StatsService};

use crate::support::{FakeDiscovery, FakeProbe, Scripted, ping_output, subnet};

#[tokio::test]
async fn scan_results_are_readable_from_every_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cache = Arc::new(TtlCache::new());
    let sqlite = Arc::new(SqliteStore::open(&dir.path().join("netmind_local_db.db"))?);
    let documents = Arc::new(JsonlDocumentStore::new(dir.path().join("documents")));

    let host = Ipv4Addr::new(192, 168, 7, 10);
    let discovery = Arc::new(FakeDiscovery::default().with("192.168.7.0/24", vec![HostIdentity::new(host)]));
    let probe = FakeProbe::new(0).answer(host, Scripted::Output(ping_output(20.0, 12.5)));

    let before = Utc::now() - chrono::Duration::seconds(1);
    let outcomes = ScanOrchestrator::new(discovery, HostProber::new(Arc::new(probe)))
        .with_cache(cache.clone(), Duration::from_secs(60))
        .with_relational(sqlite.clone())
        .with_documents(documents.clone())
        .run(&["192.168.7.0/24"])
        .await?;
    let lan = subnet("192.168.7.0/24");
    let result = outcomes[&lan].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;

    let cached = StatsService::new()
        .with_cache(cache)
        .with_relational(sqlite.clone())
        .latest(&lan)
        .await?
        .expect("cache entry");
    assert_eq!(cached.source, SnapshotSource::Cache);
    assert_eq!(cached.records, result.records());

    let stored = StatsService::new().with_relational(sqlite.clone());
    let latest = stored.latest(&lan).await?.expect("stored scan");
    assert_eq!(latest.source, SnapshotSource::Store);
    assert_eq!(latest.records, result.records());

    let history = stored.history(&lan, before, Utc::now()).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record.packet_loss_percent, Some(20.0));
    assert_eq!(history[0].record.avg_latency_ms, Some(12.5));

    let docs = documents.load(&lan).await?;
    assert_eq!(docs, vec![result.to_document()]);
    Ok(())
}

#[tokio::test]
async fn repeated_scans_accumulate_history() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sqlite = Arc::new(SqliteStore::open(&dir.path().join("db.sqlite"))?);
    let host = Ipv4Addr::new(10, 9, 0, 1);
    let discovery = Arc::new(FakeDiscovery::default().with("10.9.0.0/30", vec![HostIdentity::new(host)]));
    let orchestrator = ScanOrchestrator::new(
        discovery,
        HostProber::new(Arc::new(FakeProbe::new(0).answer(host, Scripted::Output(ping_output(0.0, 2.0))))),
    )
    .with_relational(sqlite.clone());

    let start = Utc::now() - chrono::Duration::seconds(1);
    orchestrator.run(&["10.9.0.0/30"]).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    orchestrator.run(&["10.9.0.0/30"]).await?;

    let rows = StatsService::new()
        .with_relational(sqlite)
        .history(&subnet("10.9.0.0/30"), start, Utc::now())
        .await?;
    assert_eq!(rows.len(), 2);
    assert!(rows[0].timestamp > rows[1].timestamp);
    Ok(())
}
