use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use netmind_common::error::ScanError;
use netmind_common::network::host::HostIdentity;
use netmind_core::orchestrator::DEFAULT_CACHE_TTL;
use netmind_core::{HostProber, ScanOrchestrator};
use tokio_util::sync::CancellationToken;

use crate::support::{BrokenCache, FakeDiscovery, FakeProbe, RecordingStore, Scripted, ping_output, subnet};

fn ip(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, last)
}

fn orchestrator(discovery: Arc<FakeDiscovery>, probe: FakeProbe) -> ScanOrchestrator {
    ScanOrchestrator::new(discovery, HostProber::new(Arc::new(probe)))
}

#[tokio::test]
async fn timed_out_probe_yields_unknown_fields() {
    let discovery = Arc::new(
        FakeDiscovery::default().with("10.0.0.0/30", vec![HostIdentity::new(ip(1)), HostIdentity::new(ip(2))]),
    );
    let probe = FakeProbe::new(5)
        .answer(ip(1), Scripted::Output(ping_output(5.0, 3.2)))
        .answer(ip(2), Scripted::Timeout);

    let outcomes = orchestrator(discovery, probe).run(&["10.0.0.0/30"]).await.unwrap();
    let result = outcomes[&subnet("10.0.0.0/30")].as_ref().unwrap();
    let records = result.records();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].address, ip(1));
    assert_eq!(records[0].packet_loss_percent, Some(5.0));
    assert_eq!(records[0].avg_latency_ms, Some(3.2));
    assert_eq!(records[1].address, ip(2));
    assert_eq!(records[1].packet_loss_percent, None);
    assert_eq!(records[1].avg_latency_ms, None);
}

#[tokio::test]
async fn subnet_without_mask_is_rejected_before_discovery() {
    let discovery = Arc::new(FakeDiscovery::default().with("10.0.0.0/30", vec![HostIdentity::new(ip(1))]));

    let err = orchestrator(discovery.clone(), FakeProbe::new(0))
        .run(&["10.0.0.0"])
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::InvalidSubnet { .. }));
    assert!(err.is_caller_error());
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_cache_leaves_result_and_other_sinks_intact() {
    let discovery = Arc::new(
        FakeDiscovery::default().with("10.0.0.0/30", vec![HostIdentity::new(ip(1)), HostIdentity::new(ip(2))]),
    );
    let probe = FakeProbe::new(0)
        .answer(ip(1), Scripted::Output(ping_output(0.0, 1.1)))
        .answer(ip(2), Scripted::Output(ping_output(40.0, 7.5)));
    let store = Arc::new(RecordingStore::default());

    let outcomes = orchestrator(discovery, probe)
        .with_cache(Arc::new(BrokenCache), DEFAULT_CACHE_TTL)
        .with_relational(store.clone())
        .with_documents(store.clone())
        .run(&["10.0.0.0/30"])
        .await
        .unwrap();
    let result = outcomes[&subnet("10.0.0.0/30")].as_ref().unwrap();

    assert_eq!(result.records()[1].packet_loss_percent, Some(40.0));
    assert_eq!(result.records()[1].avg_latency_ms, Some(7.5));

    let inserts = store.inserts.lock().unwrap();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].1, result.records());
    assert_eq!(store.documents.lock().unwrap()[0].hosts, result.records());
}

#[tokio::test]
async fn one_failing_subnet_does_not_stop_the_batch() {
    let discovery = Arc::new(
        FakeDiscovery::default()
            .with("10.0.0.0/30", vec![HostIdentity::new(ip(1))])
            .with("10.0.1.0/30", vec![HostIdentity::new(Ipv4Addr::new(10, 0, 1, 1))]),
    );

    let outcomes = orchestrator(discovery, FakeProbe::new(0))
        .run(&["10.0.0.0/30", "172.31.0.0/16", "10.0.1.0/30"])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[&subnet("10.0.0.0/30")].is_ok());
    assert!(outcomes[&subnet("10.0.1.0/30")].is_ok());
    assert!(matches!(outcomes[&subnet("172.31.0.0/16")], Err(ScanError::Discovery { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn records_follow_discovery_order_under_random_completion() {
    let identities: Vec<HostIdentity> = (1..=60u8).rev().map(|last| HostIdentity::new(ip(last))).collect();
    let expected: Vec<Ipv4Addr> = identities.iter().map(|host| host.address).collect();

    let probe = identities.iter().fold(FakeProbe::new(20), |probe, host| {
        let last = host.address.octets()[3];
        probe.answer(host.address, Scripted::Output(ping_output(0.0, f64::from(last))))
    });
    let discovery = Arc::new(FakeDiscovery::default().with("10.0.0.0/26", identities));

    let outcomes = ScanOrchestrator::new(discovery, HostProber::new(Arc::new(probe)).with_concurrency(8))
        .run(&["10.0.0.0/26"])
        .await
        .unwrap();
    let records = outcomes[&subnet("10.0.0.0/26")].as_ref().unwrap().records().to_vec();

    let order: Vec<Ipv4Addr> = records.iter().map(|r| r.address).collect();
    assert_eq!(order, expected);
    for record in &records {
        assert_eq!(record.avg_latency_ms, Some(f64::from(record.address.octets()[3])));
    }
}

#[tokio::test]
async fn missing_probe_tool_keeps_sibling_subnets() {
    let lone = Ipv4Addr::new(10, 0, 1, 1);
    let discovery = Arc::new(
        FakeDiscovery::default()
            .with("10.0.0.0/30", vec![HostIdentity::new(ip(1))])
            .with("10.0.1.0/30", vec![HostIdentity::new(lone)]),
    );
    let probe = FakeProbe::new(0)
        .answer(ip(1), Scripted::Output(ping_output(0.0, 2.0)))
        .answer(lone, Scripted::Missing);
    let store = Arc::new(RecordingStore::default());

    let outcomes = orchestrator(discovery, probe)
        .with_relational(store.clone())
        .run(&["10.0.0.0/30", "10.0.1.0/30"])
        .await
        .unwrap();

    let first = outcomes[&subnet("10.0.0.0/30")].as_ref().unwrap();
    assert_eq!(first.records()[0].avg_latency_ms, Some(2.0));

    let second = outcomes[&subnet("10.0.1.0/30")].as_ref().unwrap();
    assert_eq!(second.records().len(), 1);
    assert_eq!(second.records()[0].address, lone);
    assert_eq!(second.records()[0].packet_loss_percent, None);
    assert_eq!(second.records()[0].avg_latency_ms, None);

    assert_eq!(store.inserts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn cancellation_mid_probe_keeps_every_discovered_host() {
    let identities: Vec<HostIdentity> = (1..=10u8).map(|last| HostIdentity::new(ip(last))).collect();
    let probe = identities.iter().fold(FakeProbe::new(500), |probe, host| {
        probe.answer(host.address, Scripted::Output(ping_output(0.0, 1.0)))
    });
    let discovery = Arc::new(FakeDiscovery::default().with("10.0.0.0/28", identities));

    let token = CancellationToken::new();
    let orchestrator = orchestrator(discovery, probe).with_cancellation(token.clone());
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        token.cancel();
    });

    let outcomes = orchestrator.run(&["10.0.0.0/28"]).await.unwrap();
    let records = outcomes[&subnet("10.0.0.0/28")].as_ref().unwrap().records();
    assert_eq!(records.len(), 10);
}
