use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::time::Duration;

use colored::*;
use netmind_common::network::record::ScanSummary;
use netmind_common::network::subnet::Subnet;
use netmind_core::StatsService;
use netmind_core::stats::{LatestSnapshot, SnapshotSource};
use tracing::{info, warn};

use crate::commands::RunContext;
use crate::commands::pipeline::{self, Stores};
use crate::commands::scan;
use crate::terminal::{colors, format, print};

type Snapshots = HashMap<Subnet, LatestSnapshot>;

pub async fn watch(subnet_args: &[String], interval_secs: u64, ctx: &RunContext) -> anyhow::Result<()> {
    let subnets: Vec<Subnet> = pipeline::resolve_subnets(subnet_args, &ctx.config)?;
    let stores = Stores::for_scanning(&ctx.config)?;
    let stats = pipeline::stats(&stores);
    let interval = Duration::from_secs(interval_secs);

    let mut previous: Snapshots = snapshots(&stats, &subnets).await;

    for round in 1u64.. {
        print::header(&format!("round {round}"), ctx.quiet);

        let outcomes = scan::run_once(&subnets, &stores, ctx).await;
        scan::report(&outcomes, ctx.quiet);

        let current = snapshots(&stats, &subnets).await;
        report_round(&previous, &current, &subnets);
        previous = current;

        if ctx.cancel.is_cancelled() {
            break;
        }

        info!("next scan in {interval_secs}s, ctrl-c to stop");
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    print::fat_separator();
    Ok(())
}

/// Latest known state of each subnet, read back through the stats service.
async fn snapshots(stats: &StatsService, subnets: &[Subnet]) -> Snapshots {
    let mut seen = Snapshots::new();
    for subnet in subnets {
        match stats.latest(subnet).await {
            Ok(Some(snapshot)) => {
                seen.insert(*subnet, snapshot);
            }
            Ok(None) => {}
            Err(e) => warn!("could not read latest results for {subnet}: {e}"),
        }
    }
    seen
}

fn addresses(snapshot: &LatestSnapshot) -> BTreeSet<Ipv4Addr> {
    snapshot.records.iter().map(|r| r.address).collect()
}

fn report_round(previous: &Snapshots, current: &Snapshots, subnets: &[Subnet]) {
    for subnet in subnets {
        let Some(now) = current.get(subnet) else {
            continue;
        };

        let source = match now.source {
            SnapshotSource::Cache => "cache",
            SnapshotSource::Store => "store",
        };
        let mean = format::latency(ScanSummary::from_records(&now.records).mean_latency_ms);
        print::print_status(format!(
            "{subnet}: {} hosts, mean {mean} {}",
            now.records.len(),
            format!("({source})").color(colors::SEPARATOR)
        ));

        let Some(before) = previous.get(subnet) else {
            continue;
        };
        let (before, now) = (addresses(before), addresses(now));
        for joined in now.difference(&before) {
            print::print_status(format!("{subnet}: {} {joined}", "+ joined".color(colors::HEALTHY)));
        }
        for left in before.difference(&now) {
            print::print_status(format!("{subnet}: {} {left}", "- left".color(colors::DOWN)));
        }
    }
}
