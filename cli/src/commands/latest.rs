use colored::*;
use netmind_common::network::subnet::Subnet;
use netmind_core::stats::SnapshotSource;

use crate::commands::RunContext;
use crate::commands::pipeline::{self, Stores};
use crate::mprint;
use crate::terminal::{colors, format, print};

pub async fn latest(subnet_args: &[String], ctx: &RunContext) -> anyhow::Result<()> {
    let subnets: Vec<Subnet> = pipeline::resolve_subnets(subnet_args, &ctx.config)?;
    let stats = pipeline::stats(&Stores::for_reading(&ctx.config)?);

    for subnet in &subnets {
        print::header(&format!("latest scan of {subnet}"), ctx.quiet);

        let Some(snapshot) = stats.latest(subnet).await? else {
            print::no_results(&format!("no stored scan of {subnet}"));
            continue;
        };

        let when: String = match (snapshot.source, snapshot.scanned_at) {
            (_, Some(at)) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            (SnapshotSource::Cache, None) => "cached".to_string(),
            (SnapshotSource::Store, None) => "unknown time".to_string(),
        };
        print::print_status(format!("{} {}", "scanned".color(colors::TEXT_DEFAULT), when.color(colors::ACCENT)));
        mprint!();

        for record in &snapshot.records {
            print::print_status(format::record_line(record));
        }
    }

    Ok(())
}
