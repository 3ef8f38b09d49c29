use std::sync::Arc;

use colored::*;
use netmind_common::network::record::{EnrichedHostRecord, SubnetScanResult};
use netmind_common::network::subnet::Subnet;
use netmind_core::ScanOutcomes;
use netmind_core::prober::ProgressCallback;
use tracing::{Instrument, error, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::commands::RunContext;
use crate::commands::pipeline::{self, Stores};
use crate::mprint;
use crate::terminal::{colors, format, print, progress};

pub async fn scan(subnet_args: &[String], ctx: &RunContext) -> anyhow::Result<()> {
    let subnets: Vec<Subnet> = pipeline::resolve_subnets(subnet_args, &ctx.config)?;
    let stores = Stores::for_scanning(&ctx.config)?;

    print::header("starting scan", ctx.quiet);
    let outcomes = run_once(&subnets, &stores, ctx).await;
    report(&outcomes, ctx.quiet);

    if outcomes.values().all(Result::is_err) {
        anyhow::bail!("no subnet could be scanned");
    }
    Ok(())
}

/// Runs the pipeline over `subnets` once, with a live probe counter.
pub async fn run_once(
    subnets: &[Subnet],
    stores: &Stores,
    ctx: &RunContext,
) -> ScanOutcomes {
    let span = info_span!("scan", indicatif.pb_show = true);
    span.pb_set_style(&progress::probe_style());
    span.pb_set_message(&format!("scanning {} subnet(s)", subnets.len()));

    let progress: ProgressCallback = {
        let span = span.clone();
        Arc::new(move |done: usize, total: usize| {
            span.pb_set_length(total as u64);
            span.pb_set_position(done as u64);
        })
    };

    let orchestrator = pipeline::orchestrator(&ctx.config, stores, ctx.cancel.clone(), progress);
    let outcomes = orchestrator.run_subnets(subnets).instrument(span).await;

    if ctx.cancel.is_cancelled() {
        warn!("scan interrupted, results are partial");
    }
    outcomes
}

pub fn report(outcomes: &ScanOutcomes, q_level: u8) {
    for (subnet, outcome) in outcomes {
        match outcome {
            Ok(result) => report_subnet(result, q_level),
            Err(e) => error!("{subnet}: {e}"),
        }
    }
}

fn report_subnet(result: &SubnetScanResult, q_level: u8) {
    let subnet = result.subnet().to_string();

    if result.records().is_empty() {
        print::header(&subnet, q_level);
        print::no_results(&format!("no live hosts in {subnet}"));
        return;
    }

    if q_level < 2 {
        print::header(&subnet, q_level);
        print_records(result.records());
    }

    print_summary(result, q_level);
}

/// One tree node per record, in the order the pipeline produced them.
fn host_tree(records: &[EnrichedHostRecord]) -> Vec<(String, Vec<format::Detail>)> {
    records
        .iter()
        .map(|record| (record.address.to_string(), format::record_details(record)))
        .collect()
}

fn print_records(records: &[EnrichedHostRecord]) {
    let tree = host_tree(records);
    for (idx, (address, details)) in tree.iter().enumerate() {
        print::tree_head(idx, address);
        print::as_tree_one_level(details);
        if idx + 1 != tree.len() {
            mprint!();
        }
    }
}

fn print_summary(result: &SubnetScanResult, q_level: u8) {
    let summary = result.summary();
    let hosts: ColoredString = format!("{} hosts", summary.hosts).bold().green();
    let total_time: ColoredString = format!("{:.2}s", result.scan_duration().as_secs_f64()).bold().yellow();
    let mean: ColoredString = format::latency(summary.mean_latency_ms);
    let output: String = format!(
        "{}: {hosts} ({} up, {} down, {} unknown), mean {mean}, in {total_time}",
        result.subnet(),
        summary.reachable,
        summary.unreachable,
        summary.unknown
    )
    .color(colors::TEXT_DEFAULT)
    .to_string();

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print_status(output),
    }
}
