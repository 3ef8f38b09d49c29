mod commands;
mod terminal;

use anyhow::Context;
use commands::{CommandLine, Commands, RunContext, history, latest, scan, watch};
use netmind_common::config::Config;
use terminal::{logging, print};
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);
    print::banner(commands.quiet);

    let mut config = Config::load_or_default(commands.config.as_deref())
        .context("failed to load configuration")?;
    commands.apply_overrides(&mut config);

    let ctx = RunContext {
        config,
        quiet: commands.quiet,
        cancel: CancellationToken::new(),
    };
    spawn_interrupt_handler(ctx.cancel.clone());

    match commands.command {
        Commands::Scan { subnets } => {
            warn_if_unprivileged();
            scan::scan(&subnets, &ctx).await
        }
        Commands::Watch { subnets, interval } => {
            warn_if_unprivileged();
            watch::watch(&subnets, interval, &ctx).await
        }
        Commands::History {
            subnet,
            since,
            until,
        } => history::history(&subnet, since.as_deref(), until.as_deref(), &ctx).await,
        Commands::Latest { subnets } => latest::latest(&subnets, &ctx).await,
    }
}

/// First ctrl-c cancels the running scan; partial results are still reported.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping scan");
            cancel.cancel();
        }
    });
}

fn warn_if_unprivileged() {
    if !is_root::is_root() {
        warn!("not running as root: nmap cannot send ARP requests, MAC addresses and vendors will be missing");
    }
}
