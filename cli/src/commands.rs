pub mod history;
pub mod latest;
pub mod pipeline;
pub mod scan;
pub mod watch;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use netmind_common::config::Config;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "netmind")]
#[command(version, about = "Latency and packet-loss monitor for local subnets.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file (defaults to config/tool_config.json when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Less output: -q hides headers, -qq prints summaries only
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum number of hosts probed at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Do not write results to the cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Do not write results to the database or document store
    #[arg(long, global = true)]
    pub no_persist: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover and probe subnets once
    #[command(alias = "s")]
    Scan {
        /// Subnets in CIDR notation; falls back to the config file
        subnets: Vec<String>,
    },
    /// Rescan subnets on a fixed interval until interrupted
    #[command(alias = "w")]
    Watch {
        subnets: Vec<String>,
        /// Seconds between the end of one scan and the start of the next
        #[arg(short, long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
    /// Show stored measurements of a subnet over a time range
    #[command(alias = "hist")]
    History {
        subnet: String,
        /// Range start (RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD", UTC); defaults to 24h before --until
        #[arg(long)]
        since: Option<String>,
        /// Range end; defaults to now
        #[arg(long)]
        until: Option<String>,
    },
    /// Show the most recent scan of each subnet
    #[command(alias = "l")]
    Latest { subnets: Vec<String> },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Folds command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(limit) = self.concurrency {
            config.probe.concurrency = limit.max(1);
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.no_persist {
            config.storage.enabled = false;
        }
    }
}

/// Everything a subcommand needs besides its own arguments.
pub struct RunContext {
    pub config: Config,
    pub quiet: u8,
    pub cancel: CancellationToken,
}
