//! # netmind core
//!
//! The scan pipeline and its process-backed adapters.
//!
//! [`ScanOrchestrator`] drives discovery, concurrent probing, enrichment and
//! publishing. [`StatsService`] reads published results back. Everything that
//! touches the outside world (nmap, ping, SQLite, files) sits behind the traits
//! in `netmind_common`, so the pipeline can be tested with fakes.

pub mod adapters;
pub mod enricher;
pub mod orchestrator;
pub mod parser;
pub mod prober;
pub mod sinks;
pub mod stats;
pub mod vendors;

pub use orchestrator::{ScanOrchestrator, ScanOutcomes};
pub use prober::HostProber;
pub use stats::StatsService;
