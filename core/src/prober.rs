//! # Host Prober
//!
//! Fans a [`ProbeAdapter`] out over a set of addresses.
//!
//! Every address gets its own task on the runtime's worker pool; a semaphore
//! bounds how many probes are in flight so large subnets do not exhaust file
//! descriptors or the process table. Each task owns exactly one address, and
//! results are collected from the task handles, so the tasks share no state
//! besides the limiter and a completion counter.
//!
//! A failed, panicked or cancelled probe degrades to [`ProbeResult::unknown`]
//! for its own address. The returned map always holds one entry per distinct
//! input address.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use netmind_common::error::{ProbeError, ScanError};
use netmind_common::network::probe::ProbeResult;
use netmind_common::scanning::ProbeAdapter;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, warn};

use crate::parser;

pub const DEFAULT_CONCURRENCY: usize = 32;

/// Invoked with `(completed, total)` every time a probe finishes.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub struct HostProber {
    adapter: Arc<dyn ProbeAdapter>,
    concurrency: usize,
    cancel: CancellationToken,
    on_probe_done: Option<ProgressCallback>,
}

impl HostProber {
    pub fn new(adapter: Arc<dyn ProbeAdapter>) -> Self {
        Self {
            adapter,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: CancellationToken::new(),
            on_probe_done: None,
        }
    }

    /// Maximum number of probes in flight. Clamped to at least one.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Cancelling `token` abandons in-flight probes; they report unknown results.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_probe_done = Some(callback);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Probes every address concurrently and parses the output.
    ///
    /// Per-host failures never surface as errors, whatever their cause: a
    /// missing tool, a timeout or a panicking adapter all degrade to
    /// [`ProbeResult::unknown`]. The call only fails with
    /// [`ScanError::ResourceExhausted`] when the concurrency limiter was closed
    /// or the runtime tore every task down before it could report.
    pub async fn probe_all(
        &self,
        addresses: &[Ipv4Addr],
    ) -> Result<HashMap<Ipv4Addr, ProbeResult>, ScanError> {
        let mut seen: HashSet<Ipv4Addr> = HashSet::with_capacity(addresses.len());
        let targets: Vec<Ipv4Addr> = addresses
            .iter()
            .copied()
            .filter(|addr| seen.insert(*addr))
            .collect();

        let total: usize = targets.len();
        if total == 0 {
            return Ok(HashMap::new());
        }

        debug!("probing {total} hosts, at most {} at once", self.concurrency);

        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<(Ipv4Addr, JoinHandle<Result<String, ProbeError>>)> = targets
            .iter()
            .map(|&address| {
                let task = ProbeTask {
                    address,
                    adapter: Arc::clone(&self.adapter),
                    limiter: Arc::clone(&limiter),
                    cancel: self.cancel.clone(),
                    completed: Arc::clone(&completed),
                    total,
                    on_done: self.on_probe_done.clone(),
                };
                (address, tokio::spawn(task.run().in_current_span()))
            })
            .collect();

        let mut results: HashMap<Ipv4Addr, ProbeResult> = HashMap::with_capacity(total);
        let mut aborted: usize = 0;

        for (address, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|join_err| {
                if join_err.is_panic() {
                    Err(ProbeError::Panicked(join_err.to_string()))
                } else {
                    Err(ProbeError::Aborted(join_err.to_string()))
                }
            });

            let result = match outcome {
                Ok(raw) => parser::parse(&raw),
                Err(err) => {
                    if matches!(err, ProbeError::Aborted(_)) {
                        aborted += 1;
                    }
                    warn!("probe of {address} failed: {err}");
                    ProbeResult::unknown()
                }
            };

            results.insert(address, result);
        }

        if aborted == total {
            return Err(ScanError::ResourceExhausted(format!(
                "all {total} probe tasks were aborted"
            )));
        }

        Ok(results)
    }
}

struct ProbeTask {
    address: Ipv4Addr,
    adapter: Arc<dyn ProbeAdapter>,
    limiter: Arc<Semaphore>,
    cancel: CancellationToken,
    completed: Arc<AtomicUsize>,
    total: usize,
    on_done: Option<ProgressCallback>,
}

impl ProbeTask {
    async fn run(self) -> Result<String, ProbeError> {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProbeError::Cancelled),
            outcome = async {
                let _permit = self
                    .limiter
                    .acquire()
                    .await
                    .map_err(|e| ProbeError::Aborted(e.to_string()))?;
                self.adapter.probe(self.address).await
            } => outcome,
        };

        let done: usize = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(callback) = &self.on_done {
            callback(done, self.total);
        }

        outcome
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
