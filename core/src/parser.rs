//! Extraction of loss and latency figures from raw `ping` output.
//!
//! Output formats differ between platforms and ping implementations, so the
//! parser is permissive: any field it cannot find comes back as `None` and the
//! function never fails.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use netmind_common::network::probe::ProbeResult;

static PACKET_LOSS_RE: OnceLock<Option<Regex>> = OnceLock::new();
static RTT_SUMMARY_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// `"5 packets transmitted, 4 received, 20% packet loss"` (Linux) or
/// `"20.0% packet loss"` (BSD/macOS).
fn packet_loss_re() -> Option<&'static Regex> {
    PACKET_LOSS_RE
        .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)% packet loss").ok())
        .as_ref()
}

/// `rtt min/avg/max/mdev = 1.0/12.5/30.0/2.0 ms` (iputils),
/// `round-trip min/avg/max/stddev = ...` (BSD) or
/// `round-trip min/avg/max = ...` (busybox). Captures the avg column.
fn rtt_summary_re() -> Option<&'static Regex> {
    RTT_SUMMARY_RE
        .get_or_init(|| {
            Regex::new(r"(?:rtt|round-trip) min/avg/max(?:/[a-z]+)? = [\d.]+/([\d.]+)/").ok()
        })
        .as_ref()
}

/// Parses the raw text of one probe run.
pub fn parse(raw: &str) -> ProbeResult {
    let packet_loss = first_capture(packet_loss_re(), raw);
    let avg_latency = first_capture(rtt_summary_re(), raw);

    let result = ProbeResult::new(packet_loss, avg_latency);
    if result.is_unknown() && !raw.trim().is_empty() {
        debug!("no loss or latency figures found in probe output");
    }
    result
}

fn first_capture(re: Option<&Regex>, raw: &str) -> Option<f64> {
    re?.captures(raw)?.get(1)?.as_str().parse::<f64>().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
