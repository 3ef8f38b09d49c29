//! Rendering of scan records for the terminal.

use colored::*;
use netmind_common::network::record::EnrichedHostRecord;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

const DEGRADED_LOSS: f64 = 0.0;
const SLOW_LATENCY_MS: f64 = 100.0;

pub fn record_details(record: &EnrichedHostRecord) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::with_capacity(4);

    if let Some(mac) = record.link_layer_id {
        details.push(("MAC".to_string(), mac.to_string().color(colors::MAC_ADDR)));
    }
    if let Some(vendor) = &record.vendor {
        details.push(("Vendor".to_string(), vendor.normal()));
    }
    details.push(("Loss".to_string(), loss(record.packet_loss_percent)));
    details.push(("Latency".to_string(), latency(record.avg_latency_ms)));

    details
}

pub fn loss(value: Option<f64>) -> ColoredString {
    match value {
        Some(loss) if loss >= 100.0 => format!("{loss:.0}%").color(colors::DOWN).bold(),
        Some(loss) if loss > DEGRADED_LOSS => format!("{loss:.1}%").color(colors::DEGRADED),
        Some(loss) => format!("{loss:.0}%").color(colors::HEALTHY),
        None => "unknown".color(colors::UNKNOWN).italic(),
    }
}

pub fn latency(value: Option<f64>) -> ColoredString {
    match value {
        Some(ms) if ms >= SLOW_LATENCY_MS => format!("{ms:.2} ms").color(colors::DEGRADED),
        Some(ms) => format!("{ms:.2} ms").color(colors::HEALTHY),
        None => "unknown".color(colors::UNKNOWN).italic(),
    }
}

/// One-line rendering used by history listings.
pub fn record_line(record: &EnrichedHostRecord) -> String {
    format!(
        "{} loss {}  latency {}",
        format!("{:<15}", record.address).color(colors::IPV4_ADDR),
        loss(record.packet_loss_percent),
        latency(record.avg_latency_ms)
    )
}
