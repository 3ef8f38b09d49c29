/// Reachability figures extracted from one probe run.
///
/// Both fields are `None` when the probe failed or its output could not be
/// parsed. `None` means "unknown" and is never the same as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeResult {
    pub packet_loss_percent: Option<f64>,
    pub avg_latency_ms: Option<f64>,
}

impl ProbeResult {
    /// Builds a result, discarding values outside their valid domain
    /// (loss in `[0, 100]`, latency `>= 0`, both finite).
    pub fn new(packet_loss_percent: Option<f64>, avg_latency_ms: Option<f64>) -> Self {
        Self {
            packet_loss_percent: packet_loss_percent
                .filter(|loss| loss.is_finite() && (0.0..=100.0).contains(loss)),
            avg_latency_ms: avg_latency_ms.filter(|lat| lat.is_finite() && *lat >= 0.0),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.packet_loss_percent.is_none() && self.avg_latency_ms.is_none()
    }
}
