use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use netmind_common::config::ProbeConfig;
use netmind_common::error::ProbeError;
use netmind_common::scanning::ProbeAdapter;
use tokio::process::Command;
use tracing::trace;

/// Sends `count` ICMP echo requests with the system `ping` binary.
///
/// `ping` exits non-zero when replies are lost, so the exit status alone is not
/// a failure: whatever it printed is handed back for parsing. Only a launch
/// error, a timeout or an exit with no output at all is reported as an error.
pub struct PingProbe {
    ping_path: PathBuf,
    count: u32,
    wait_secs: u32,
    timeout: Duration,
}

impl PingProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            ping_path: config.ping_path.clone(),
            count: config.count,
            wait_secs: config.wait_secs,
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl ProbeAdapter for PingProbe {
    async fn probe(&self, address: Ipv4Addr) -> Result<String, ProbeError> {
        let mut command = Command::new(&self.ping_path);
        command
            .arg("-c")
            .arg(self.count.to_string())
            .arg("-W")
            .arg(self.wait_secs.to_string())
            .arg(address.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(ProbeError::Launch)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(ProbeError::Process(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        trace!(%address, "ping output:\n{stdout}");
        Ok(stdout)
    }
}
