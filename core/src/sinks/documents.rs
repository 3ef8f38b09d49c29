use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use netmind_common::error::SinkError;
use netmind_common::network::record::ScanDocument;
use netmind_common::network::subnet::Subnet;
use netmind_common::sinks::DocumentSink;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Document sink writing one JSON line per scan to `<dir>/<subnet key>.jsonl`.
pub struct JsonlDocumentStore {
    dir: PathBuf,
}

impl JsonlDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, subnet: &Subnet) -> PathBuf {
        self.dir.join(format!("{}.jsonl", subnet.storage_key()))
    }

    /// All documents stored for `subnet`, oldest first.
    pub async fn load(&self, subnet: &Subnet) -> Result<Vec<ScanDocument>, SinkError> {
        let raw = match fs::read_to_string(self.path_for(subnet)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(SinkError::from))
            .collect()
    }
}

#[async_trait]
impl DocumentSink for JsonlDocumentStore {
    async fn insert_scan(&self, document: &ScanDocument) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).await?;

        let mut line = serde_json::to_string(document)?;
        line.push('\n');

        let path = self.path_for(&document.subnet);
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), "stored scan document");
        Ok(())
    }
}
