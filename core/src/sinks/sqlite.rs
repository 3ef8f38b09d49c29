//! # SQLite Store
//!
//! Relational sink keeping one `network_stats_*` table per subnet. Rows carry
//! the scan timestamp as `YYYY-MM-DD HH:MM:SS.mmm` UTC text, which sorts and
//! compares the same way the instants do.
//!
//! `rusqlite` is blocking, so every call runs on tokio's blocking pool behind a
//! shared connection lock.

use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use netmind_common::error::SinkError;
use netmind_common::network::mac;
use netmind_common::network::record::{EnrichedHostRecord, HostStatsRow};
use netmind_common::network::subnet::Subnet;
use netmind_common::sinks::RelationalSink;
use rusqlite::{Connection, params};
use tracing::debug;

const SINK: &str = "sqlite";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

type RawRow = (
    String,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    String,
);

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| SinkError::backend(SINK, e))?;
        debug!(path = %path.display(), "sqlite store opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory().map_err(|e| SinkError::backend(SINK, e))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// `network_stats_10_0_0_0_30` for `10.0.0.0/30`.
    pub fn table_name(subnet: &Subnet) -> String {
        format!("network_stats_{}", subnet.storage_key())
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T, SinkError>
    where
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| SinkError::backend(SINK, "connection lock poisoned"))?;
            f(&mut *guard).map_err(|e| SinkError::backend(SINK, e))
        })
        .await
        .map_err(|e| SinkError::backend(SINK, e))?
    }
}

fn ensure_table(conn: &Connection, table: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            ip_address  TEXT NOT NULL,
            mac_address TEXT,
            vendor      TEXT,
            packet_loss REAL,
            avg_latency REAL,
            timestamp   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );
        CREATE INDEX IF NOT EXISTS {table}_timestamp ON {table} (timestamp);"
    ))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn into_stats_row(raw: RawRow) -> Result<HostStatsRow, SinkError> {
    let (ip, mac_address, vendor, packet_loss, avg_latency, timestamp) = raw;

    let address: Ipv4Addr = ip
        .parse()
        .map_err(|e| SinkError::backend(SINK, format!("bad ip_address '{ip}': {e}")))?;
    let timestamp = NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_PARSE_FORMAT)
        .map_err(|e| SinkError::backend(SINK, format!("bad timestamp '{timestamp}': {e}")))?
        .and_utc();

    Ok(HostStatsRow {
        record: EnrichedHostRecord {
            address,
            link_layer_id: mac_address.as_deref().and_then(mac::parse_mac),
            vendor,
            packet_loss_percent: packet_loss,
            avg_latency_ms: avg_latency,
        },
        timestamp,
    })
}

#[async_trait]
impl RelationalSink for SqliteStore {
    async fn insert_many(
        &self,
        subnet: &Subnet,
        records: &[EnrichedHostRecord],
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        let table = Self::table_name(subnet);
        let stamp = format_timestamp(timestamp);
        let rows: Vec<(String, Option<String>, Option<String>, Option<f64>, Option<f64>)> = records
            .iter()
            .map(|r| {
                (
                    r.address.to_string(),
                    r.link_layer_id.map(|mac| mac.to_string()),
                    r.vendor.clone(),
                    r.packet_loss_percent,
                    r.avg_latency_ms,
                )
            })
            .collect();
        let count = rows.len();

        self.with_conn(move |conn| {
            ensure_table(conn, &table)?;
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {table}
                        (ip_address, mac_address, vendor, packet_loss, avg_latency, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ))?;
                for (ip, mac_address, vendor, loss, latency) in &rows {
                    stmt.execute(params![ip, mac_address, vendor, loss, latency, stamp])?;
                }
            }
            tx.commit()
        })
        .await?;

        debug!("inserted {count} row(s) for {subnet}");
        Ok(())
    }

    async fn select_range(
        &self,
        subnet: &Subnet,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HostStatsRow>, SinkError> {
        self.select_where(
            subnet,
            "timestamp BETWEEN ?1 AND ?2".to_string(),
            vec![format_timestamp(start), format_timestamp(end)],
        )
        .await
    }

    async fn select_latest(&self, subnet: &Subnet) -> Result<Vec<HostStatsRow>, SinkError> {
        let table = Self::table_name(subnet);
        self.select_where(
            subnet,
            format!("timestamp = (SELECT MAX(timestamp) FROM {table})"),
            Vec::new(),
        )
        .await
    }
}

impl SqliteStore {
    /// Rows of `subnet` matching `filter`, newest first, in insertion order within a scan.
    async fn select_where(
        &self,
        subnet: &Subnet,
        filter: String,
        args: Vec<String>,
    ) -> Result<Vec<HostStatsRow>, SinkError> {
        let table = Self::table_name(subnet);

        let raw_rows: Vec<RawRow> = self
            .with_conn(move |conn| {
                ensure_table(conn, &table)?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT ip_address, mac_address, vendor, packet_loss, avg_latency, timestamp
                     FROM {table}
                     WHERE {filter}
                     ORDER BY timestamp DESC, rowid ASC"
                ))?;
                let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })?;
                rows.collect::<Result<Vec<RawRow>, _>>()
            })
            .await?;

        raw_rows.into_iter().map(into_stats_row).collect()
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
