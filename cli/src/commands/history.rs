use anyhow::{Context, bail};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use colored::*;
use netmind_common::network::record::HostStatsRow;
use netmind_common::network::subnet::Subnet;

use crate::commands::RunContext;
use crate::commands::pipeline::{self, Stores};
use crate::mprint;
use crate::terminal::{colors, format, print};

const DEFAULT_WINDOW_HOURS: i64 = 24;

pub async fn history(
    subnet: &str,
    since: Option<&str>,
    until: Option<&str>,
    ctx: &RunContext,
) -> anyhow::Result<()> {
    let subnet: Subnet = subnet.parse()?;
    let end = match until {
        Some(raw) => parse_time(raw)?,
        None => Utc::now(),
    };
    let start = match since {
        Some(raw) => parse_time(raw)?,
        None => end - Duration::hours(DEFAULT_WINDOW_HOURS),
    };

    let stores = Stores::for_reading(&ctx.config)?;
    let rows = pipeline::stats(&stores).history(&subnet, start, end).await?;

    print::header(&format!("history of {subnet}"), ctx.quiet);
    if rows.is_empty() {
        print::no_results(&format!("nothing stored between {start} and {end}"));
        return Ok(());
    }

    let scans = group_by_scan(&rows);
    for (idx, (timestamp, scan)) in scans.iter().enumerate() {
        print::tree_head(idx, &timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        for row in scan {
            print::print_status(format::record_line(&row.record));
        }
        if idx + 1 != scans.len() {
            mprint!();
        }
    }

    let total: ColoredString = format!("{} scans", scans.len()).bold().green();
    print::fat_separator();
    print::centerln(&format!("{total} of {subnet}").color(colors::TEXT_DEFAULT).to_string());
    Ok(())
}

/// Splits newest-first rows into consecutive runs sharing a timestamp.
fn group_by_scan(rows: &[HostStatsRow]) -> Vec<(DateTime<Utc>, Vec<&HostStatsRow>)> {
    let mut scans: Vec<(DateTime<Utc>, Vec<&HostStatsRow>)> = Vec::new();
    for row in rows {
        match scans.last_mut() {
            Some((timestamp, scan)) if *timestamp == row.timestamp => scan.push(row),
            _ => scans.push((row.timestamp, vec![row])),
        }
    }
    scans
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare `YYYY-MM-DD` (UTC midnight).
fn parse_time(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(parsed.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).context("invalid date")?;
        return Ok(midnight.and_utc());
    }

    bail!("unrecognised time '{raw}', expected RFC 3339 or YYYY-MM-DD[ HH:MM:SS]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use netmind_common::network::record::EnrichedHostRecord;
    use std::net::Ipv4Addr;

    #[test]
    fn parse_time_accepts_supported_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        assert_eq!(parse_time("2025-03-14T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_time("2025-03-14T11:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_time("2025-03-14 09:30:00").unwrap(), expected);
        assert_eq!(
            parse_time("2025-03-14").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()
        );
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn rows_group_by_timestamp() {
        let row = |last: u8, hour: u32| HostStatsRow {
            record: EnrichedHostRecord {
                address: Ipv4Addr::new(10, 0, 0, last),
                link_layer_id: None,
                vendor: None,
                packet_loss_percent: None,
                avg_latency_ms: None,
            },
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap(),
        };
        let rows = vec![row(1, 12), row(2, 12), row(1, 8)];

        let scans = group_by_scan(&rows);
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].1.len(), 2);
        assert_eq!(scans[1].1.len(), 1);
    }
}
