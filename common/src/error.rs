//! Error taxonomy of the scan pipeline.
//!
//! Failures are scoped: a [`ProbeError`] only ever affects one host, a
//! [`DiscoveryError`] only one subnet and a [`SinkError`] only one store. Only
//! the [`ScanError`] variants reach the caller of the orchestrator.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::network::subnet::Subnet;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Caller supplied something that is not an IPv4 network in CIDR notation.
    #[error("invalid subnet '{input}': {reason}")]
    InvalidSubnet { input: String, reason: String },

    #[error("discovery failed for {subnet}: {source}")]
    Discovery {
        subnet: Subnet,
        #[source]
        source: DiscoveryError,
    },

    #[error("resource exhaustion: {0}")]
    ResourceExhausted(String),

    #[error("invalid time range: {start} is after {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl ScanError {
    /// True when the error was caused by the caller's input rather than the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidSubnet { .. } | ScanError::InvalidRange { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to launch discovery tool: {0}")]
    Launch(#[source] io::Error),

    #[error("discovery tool exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },

    #[error("discovery timed out after {0:?}")]
    Timeout(Duration),

    #[error("discovery was cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch probe tool: {0}")]
    Launch(#[source] io::Error),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe tool failed: {0}")]
    Process(String),

    #[error("probe was cancelled")]
    Cancelled,

    #[error("probe task panicked: {0}")]
    Panicked(String),

    /// The task never ran to completion: the limiter closed or the runtime shut down.
    #[error("probe task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{sink} backend error: {message}")]
    Backend { sink: &'static str, message: String },

    #[error("failed to (de)serialize records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink i/o error: {0}")]
    Io(#[from] io::Error),
}

impl SinkError {
    pub fn backend(sink: &'static str, err: impl Display) -> Self {
        SinkError::Backend {
            sink,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
