pub mod client;
pub mod download;
pub mod ping;
pub mod upload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while talking to a measurement server.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("no reachable measurement server")]
    NoServerReachable,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Terminal failure of a measurement run, carrying the original failure text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MeasurementError {
    pub message: String,
}

impl MeasurementError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ConnectivityError> for MeasurementError {
    fn from(err: ConnectivityError) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasurementResult {
    pub ping_ms: f64,
    pub download: f64,
    pub upload: f64,
    /// Unit `download` and `upload` were converted to.
    pub unit: ThroughputUnit,
}

/// Display unit for measured throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThroughputUnit {
    /// Megabits per second, bits / 1,000,000.
    #[default]
    Mbps,
    /// Mebibytes per second as reported by the legacy build, bits / 1,048,576
    /// rounded to two decimals.
    MiBps,
}

impl ThroughputUnit {
    pub fn convert(self, bits_per_sec: f64) -> f64 {
        match self {
            ThroughputUnit::Mbps => bits_per_sec / 1_000_000.0,
            ThroughputUnit::MiBps => (bits_per_sec / 1024.0 / 1024.0 * 100.0).round() / 100.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThroughputUnit::Mbps => "Mbps",
            ThroughputUnit::MiBps => "MiB/s",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ThroughputUnit::Mbps => ThroughputUnit::MiBps,
            ThroughputUnit::MiBps => ThroughputUnit::Mbps,
        }
    }
}

/// A candidate measurement endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub url: String,
}

impl Server {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn download_url(&self, bytes: u64) -> String {
        format!("{}/__down?bytes={}", self.url.trim_end_matches('/'), bytes)
    }

    pub fn upload_url(&self) -> String {
        format!("{}/__up", self.url.trim_end_matches('/'))
    }
}

/// The four measurement steps a run is made of, called in order.
#[async_trait]
pub trait MeasurementClient: Send {
    async fn select_best_server(&mut self) -> Result<(), ConnectivityError>;

    /// Latency of the selected server in milliseconds, if known.
    fn measure_ping(&self) -> Option<f64>;

    /// Achieved download throughput in bits per second.
    async fn measure_download(&mut self) -> Result<f64, ConnectivityError>;

    /// Achieved upload throughput in bits per second.
    async fn measure_upload(&mut self) -> Result<f64, ConnectivityError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    Running,
    Complete,
    Failed,
}
