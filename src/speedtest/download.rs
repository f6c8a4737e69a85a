use super::{ConnectivityError, Server};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct DownloadTest {
    download_size: u64,
}

impl DownloadTest {
    pub fn new(download_size: u64) -> Self {
        Self { download_size }
    }

    /// Streams the payload and returns the average throughput in bits/s.
    pub async fn run(&self, server: &Server) -> Result<DownloadResult, ConnectivityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let response = client.get(server.download_url(self.download_size)).send().await?;
        if !response.status().is_success() {
            return Err(ConnectivityError::Status(response.status().as_u16()));
        }
        let mut stream = response.bytes_stream();

        let start = Instant::now();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            downloaded += chunk?.len() as u64;
        }

        let elapsed = start.elapsed();
        debug!(bytes = downloaded, ?elapsed, "download finished");

        Ok(DownloadResult {
            bits_per_sec: bits_per_sec(downloaded, elapsed),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub bits_per_sec: f64,
}

pub(crate) fn bits_per_sec(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 * 8.0 / secs
}
