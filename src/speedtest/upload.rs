use super::download::bits_per_sec;
use super::{ConnectivityError, Server};
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;

const CHUNK_SIZE: usize = 1_000_000; // 1MB chunks

pub struct UploadTest {
    data: Vec<u8>,
}

impl UploadTest {
    pub fn new(upload_size: usize) -> Self {
        let mut rng = rand::rngs::StdRng::from_entropy();
        let data: Vec<u8> = (0..upload_size).map(|_| rng.gen()).collect();
        Self { data }
    }

    /// Posts the payload chunk by chunk and returns the average throughput in
    /// bits/s. The first failed chunk fails the whole measurement.
    pub async fn run(&self, server: &Server) -> Result<UploadResult, ConnectivityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let url = server.upload_url();
        let start = Instant::now();

        for chunk in self.data.chunks(CHUNK_SIZE) {
            let response = client.post(&url).body(chunk.to_vec()).send().await?;
            if !response.status().is_success() {
                return Err(ConnectivityError::Status(response.status().as_u16()));
            }
        }

        let elapsed = start.elapsed();
        debug!(bytes = self.data.len(), ?elapsed, "upload finished");

        Ok(UploadResult {
            bits_per_sec: bits_per_sec(self.data.len() as u64, elapsed),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub bits_per_sec: f64,
}
