use super::{ConnectivityError, Server};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct PingTest {
    samples: Vec<f64>,
    ping_count: usize,
}

impl PingTest {
    pub fn new(ping_count: usize) -> Self {
        Self {
            samples: Vec::new(),
            ping_count: ping_count.max(1),
        }
    }

    /// Probes `server` and returns the average round trip, or `None` if no
    /// probe got an answer.
    pub async fn run(&mut self, server: &Server) -> Result<PingResult, ConnectivityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        let url = server.download_url(0);
        self.samples.clear();

        // Warm-up: connection setup is not part of the round trip.
        match client.get(&url).send().await {
            Ok(resp) => {
                let _ = resp.bytes().await;
            }
            Err(err) => debug!(server = %server.name, error = %err, "warm-up request failed"),
        }

        for _ in 0..self.ping_count {
            let start = Instant::now();
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    self.samples.push(start.elapsed().as_secs_f64() * 1000.0);
                }
                Ok(resp) => debug!(server = %server.name, status = %resp.status(), "probe rejected"),
                Err(err) => debug!(server = %server.name, error = %err, "probe failed"),
            }

            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Ok(self.calculate_result())
    }

    fn calculate_result(&self) -> PingResult {
        if self.samples.is_empty() {
            return PingResult {
                avg_ms: None,
                jitter_ms: 0.0,
            };
        }

        let avg = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        let jitter = if self.samples.len() > 1 {
            let variance: f64 = self.samples.iter().map(|&x| (x - avg).powi(2)).sum::<f64>()
                / (self.samples.len() - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        PingResult {
            avg_ms: Some(avg),
            jitter_ms: jitter,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingResult {
    pub avg_ms: Option<f64>,
    pub jitter_ms: f64,
}
