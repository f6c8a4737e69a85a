use super::{
    download::DownloadTest, ping::PingTest, upload::UploadTest, ConnectivityError,
    MeasurementClient, Server,
};
use crate::config::Settings;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Measurement client backed by HTTP speed-test servers.
pub struct HttpMeasurementClient {
    servers: Vec<Server>,
    ping_count: usize,
    download_size: u64,
    upload_size: usize,
    selected: Option<Server>,
    latency_ms: Option<f64>,
}

impl HttpMeasurementClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            servers: settings.servers.clone(),
            ping_count: settings.ping_count,
            download_size: settings.download_size_bytes(),
            upload_size: settings.upload_size_bytes(),
            selected: None,
            latency_ms: None,
        }
    }

    fn server(&self) -> Result<&Server, ConnectivityError> {
        self.selected
            .as_ref()
            .ok_or_else(|| ConnectivityError::Other("no server selected".to_string()))
    }
}

#[async_trait]
impl MeasurementClient for HttpMeasurementClient {
    async fn select_best_server(&mut self) -> Result<(), ConnectivityError> {
        let mut latencies = Vec::with_capacity(self.servers.len());

        for server in &self.servers {
            let mut test = PingTest::new(self.ping_count);
            let result = test.run(server).await?;
            match result.avg_ms {
                Some(avg) => debug!(server = %server.name, avg_ms = avg, jitter_ms = result.jitter_ms, "server latency"),
                None => warn!(server = %server.name, "server unreachable"),
            }
            latencies.push(result.avg_ms);
        }

        let (index, latency) =
            pick_best(&latencies).ok_or(ConnectivityError::NoServerReachable)?;
        let server = self.servers[index].clone();
        info!(server = %server.name, latency_ms = latency, "selected best server");

        self.selected = Some(server);
        self.latency_ms = Some(latency);
        Ok(())
    }

    fn measure_ping(&self) -> Option<f64> {
        self.latency_ms
    }

    async fn measure_download(&mut self) -> Result<f64, ConnectivityError> {
        let server = self.server()?;
        let result = DownloadTest::new(self.download_size).run(server).await?;
        Ok(result.bits_per_sec)
    }

    async fn measure_upload(&mut self) -> Result<f64, ConnectivityError> {
        let server = self.server()?;
        let result = UploadTest::new(self.upload_size).run(server).await?;
        Ok(result.bits_per_sec)
    }
}

/// Index and latency of the lowest-latency reachable candidate.
fn pick_best(latencies: &[Option<f64>]) -> Option<(usize, f64)> {
    latencies
        .iter()
        .enumerate()
        .filter_map(|(i, l)| l.map(|l| (i, l)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
