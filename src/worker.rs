//! Background measurement run.
//!
//! A [`MeasurementWorker`] drives one run of the four client steps and
//! reports it over a channel: a few coarse progress checkpoints followed by
//! exactly one terminal event.

use crate::speedtest::{
    MeasurementClient, MeasurementError, MeasurementResult, ThroughputUnit,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const PROGRESS_STARTED: u8 = 10;
pub const PROGRESS_SERVER_SELECTED: u8 = 30;
pub const PROGRESS_DOWNLOADED: u8 = 70;
pub const PROGRESS_UPLOADED: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress(u8),
    Completed(MeasurementResult),
    Failed(MeasurementError),
}

impl WorkerEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Progress(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Completed,
    Failed,
}

pub struct MeasurementWorker<C> {
    client: C,
    unit: ThroughputUnit,
    state: WorkerState,
}

impl<C: MeasurementClient + 'static> MeasurementWorker<C> {
    pub fn new(client: C, unit: ThroughputUnit) -> Self {
        Self {
            client,
            unit,
            state: WorkerState::Idle,
        }
    }

    /// Runs the measurement sequence, sending progress checkpoints on
    /// `events`. Terminal events are left to the caller.
    pub async fn run(
        &mut self,
        events: &mpsc::Sender<WorkerEvent>,
    ) -> Result<MeasurementResult, MeasurementError> {
        if self.state != WorkerState::Idle {
            return Err(MeasurementError::new("measurement already started"));
        }
        self.state = WorkerState::Running;

        match self.sequence(events).await {
            Ok(result) => {
                self.state = WorkerState::Completed;
                info!(
                    ping_ms = result.ping_ms,
                    download = result.download,
                    upload = result.upload,
                    unit = self.unit.label(),
                    "measurement completed"
                );
                Ok(result)
            }
            Err(err) => {
                self.state = WorkerState::Failed;
                warn!(error = %err, "measurement failed");
                Err(err)
            }
        }
    }

    async fn sequence(
        &mut self,
        events: &mpsc::Sender<WorkerEvent>,
    ) -> Result<MeasurementResult, MeasurementError> {
        emit(events, WorkerEvent::Progress(PROGRESS_STARTED)).await;

        self.client.select_best_server().await?;
        emit(events, WorkerEvent::Progress(PROGRESS_SERVER_SELECTED)).await;

        let ping_ms = self.client.measure_ping().unwrap_or(0.0);

        let download = self.unit.convert(self.client.measure_download().await?);
        emit(events, WorkerEvent::Progress(PROGRESS_DOWNLOADED)).await;

        let upload = self.unit.convert(self.client.measure_upload().await?);
        emit(events, WorkerEvent::Progress(PROGRESS_UPLOADED)).await;

        Ok(MeasurementResult {
            ping_ms,
            download,
            upload,
            unit: self.unit,
        })
    }

    /// Spawns the run on a tokio task. The returned channel yields the
    /// checkpoints and then one terminal event; the handle resolves to the
    /// worker's final state.
    pub fn start(mut self) -> (JoinHandle<WorkerState>, mpsc::Receiver<WorkerEvent>) {
        let (tx, rx) = mpsc::channel(32);

        let handle = tokio::spawn(async move {
            let terminal = match self.run(&tx).await {
                Ok(result) => WorkerEvent::Completed(result),
                Err(err) => WorkerEvent::Failed(err),
            };
            emit(&tx, terminal).await;
            self.state
        });

        (handle, rx)
    }
}

async fn emit(events: &mpsc::Sender<WorkerEvent>, event: WorkerEvent) {
    // A dropped receiver only means nobody is watching anymore.
    let _ = events.send(event).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::ConnectivityError;
    use async_trait::async_trait;

    #[derive(Clone, Copy, PartialEq)]
    enum FailAt {
        Nowhere,
        ServerSelection,
        Download,
        Upload,
    }

    struct StubClient {
        ping: Option<f64>,
        download_bps: f64,
        upload_bps: f64,
        fail_at: FailAt,
    }

    impl StubClient {
        fn healthy() -> Self {
            Self {
                ping: Some(15.0),
                download_bps: 50_000_000.0,
                upload_bps: 10_000_000.0,
                fail_at: FailAt::Nowhere,
            }
        }

        fn failing_at(fail_at: FailAt) -> Self {
            Self {
                fail_at,
                ..Self::healthy()
            }
        }
    }

    #[async_trait]
    impl MeasurementClient for StubClient {
        async fn select_best_server(&mut self) -> Result<(), ConnectivityError> {
            if self.fail_at == FailAt::ServerSelection {
                return Err(ConnectivityError::Other("dns lookup failed".into()));
            }
            Ok(())
        }

        fn measure_ping(&self) -> Option<f64> {
            self.ping
        }

        async fn measure_download(&mut self) -> Result<f64, ConnectivityError> {
            if self.fail_at == FailAt::Download {
                return Err(ConnectivityError::Status(502));
            }
            Ok(self.download_bps)
        }

        async fn measure_upload(&mut self) -> Result<f64, ConnectivityError> {
            if self.fail_at == FailAt::Upload {
                return Err(ConnectivityError::Other("connection reset".into()));
            }
            Ok(self.upload_bps)
        }
    }

    async fn collect(client: StubClient, unit: ThroughputUnit) -> (Vec<WorkerEvent>, WorkerState) {
        let (handle, mut rx) = MeasurementWorker::new(client, unit).start();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (events, handle.await.unwrap())
    }

    fn progress(events: &[WorkerEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn assert_single_terminal_last(events: &[WorkerEvent]) {
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn successful_run_in_mbps() {
        let (events, state) = collect(StubClient::healthy(), ThroughputUnit::Mbps).await;

        assert_eq!(state, WorkerState::Completed);
        assert_eq!(progress(&events), vec![10, 30, 70, 100]);
        assert_single_terminal_last(&events);
        assert_eq!(
            events.last(),
            Some(&WorkerEvent::Completed(MeasurementResult {
                ping_ms: 15.0,
                download: 50.0,
                upload: 10.0,
                unit: ThroughputUnit::Mbps,
            }))
        );
    }

    #[tokio::test]
    async fn successful_run_in_mibps() {
        let (events, _) = collect(StubClient::healthy(), ThroughputUnit::MiBps).await;

        match events.last() {
            Some(WorkerEvent::Completed(result)) => {
                assert_eq!(result.download, 47.68);
                assert_eq!(result.upload, 9.54);
                assert_eq!(result.unit, ThroughputUnit::MiBps);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn checkpoints_never_decrease() {
        let (events, _) = collect(StubClient::healthy(), ThroughputUnit::Mbps).await;
        let checkpoints = progress(&events);
        assert!(checkpoints.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(checkpoints.last(), Some(&100));
    }

    #[tokio::test]
    async fn server_selection_failure_stops_after_first_checkpoint() {
        let client = StubClient::failing_at(FailAt::ServerSelection);
        let (events, state) = collect(client, ThroughputUnit::Mbps).await;

        assert_eq!(state, WorkerState::Failed);
        assert_eq!(progress(&events), vec![10]);
        assert_single_terminal_last(&events);
        match events.last() {
            Some(WorkerEvent::Failed(err)) => assert!(err.message.contains("dns lookup failed")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn download_failure_skips_remaining_checkpoints() {
        let (events, _) = collect(StubClient::failing_at(FailAt::Download), ThroughputUnit::Mbps).await;
        assert_eq!(progress(&events), vec![10, 30]);
        assert!(matches!(events.last(), Some(WorkerEvent::Failed(e)) if e.message.contains("502")));
    }

    #[tokio::test]
    async fn upload_failure_is_terminal() {
        let (events, state) = collect(StubClient::failing_at(FailAt::Upload), ThroughputUnit::Mbps).await;
        assert_eq!(state, WorkerState::Failed);
        assert_eq!(progress(&events), vec![10, 30, 70]);
        assert_single_terminal_last(&events);
    }

    #[tokio::test]
    async fn missing_ping_reports_zero() {
        let client = StubClient {
            ping: None,
            ..StubClient::healthy()
        };
        let (events, _) = collect(client, ThroughputUnit::Mbps).await;
        assert!(matches!(events.last(), Some(WorkerEvent::Completed(r)) if r.ping_ms == 0.0));
    }

    #[tokio::test]
    async fn independent_workers_agree() {
        let (tx, _rx) = mpsc::channel(32);
        let mut first = MeasurementWorker::new(StubClient::healthy(), ThroughputUnit::Mbps);
        let mut second = MeasurementWorker::new(StubClient::healthy(), ThroughputUnit::Mbps);

        let a = first.run(&tx).await.unwrap();
        let b = second.run(&tx).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn finished_worker_refuses_second_run() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut worker = MeasurementWorker::new(StubClient::healthy(), ThroughputUnit::Mbps);
        assert_eq!(worker.state, WorkerState::Idle);

        worker.run(&tx).await.unwrap();
        while rx.try_recv().is_ok() {}

        assert!(worker.run(&tx).await.is_err());
        assert_eq!(worker.state, WorkerState::Completed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut worker = MeasurementWorker::new(StubClient::healthy(), ThroughputUnit::Mbps);
        assert!(worker.run(&tx).await.is_ok());
    }
}
