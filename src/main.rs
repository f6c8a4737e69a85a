mod app;
mod config;
mod i18n;
mod speedtest;
mod ui;
mod worker;

use anyhow::{Context, Result};
use app::{poll_event, App, AppAction};
use config::JsonSettingsStore;
use crossterm::event::Event;
use ratatui::DefaultTerminal;
use speedtest::client::HttpMeasurementClient;
use std::fs::{self, File};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::draw_ui;
use worker::{MeasurementWorker, WorkerEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging failures must not keep the speed test from starting.
    if let Err(err) = init_logging() {
        eprintln!("logging disabled: {err:#}");
    }

    let (settings, store) = config::open_settings(JsonSettingsStore::default_location());
    info!(language = settings.language.code(), "settings loaded");

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, App::new(settings, store)).await;

    ratatui::restore();
    result
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let dirs = config::project_dirs()?;
    let log_dir = dirs.data_local_dir();
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    let file = File::create(log_dir.join("runnerspeed.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUNNERSPEED_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

async fn run_app(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
    let mut test_rx: Option<mpsc::Receiver<WorkerEvent>> = None;

    loop {
        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Drain worker events
        if let Some(rx) = test_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        let terminal_event = event.is_terminal();
                        app.handle_worker_event(event);
                        if terminal_event {
                            test_rx = None;
                            break;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        if app.is_running() {
                            app.fail("measurement stopped unexpectedly".to_string());
                        }
                        test_rx = None;
                        break;
                    }
                }
            }
        }

        // Handle input
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(30))? {
            if let Some(action) = app.handle_key_event(key) {
                match action {
                    AppAction::Quit => break,
                    AppAction::StartTest => {
                        app.begin_test();
                        info!("starting measurement");

                        let client = HttpMeasurementClient::new(&app.settings);
                        let worker = MeasurementWorker::new(client, app.settings.unit);
                        let (_handle, rx) = worker.start();
                        test_rx = Some(rx);
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
