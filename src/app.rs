use crate::config::{Settings, SettingsField, SettingsStore};
use crate::i18n::Strings;
use crate::speedtest::{MeasurementResult, TestPhase};
use crate::worker::WorkerEvent;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Main,
    Settings,
    About,
}

pub struct App {
    pub phase: TestPhase,
    pub result: MeasurementResult,
    pub error: Option<String>,
    pub progress: u8,
    pub should_quit: bool,

    pub view: AppView,

    pub settings: Settings,
    pub selected_setting: SettingsField,
    settings_dirty: bool,
    store: Box<dyn SettingsStore>,
}

impl App {
    pub fn new(settings: Settings, store: Box<dyn SettingsStore>) -> Self {
        Self {
            phase: TestPhase::Idle,
            result: empty_result(&settings),
            error: None,
            progress: 0,
            should_quit: false,
            view: AppView::Main,
            settings,
            selected_setting: SettingsField::Language,
            settings_dirty: false,
            store,
        }
    }

    pub fn strings(&self) -> &'static Strings {
        self.settings.language.strings()
    }

    pub fn is_running(&self) -> bool {
        self.phase == TestPhase::Running
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.view {
            AppView::Main => self.handle_main_key(key),
            AppView::Settings => self.handle_settings_key(key),
            AppView::About => self.handle_about_key(key),
        }
    }

    fn handle_main_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Enter if !self.is_running() => Some(AppAction::StartTest),
            KeyCode::Char('l') => {
                self.change_language();
                None
            }
            KeyCode::Char('a') => {
                self.view = AppView::About;
                None
            }
            KeyCode::Char('s') if !self.is_running() => {
                self.view = AppView::Settings;
                None
            }
            _ => None,
        }
    }

    fn handle_about_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('c')) {
            self.view = AppView::Main;
        }
        None
    }

    fn handle_settings_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => {
                self.view = AppView::Main;
                // Results of a finished run keep the unit they were measured in.
                if self.phase == TestPhase::Idle {
                    self.result = empty_result(&self.settings);
                }
                if self.settings_dirty {
                    self.persist_settings();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_setting = self.selected_setting.prev();
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected_setting = self.selected_setting.next();
            }
            KeyCode::Left | KeyCode::Char('h') => self.decrease_setting(),
            KeyCode::Right | KeyCode::Char('l') => self.increase_setting(),
            _ => {}
        }
        None
    }

    fn increase_setting(&mut self) {
        match self.selected_setting {
            SettingsField::Language => self.settings.language = self.settings.language.toggle(),
            SettingsField::Unit => self.settings.unit = self.settings.unit.toggle(),
            SettingsField::PingCount => {
                self.settings.ping_count = (self.settings.ping_count + 5).min(100);
            }
            SettingsField::DownloadSize => {
                self.settings.download_size_mb = (self.settings.download_size_mb + 25).min(500);
            }
            SettingsField::UploadSize => {
                self.settings.upload_size_mb = (self.settings.upload_size_mb + 10).min(250);
            }
        }
        self.settings_dirty = true;
    }

    fn decrease_setting(&mut self) {
        match self.selected_setting {
            SettingsField::Language => self.settings.language = self.settings.language.toggle(),
            SettingsField::Unit => self.settings.unit = self.settings.unit.toggle(),
            SettingsField::PingCount => {
                self.settings.ping_count = self.settings.ping_count.saturating_sub(5).max(5);
            }
            SettingsField::DownloadSize => {
                self.settings.download_size_mb =
                    self.settings.download_size_mb.saturating_sub(25).max(25);
            }
            SettingsField::UploadSize => {
                self.settings.upload_size_mb =
                    self.settings.upload_size_mb.saturating_sub(10).max(10);
            }
        }
        self.settings_dirty = true;
    }

    pub fn change_language(&mut self) {
        self.settings.language = self.settings.language.toggle();
        info!(language = self.settings.language.code(), "language changed");
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        match self.store.save(&self.settings) {
            Ok(()) => self.settings_dirty = false,
            Err(err) => warn!(error = %err, "failed to save settings"),
        }
    }

    pub fn begin_test(&mut self) {
        self.phase = TestPhase::Running;
        self.result = empty_result(&self.settings);
        self.error = None;
        self.progress = 0;
    }

    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress(p) => self.progress = p,
            WorkerEvent::Completed(result) => {
                self.result = result;
                self.phase = TestPhase::Complete;
            }
            WorkerEvent::Failed(err) => self.fail(err.message),
        }
    }

    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.phase = TestPhase::Failed;
    }

    /// Status line for the current phase, in the selected language.
    pub fn status_text(&self) -> String {
        let s = self.strings();
        match self.phase {
            TestPhase::Idle => s.connection_status.to_string(),
            TestPhase::Running => s.connection_measuring.to_string(),
            TestPhase::Complete => s.connection_completed.to_string(),
            TestPhase::Failed => format!(
                "{} {}: {}",
                s.connection_error,
                s.speedtest_failed,
                self.error.as_deref().unwrap_or_default()
            ),
        }
    }

    pub fn ping_text(&self) -> String {
        format!("{}: {:.0} ms", self.strings().ping, self.result.ping_ms)
    }

    pub fn download_text(&self) -> String {
        format!(
            "{}: {:.2} {}",
            self.strings().download,
            self.result.download,
            self.result.unit.label()
        )
    }

    pub fn upload_text(&self) -> String {
        format!(
            "{}: {:.2} {}",
            self.strings().upload,
            self.result.upload,
            self.result.unit.label()
        )
    }
}

/// Zeroed result shown before a run reports, in the configured unit.
fn empty_result(settings: &Settings) -> MeasurementResult {
    MeasurementResult {
        unit: settings.unit,
        ..MeasurementResult::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartTest,
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
