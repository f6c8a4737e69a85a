use crate::app::{App, AppView};
use crate::config::SettingsField;
use crate::i18n::Language;
use crate::speedtest::TestPhase;
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

// Palette
const BACKGROUND: Color = Color::Rgb(15, 39, 52);
const ACCENT: Color = Color::Rgb(125, 38, 178);
const PANEL_BORDER: Color = Color::Rgb(142, 68, 173);
const SECONDARY: Color = Color::Rgb(52, 73, 94);
const SUCCESS: Color = Color::Rgb(134, 194, 156);
const ERROR: Color = Color::Rgb(231, 111, 81);
const TEXT_PRIMARY: Color = Color::Rgb(255, 255, 255);
const TEXT_MUTED: Color = Color::Rgb(150, 160, 170);

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(BACKGROUND).fg(TEXT_PRIMARY)),
        area,
    );

    match app.view {
        AppView::Main => draw_main_view(frame, area, app),
        AppView::Settings => draw_settings_view(frame, area, app),
        AppView::About => {
            draw_main_view(frame, area, app);
            draw_about_dialog(frame, area, app);
        }
    }
}

fn draw_main_view(frame: &mut Frame, area: Rect, app: &App) {
    let area = centered(area, 48, 24);

    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(area);

    draw_header(frame, chunks[0], app);
    draw_status(frame, chunks[1], app);
    draw_metric(frame, chunks[2], &app.ping_text());
    draw_metric(frame, chunks[3], &app.download_text());
    draw_metric(frame, chunks[4], &app.upload_text());

    if app.is_running() {
        draw_progress(frame, chunks[5], app.progress);
    } else {
        draw_start_button(frame, chunks[5], app);
    }

    draw_help(frame, chunks[7], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(SECONDARY));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([Constraint::Min(10), Constraint::Length(20)]).split(inner);

    frame.render_widget(
        Paragraph::new(app.strings().window_title)
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    frame.render_widget(
        Paragraph::new(language_line(app.settings.language)).alignment(Alignment::Right),
        chunks[1],
    );
}

fn language_line(current: Language) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, lang) in [Language::Turkish, Language::English].into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_MUTED)));
        }
        let style = if lang == current {
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        spans.push(Span::styled(lang.display_name(), style));
    }
    Line::from(spans)
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let color = match app.phase {
        TestPhase::Idle | TestPhase::Running => TEXT_PRIMARY,
        TestPhase::Complete => SUCCESS,
        TestPhase::Failed => ERROR,
    };

    frame.render_widget(
        Paragraph::new(app.status_text())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_metric(frame: &mut Frame, area: Rect, text: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PANEL_BORDER));

    frame.render_widget(
        Paragraph::new(text.to_string())
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn draw_progress(frame: &mut Frame, area: Rect, percent: u8) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT)),
        )
        .gauge_style(Style::default().fg(ACCENT).bg(SECONDARY))
        .percent(u16::from(percent.min(100)));

    frame.render_widget(gauge, area);
}

fn draw_start_button(frame: &mut Frame, area: Rect, app: &App) {
    let button = centered(area, 20, 3);
    frame.render_widget(
        Paragraph::new(app.strings().start)
            .style(
                Style::default()
                    .fg(TEXT_PRIMARY)
                    .bg(ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(ACCENT)),
            ),
        button,
    );
}

fn draw_about_dialog(frame: &mut Frame, area: Rect, app: &App) {
    let s = app.strings();
    let popup = centered(area, 50, s.about_text.len() as u16 + 5);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(BACKGROUND))
        .title(Span::styled(format!(" {} ", s.about), Style::default().fg(TEXT_PRIMARY)));

    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

    let mut lines: Vec<Line> = s.about_text.iter().map(|l| Line::from(*l)).collect();
    if let Some(first) = lines.first_mut() {
        *first = Line::styled(
            s.about_text[0],
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        );
    }

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    frame.render_widget(
        Paragraph::new(format!("[ {} ]", s.close))
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[1],
    );
}

// Settings
fn draw_settings_view(frame: &mut Frame, area: Rect, app: &App) {
    let s = app.strings();
    let area = centered(area, 48, 22);

    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(1),
    ])
    .split(area);

    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(SECONDARY));
    let header_inner = header_block.inner(chunks[0]);
    frame.render_widget(header_block, chunks[0]);

    frame.render_widget(
        Paragraph::new(s.settings)
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        header_inner,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PANEL_BORDER));
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    let rows = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .split(inner);

    let settings = &app.settings;
    let entries = [
        (SettingsField::Language, s.language, settings.language.display_name().to_string()),
        (SettingsField::Unit, s.unit, settings.unit.label().to_string()),
        (SettingsField::PingCount, s.ping_samples, settings.ping_count.to_string()),
        (SettingsField::DownloadSize, s.download_size, format!("{} MB", settings.download_size_mb)),
        (SettingsField::UploadSize, s.upload_size, format!("{} MB", settings.upload_size_mb)),
    ];

    for (row, (field, label, value)) in rows.iter().zip(entries.iter()) {
        draw_setting_row(frame, *row, label, value, app.selected_setting == *field);
    }

    frame.render_widget(
        Paragraph::new(s.settings_help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_setting_row(frame: &mut Frame, area: Rect, label: &str, value: &str, selected: bool) {
    let chunks = Layout::horizontal([Constraint::Length(18), Constraint::Min(10)]).split(area);

    let label_style = if selected {
        Style::default().fg(PANEL_BORDER).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_MUTED)
    };

    frame.render_widget(
        Paragraph::new(format!(" {}", label)).style(label_style),
        chunks[0],
    );

    let value_text = if selected {
        format!("< {} >", value)
    } else {
        value.to_string()
    };

    let value_style = if selected {
        Style::default().fg(TEXT_PRIMARY)
    } else {
        Style::default().fg(TEXT_MUTED)
    };

    frame.render_widget(Paragraph::new(value_text).style(value_style), chunks[1]);
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let s = app.strings();
    let help = if app.is_running() {
        format!("l {} · a {} · q {}", s.language, s.about, s.quit)
    } else {
        format!(
            "enter {} · l {} · s {} · a {} · q {}",
            s.start, s.language, s.settings, s.about, s.quit
        )
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}

/// A `width` x `height` rect centered in `area`, clipped to it.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemorySettingsStore, Settings};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 28)).unwrap();
        terminal.draw(|frame| draw_ui(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        App::new(Settings::default(), Box::new(MemorySettingsStore::default()))
    }

    #[test]
    fn main_view_shows_labels_and_start() {
        let screen = render(&app());
        assert!(screen.contains("Runner SpeedTest"));
        assert!(screen.contains("Ping: 0 ms"));
        assert!(screen.contains("Başlat"));
    }

    #[test]
    fn progress_replaces_start_while_running() {
        let mut app = app();
        app.begin_test();
        app.progress = 70;
        let screen = render(&app);
        assert!(screen.contains("70%"));
        assert!(!screen.contains("Başlat"));
    }

    #[test]
    fn about_dialog_renders_over_main() {
        let mut app = app();
        app.settings.language = Language::English;
        app.view = AppView::About;
        let screen = render(&app);
        assert!(screen.contains("About"));
        assert!(screen.contains("[ Close ]"));
    }

    #[test]
    fn centered_rect_is_clipped() {
        let rect = centered(Rect::new(0, 0, 10, 5), 20, 3);
        assert_eq!(rect.width, 10);
        assert_eq!(rect.height, 3);
        assert_eq!(rect.y, 1);
    }
}
