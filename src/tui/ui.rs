//! Main rendering orchestration for the TUI dashboard.
//!
//! `render_dashboard` composes the header, the control bar, the two tables
//! (or a placeholder while disconnected), and the footer.

use crate::tui::app::App;
use crate::tui::views::tables::{render_row_table, BLOCKS_TABLE, TRANSACTIONS_TABLE};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::Instant;

/// Header text displayed at the top of the dashboard.
const HEADER_TEXT: &str = "Block Dashboard";

/// Footer text showing available keybindings.
const FOOTER_TEXT: &str = "[c] Connect  [d] Disconnect  [q] Quit";

/// Version string shown in the header (right-aligned).
const VERSION_TEXT: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Label of the connect control.
pub const CONNECT_LABEL: &str = "[c] Connect";

/// Label of the disconnect control.
pub const DISCONNECT_LABEL: &str = "[d] Disconnect";

/// Style of a control that accepts input.
pub fn enabled_style() -> Style {
    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
}

/// Style of a control that ignores input.
pub fn disabled_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Renders the full dashboard.
pub fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // controls
            Constraint::Min(3),    // tables or placeholder
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0]);
    render_controls(frame, chunks[1], app);

    if app.dashboard.regions_visible() {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_row_table(frame, halves[0], BLOCKS_TABLE, &app.dashboard.blocks);
        render_row_table(frame, halves[1], TRANSACTIONS_TABLE, &app.dashboard.transactions);
    } else {
        render_placeholder(frame, chunks[2], app);
    }

    render_footer(frame, chunks[3], app);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let padding_len = (area.width as usize)
        .saturating_sub(HEADER_TEXT.len())
        .saturating_sub(VERSION_TEXT.len());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(HEADER_TEXT, Style::default().fg(Color::Cyan)),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(VERSION_TEXT, Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(header, area);
}

/// Control bar: the two controls styled by enablement, then the state.
fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let controls = app.dashboard.controls();
    let style_for = |enabled: bool| {
        if enabled {
            enabled_style()
        } else {
            disabled_style()
        }
    };

    let (state_text, state_color) = if app.dashboard.is_connected() {
        ("connected", Color::Green)
    } else if app.is_connecting() {
        ("connecting", Color::Yellow)
    } else {
        ("disconnected", Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled(CONNECT_LABEL, style_for(controls.connect_enabled)),
        Span::raw("  "),
        Span::styled(DISCONNECT_LABEL, style_for(controls.disconnect_enabled)),
        Span::raw("   "),
        Span::styled(state_text, Style::default().fg(state_color)),
        Span::styled(
            format!("  {}", app.endpoint()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, app: &App) {
    let text = if app.is_connecting() {
        format!("Connecting to {} ...", app.endpoint())
    } else {
        "Not connected. Press c to connect.".to_string()
    };
    let placeholder = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(placeholder, area);
}

/// Footer: an unexpired status message replaces the keybinding hint.
fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status_message {
        Some((msg, expiry)) if Instant::now() < *expiry => Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Yellow),
        )),
        _ => Line::from(Span::styled(FOOTER_TEXT, Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}
