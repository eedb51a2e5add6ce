//! Shared test utilities for TUI testing with ratatui TestBackend.

#![cfg(test)]

use ratatui::{backend::TestBackend, buffer::Buffer, style::Color, Terminal};

/// Creates a Terminal with TestBackend at the specified dimensions.
pub fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("failed to create test terminal")
}

/// Extracts all text from a specific row in the buffer as a single String.
pub fn row_text(buffer: &Buffer, row: u16) -> String {
    let area = buffer.area();
    if row >= area.height {
        return String::new();
    }
    (0..area.width)
        .map(|col| {
            buffer
                .cell((col, row))
                .map(|cell| cell.symbol())
                .unwrap_or(" ")
        })
        .collect()
}

/// Checks if a specific row contains the given substring.
pub fn row_contains(buffer: &Buffer, row: u16, text: &str) -> bool {
    row_text(buffer, row).contains(text)
}

/// Finds the first row index that contains the given text.
pub fn find_row_with_text(buffer: &Buffer, text: &str) -> Option<u16> {
    (0..buffer.area().height).find(|&row| row_contains(buffer, row, text))
}

/// Asserts that the first character of `text` in `row` has foreground `color`.
pub fn assert_text_fg_in_row(buffer: &Buffer, row: u16, text: &str, color: Color) {
    let row_string = row_text(buffer, row);
    let col = row_string
        .find(text)
        .unwrap_or_else(|| panic!("text '{}' not found in row {}: '{}'", text, row, row_string));
    let cell = buffer
        .cell((col as u16, row))
        .unwrap_or_else(|| panic!("cell at ({}, {}) does not exist", col, row));
    assert_eq!(
        cell.fg, color,
        "expected fg color {:?} for '{}' in row {}, got {:?}",
        color, text, row, cell.fg
    );
}

/// Renders the full dashboard to a buffer and returns it for inspection.
pub fn render_dashboard_to_buffer(
    app: &mut crate::tui::app::App,
    width: u16,
    height: u16,
) -> Buffer {
    let mut terminal = test_terminal(width, height);
    terminal
        .draw(|frame| {
            crate::tui::ui::render_dashboard(frame, app);
        })
        .expect("draw failed");
    terminal.backend().buffer().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_text_and_find() {
        let mut terminal = test_terminal(40, 4);
        terminal
            .draw(|frame| {
                use ratatui::layout::{Constraint, Direction, Layout};
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(1), Constraint::Length(1)])
                    .split(frame.area());
                frame.render_widget(ratatui::widgets::Paragraph::new("First Line"), chunks[0]);
                frame.render_widget(ratatui::widgets::Paragraph::new("Target Row"), chunks[1]);
            })
            .expect("draw failed");
        let buffer = terminal.backend().buffer();
        assert!(row_text(buffer, 0).starts_with("First Line"));
        assert_eq!(find_row_with_text(buffer, "Target Row"), Some(1));
        assert_eq!(find_row_with_text(buffer, "Missing"), None);
        assert_eq!(row_text(buffer, 99), "");
    }
}
