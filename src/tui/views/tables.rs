//! Bordered tables for the Blocks and Transactions regions.

use crate::dashboard::RowList;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row as TableRow, Table},
    Frame,
};

/// Width of the time column (`HH:MM:SS`).
const TIME_WIDTH: u16 = 8;

/// Width of the detail column.
const DETAIL_WIDTH: u16 = 12;

/// Column headers and title for one table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Border title, e.g. `Blocks`.
    pub title: &'static str,
    /// Header of the detail column.
    pub detail_header: &'static str,
    /// Header of the hash column.
    pub id_header: &'static str,
}

/// Table layout for block rows.
pub const BLOCKS_TABLE: TableSpec = TableSpec {
    title: "Blocks",
    detail_header: "Index",
    id_header: "Hash",
};

/// Table layout for transaction rows.
pub const TRANSACTIONS_TABLE: TableSpec = TableSpec {
    title: "Transactions",
    detail_header: "Author",
    id_header: "Tx Hash",
};

/// Number of data rows that fit in `area` below the borders and header.
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(3) as usize
}

/// Renders `rows` as a bordered table. When the list is longer than the
/// area, the newest rows are shown.
pub fn render_row_table(frame: &mut Frame, area: Rect, spec: TableSpec, rows: &RowList) {
    let skip = rows.len().saturating_sub(visible_rows(area));
    let body: Vec<TableRow> = rows
        .iter()
        .skip(skip)
        .map(|row| {
            TableRow::new(vec![
                Cell::from(row.received_at.format("%H:%M:%S").to_string())
                    .style(Style::default().fg(Color::DarkGray)),
                Cell::from(row.detail.clone().unwrap_or_default()),
                Cell::from(row.id.clone()),
            ])
        })
        .collect();

    let header = TableRow::new(vec![
        Cell::from("Time"),
        Cell::from(spec.detail_header),
        Cell::from(spec.id_header),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let title = format!(" {} ({}) ", spec.title, rows.len());
    let table = Table::new(
        body,
        [
            Constraint::Length(TIME_WIDTH),
            Constraint::Length(DETAIL_WIDTH),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}
