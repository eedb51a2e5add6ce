//! Dashboard UI state: connection state, control enablement, and row lists.
//!
//! This is the model behind the terminal view. It performs no I/O; the TUI
//! drives it from session events and key presses.

use crate::events::{BlockEvent, TransactionEvent};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;

/// Connection state of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No live session. Initial state.
    #[default]
    Disconnected,
    /// Session established and subscriptions registered.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}

/// Enabled state of the two user controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Whether the connect control accepts input.
    pub connect_enabled: bool,
    /// Whether the disconnect control accepts input.
    pub disconnect_enabled: bool,
}

/// One rendered line in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Identifying hash of the event.
    pub id: String,
    /// Short secondary column (block height or transaction sender).
    pub detail: Option<String>,
    /// Local time the event was rendered.
    pub received_at: DateTime<Local>,
}

impl Row {
    /// Builds a row for a block event.
    pub fn from_block(block: &BlockEvent) -> Self {
        Self {
            id: block.hash.clone(),
            detail: block.index.map(|i| format!("#{}", i)),
            received_at: Local::now(),
        }
    }

    /// Builds a row for a transaction event.
    pub fn from_transaction(tx: &TransactionEvent) -> Self {
        Self {
            id: tx.tx_hash.clone(),
            detail: tx.author.clone(),
            received_at: Local::now(),
        }
    }
}

/// Append-only list of rows with an optional cap.
///
/// Without a cap the list grows for the life of the session. With a cap the
/// oldest rows are evicted first.
#[derive(Debug, Clone, Default)]
pub struct RowList {
    rows: VecDeque<Row>,
    cap: Option<usize>,
}

impl RowList {
    /// Creates an empty list. `cap` of `None` (or `Some(0)`) means unbounded.
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            rows: VecDeque::new(),
            cap: cap.filter(|&c| c > 0),
        }
    }

    /// Appends a row, evicting the oldest if the cap is reached.
    pub fn push(&mut self, row: Row) {
        if let Some(cap) = self.cap {
            while self.rows.len() >= cap {
                self.rows.pop_front();
            }
        }
        self.rows.push_back(row);
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Number of rows held.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows oldest first.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns the row at `index` (oldest is 0).
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Configured cap, if any.
    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}

/// Complete UI state of the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    state: ConnectionState,
    /// Rows rendered from block events.
    pub blocks: RowList,
    /// Rows rendered from transaction events.
    pub transactions: RowList,
}

impl DashboardState {
    /// Creates a disconnected dashboard whose lists hold at most `max_rows`.
    pub fn new(max_rows: Option<usize>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            blocks: RowList::new(max_rows),
            transactions: RowList::new(max_rows),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` when connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether the two table regions are shown. Mirrors the connection state.
    pub fn regions_visible(&self) -> bool {
        self.is_connected()
    }

    /// Enabled state of the connect and disconnect controls.
    pub fn controls(&self) -> Controls {
        Controls {
            connect_enabled: !self.is_connected(),
            disconnect_enabled: self.is_connected(),
        }
    }

    /// Transition to CONNECTED: show regions and clear both lists.
    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.blocks.clear();
        self.transactions.clear();
    }

    /// Transition to DISCONNECTED: hide regions and clear both lists.
    ///
    /// Calling this while already disconnected leaves the state unchanged.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.blocks.clear();
        self.transactions.clear();
    }

    /// Appends one row for a block. Returns `false` (and renders nothing)
    /// when disconnected.
    pub fn show_block(&mut self, block: &BlockEvent) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.blocks.push(Row::from_block(block));
        true
    }

    /// Appends one row for a transaction. Returns `false` (and renders
    /// nothing) when disconnected.
    pub fn show_tx(&mut self, tx: &TransactionEvent) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.transactions.push(Row::from_transaction(tx));
        true
    }
}
