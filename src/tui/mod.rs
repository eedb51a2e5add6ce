//! TUI module for the block dashboard.
//!
//! Provides a terminal user interface built on ratatui and crossterm that
//! connects to a node on demand and lists blocks and transactions as they
//! are announced.

pub mod app;
pub mod event;
pub mod ui;
pub mod views;

#[cfg(test)]
pub(crate) mod test_utils;
