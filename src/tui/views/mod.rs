//! Widgets for the dashboard body.

pub mod tables;
