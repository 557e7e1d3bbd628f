//! Query Visualizer - SELECT statement structure for SQL diagram widgets
//!
//! Turns a SELECT statement into a structural graph of tables, joins,
//! filters and projections, and keeps that graph consistent with the query
//! text, user settings and host-supplied configuration.

pub mod core;
pub mod ui;
