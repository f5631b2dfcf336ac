//! CI Trace Viewer (citv)
//!
//! TUI application for viewing CI job trace logs.
//!
//! The core is a pure, single-pass trace parser (`parser`) that turns the
//! raw terminal output of a job into an ordered list of content lines and
//! named, collapsible sections (`model`). Everything else is a thin shell:
//! input sources, configuration, logging, and a ratatui viewer.

pub mod config;
pub mod logging;
pub mod model;
pub mod parser;
pub mod source;
pub mod state;
pub mod view;
