//! Viewer state and transitions (pure).

pub mod app_state;

pub use app_state::{AppState, KeyOutcome, Row, RowRef};
