//! Application state and transitions.
//!
//! `AppState` owns the parsed log plus all UI state: the flattened row
//! list, the selection cursor, the scroll offset, and per-section collapse
//! overrides. All transitions are pure functions of the current state; the
//! view layer only reads.

use crate::model::{LogEntry, LogLine, LogSection, ParsedLog};
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::HashMap;

// ===== Row =====

/// One renderable row of the flattened log view.
///
/// Rows carry indices into the [`ParsedLog`] rather than references so the
/// state can rebuild them without self-borrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    /// Top-level line: `entries[entry]`.
    TopLine {
        /// Index into the log's entries.
        entry: usize,
    },
    /// Section header row for `entries[entry]`.
    SectionHeader {
        /// Index into the log's entries.
        entry: usize,
    },
    /// Body line `lines[line]` of the section at `entries[entry]`.
    ///
    /// Only present while that section is expanded.
    SectionLine {
        /// Index into the log's entries.
        entry: usize,
        /// Index into the section's body lines.
        line: usize,
    },
}

/// A row resolved against the log it indexes into.
#[derive(Debug, Clone, Copy)]
pub enum RowRef<'a> {
    /// A content line, top-level or inside a section.
    Content(&'a LogLine),
    /// A section header row.
    Header {
        /// The section the row belongs to.
        section: &'a LogSection,
        /// Effective collapsed state, including user toggles.
        collapsed: bool,
    },
}

// ===== KeyOutcome =====

/// Result of feeding one key event to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// State changed (or the key was recognized); redraw.
    Handled,
    /// Key is not bound to anything.
    Ignored,
    /// User asked to quit.
    Quit,
}

// ===== AppState =====

/// Viewer state for one trace.
#[derive(Debug, Clone)]
pub struct AppState {
    log: ParsedLog,
    rows: Vec<Row>,
    selected: usize,
    scroll: usize,
    viewport_rows: usize,
    /// User collapse toggles, keyed by the section's sequence number so
    /// they survive a follow-mode re-parse of a grown trace.
    collapse_overrides: HashMap<u32, bool>,
}

impl AppState {
    /// Create viewer state for a freshly parsed log.
    pub fn new(log: ParsedLog) -> Self {
        let mut state = Self {
            log,
            rows: Vec::new(),
            selected: 0,
            scroll: 0,
            viewport_rows: 1,
            collapse_overrides: HashMap::new(),
        };
        state.rebuild_rows();
        state
    }

    /// The parsed log being viewed.
    pub fn log(&self) -> &ParsedLog {
        &self.log
    }

    /// Flattened visible rows, in render order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Index of the selected row (0 when the log is empty).
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// First visible row index.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Resolve a row to the model data it points at.
    ///
    /// Returns `None` only if the row list and log disagree, which the
    /// rebuild discipline prevents; callers render nothing in that case
    /// rather than panicking.
    pub fn resolve(&self, row: Row) -> Option<RowRef<'_>> {
        let (Row::TopLine { entry }
        | Row::SectionHeader { entry }
        | Row::SectionLine { entry, .. }) = row;
        let entry = self.log.entries().get(entry)?;
        match row {
            Row::TopLine { .. } => entry.as_line().map(RowRef::Content),
            Row::SectionHeader { .. } => entry.as_section().map(|section| RowRef::Header {
                section,
                collapsed: self.is_collapsed(section),
            }),
            Row::SectionLine { line, .. } => entry
                .as_section()
                .and_then(|section| section.lines().get(line))
                .map(RowRef::Content),
        }
    }

    /// Effective collapsed state of a section: the user's toggle if any,
    /// otherwise the start marker's request.
    pub fn is_collapsed(&self, section: &LogSection) -> bool {
        self.collapse_overrides
            .get(&section.header_line().sequence())
            .copied()
            .unwrap_or_else(|| section.collapsed())
    }

    /// Record the viewport height so paging and scroll clamping track the
    /// real terminal size. Called by the view on every draw.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.ensure_selected_visible();
    }

    /// Swap in a re-parsed log (follow mode), keeping collapse toggles and
    /// clamping the cursor.
    pub fn replace_log(&mut self, log: ParsedLog) {
        self.log = log;
        self.rebuild_rows();
    }

    /// Apply one key event.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                KeyOutcome::Handled
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                KeyOutcome::Handled
            }
            KeyCode::PageUp => {
                self.move_selection(-(self.viewport_rows as isize));
                KeyOutcome::Handled
            }
            KeyCode::PageDown => {
                self.move_selection(self.viewport_rows as isize);
                KeyOutcome::Handled
            }
            KeyCode::Char('g') => {
                self.selected = 0;
                self.ensure_selected_visible();
                KeyOutcome::Handled
            }
            KeyCode::Char('G') => {
                self.selected = self.rows.len().saturating_sub(1);
                self.ensure_selected_visible();
                KeyOutcome::Handled
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_selected();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Toggle the collapsed state of the selected section header.
    /// A no-op on content rows.
    fn toggle_selected(&mut self) {
        let Some(Row::SectionHeader { entry }) = self.rows.get(self.selected).copied() else {
            return;
        };
        let Some(section) = self.log.entries()[entry].as_section() else {
            return;
        };
        let flipped = !self.is_collapsed(section);
        self.collapse_overrides
            .insert(section.header_line().sequence(), flipped);
        self.rebuild_rows();
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, last as isize) as usize;
        self.ensure_selected_visible();
    }

    fn ensure_selected_visible(&mut self) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + self.viewport_rows {
            self.scroll = self.selected + 1 - self.viewport_rows;
        }
        let max_scroll = self.rows.len().saturating_sub(self.viewport_rows);
        self.scroll = self.scroll.min(max_scroll);
    }

    /// Rebuild the flattened row list from the log and collapse state,
    /// then re-clamp cursor and scroll.
    fn rebuild_rows(&mut self) {
        self.rows.clear();
        for (entry_index, entry) in self.log.entries().iter().enumerate() {
            match entry {
                LogEntry::Line(_) => self.rows.push(Row::TopLine { entry: entry_index }),
                LogEntry::Section(section) => {
                    self.rows.push(Row::SectionHeader { entry: entry_index });
                    if !self.is_collapsed(section) {
                        for line_index in 0..section.lines().len() {
                            self.rows.push(Row::SectionLine {
                                entry: entry_index,
                                line: line_index,
                            });
                        }
                    }
                }
            }
        }
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
        self.ensure_selected_visible();
    }
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_trace;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn state_for(trace: &str) -> AppState {
        AppState::new(parse_trace(trace))
    }

    #[test]
    fn rows_flatten_expanded_sections() {
        let state = state_for("top\nsection_start:10:s\na\nb\nsection_end:20:s\n");
        assert_eq!(
            state.rows(),
            &[
                Row::TopLine { entry: 0 },
                Row::SectionHeader { entry: 1 },
                Row::SectionLine { entry: 1, line: 0 },
                Row::SectionLine { entry: 1, line: 1 },
            ]
        );
    }

    #[test]
    fn collapsed_section_hides_body_rows() {
        let state = state_for("section_start:10:s[collapsed=true]\na\nb\n");
        assert_eq!(state.rows(), &[Row::SectionHeader { entry: 0 }]);
    }

    #[test]
    fn toggle_expands_collapsed_section() {
        let mut state = state_for("section_start:10:s[collapsed=true]\na\n");
        assert_eq!(state.rows().len(), 1);

        assert_eq!(state.handle_key(key(KeyCode::Enter)), KeyOutcome::Handled);
        assert_eq!(state.rows().len(), 2);

        assert_eq!(state.handle_key(key(KeyCode::Enter)), KeyOutcome::Handled);
        assert_eq!(state.rows().len(), 1);
    }

    #[test]
    fn toggle_on_content_row_is_a_no_op() {
        let mut state = state_for("just a line\n");
        state.handle_key(key(KeyCode::Enter));
        assert_eq!(state.rows().len(), 1);
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut state = state_for("a\nb\nc\n");
        assert_eq!(state.selected(), 0);

        state.handle_key(key(KeyCode::Down));
        assert_eq!(state.selected(), 1);

        state.handle_key(key(KeyCode::Up));
        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.selected(), 0, "clamped at top");

        state.handle_key(key(KeyCode::Char('G')));
        assert_eq!(state.selected(), 2);

        state.handle_key(key(KeyCode::Down));
        assert_eq!(state.selected(), 2, "clamped at bottom");

        state.handle_key(key(KeyCode::Char('g')));
        assert_eq!(state.selected(), 0);
    }

    #[test]
    fn quit_keys_quit() {
        let mut state = state_for("a\n");
        assert_eq!(state.handle_key(key(KeyCode::Char('q'))), KeyOutcome::Quit);
        assert_eq!(state.handle_key(key(KeyCode::Esc)), KeyOutcome::Quit);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut state = state_for("a\n");
        assert_eq!(state.handle_key(key(KeyCode::Char('x'))), KeyOutcome::Ignored);
    }

    #[test]
    fn scroll_follows_selection_past_viewport() {
        let mut state = state_for("a\nb\nc\nd\ne\nf\n");
        state.set_viewport_rows(3);

        state.handle_key(key(KeyCode::Char('G')));
        assert_eq!(state.selected(), 5);
        assert_eq!(state.scroll(), 3, "last row visible at bottom of viewport");

        state.handle_key(key(KeyCode::Char('g')));
        assert_eq!(state.scroll(), 0);
    }

    #[test]
    fn paging_moves_by_viewport_height() {
        let mut state = state_for("a\nb\nc\nd\ne\nf\ng\nh\n");
        state.set_viewport_rows(4);

        state.handle_key(key(KeyCode::PageDown));
        assert_eq!(state.selected(), 4);

        state.handle_key(key(KeyCode::PageUp));
        assert_eq!(state.selected(), 0);
    }

    #[test]
    fn replace_log_keeps_collapse_toggle_for_surviving_section() {
        let mut state = state_for("section_start:10:s\na\n");
        // Collapse the expanded section.
        state.handle_key(key(KeyCode::Enter));
        assert_eq!(state.rows().len(), 1);

        // Same trace grown by one line: section keeps sequence number 1.
        state.replace_log(parse_trace("section_start:10:s\na\nb\n"));
        assert_eq!(state.rows().len(), 1, "still collapsed after re-parse");
    }

    #[test]
    fn replace_log_clamps_selection() {
        let mut state = state_for("a\nb\nc\n");
        state.handle_key(key(KeyCode::Char('G')));
        assert_eq!(state.selected(), 2);

        state.replace_log(parse_trace("a\n"));
        assert_eq!(state.selected(), 0);
    }

    #[test]
    fn resolve_maps_rows_to_model_data() {
        let state = state_for("top\nsection_start:10:build\ninner\n");

        match state.resolve(state.rows()[0]) {
            Some(RowRef::Content(line)) => assert_eq!(line.text(), "top"),
            other => panic!("Expected content row, got {other:?}"),
        }
        match state.resolve(state.rows()[1]) {
            Some(RowRef::Header { section, collapsed }) => {
                assert_eq!(section.name(), "build");
                assert!(!collapsed);
            }
            other => panic!("Expected header row, got {other:?}"),
        }
        match state.resolve(state.rows()[2]) {
            Some(RowRef::Content(line)) => assert_eq!(line.text(), "inner"),
            other => panic!("Expected content row, got {other:?}"),
        }
    }

    #[test]
    fn resolve_rejects_out_of_range_rows() {
        let state = state_for("only\n");
        assert!(state.resolve(Row::TopLine { entry: 9 }).is_none());
        assert!(state
            .resolve(Row::SectionLine { entry: 0, line: 0 })
            .is_none());
    }

    #[test]
    fn empty_log_handles_keys_without_panicking() {
        let mut state = state_for("");
        state.handle_key(key(KeyCode::Down));
        state.handle_key(key(KeyCode::Enter));
        state.handle_key(key(KeyCode::Char('G')));
        assert_eq!(state.selected(), 0);
    }
}
