//! Log pane rendering.
//!
//! Turns the state's flattened rows into styled terminal lines: content
//! rows carry a line-number gutter, the optional time-of-day column, and
//! the decoded style segments; section header rows carry a disclosure
//! glyph, the formatted title, and a duration badge.

use crate::model::{LogLine, LogSection};
use crate::state::{AppState, Row, RowRef};
use crate::view::styles::{segment_style, ChromeStyles, ColorConfig};
use ratatui::text::{Line, Span};

/// Width of the line-number gutter.
const GUTTER_WIDTH: usize = 5;

const GLYPH_COLLAPSED: &str = "▸";
const GLYPH_EXPANDED: &str = "▾";

/// Render the rows visible in a viewport of `height` rows.
pub fn visible_lines<'a>(
    state: &'a AppState,
    styles: &ChromeStyles,
    config: ColorConfig,
    height: usize,
) -> Vec<Line<'a>> {
    let first = state.scroll();
    let last = (first + height).min(state.rows().len());
    state.rows()[first..last]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let selected = first + offset == state.selected();
            row_line(state, *row, styles, config, selected)
        })
        .collect()
}

fn row_line<'a>(
    state: &'a AppState,
    row: Row,
    styles: &ChromeStyles,
    config: ColorConfig,
    selected: bool,
) -> Line<'a> {
    let line = match state.resolve(row) {
        Some(RowRef::Content(log_line)) => content_line(log_line, styles, config),
        Some(RowRef::Header { section, collapsed }) => {
            section_header_line(section, collapsed, styles)
        }
        None => Line::default(),
    };
    if selected {
        line.style(styles.selection)
    } else {
        line
    }
}

/// A section header row: gutter, optional timestamp, disclosure glyph,
/// title, duration badge.
fn section_header_line<'a>(
    section: &'a LogSection,
    collapsed: bool,
    styles: &ChromeStyles,
) -> Line<'a> {
    let header = section.header_line();
    let glyph = if collapsed {
        GLYPH_COLLAPSED
    } else {
        GLYPH_EXPANDED
    };

    let mut spans = vec![
        Span::styled(gutter_text(header.sequence()), styles.gutter),
        timestamp_span(header, styles),
        Span::styled(format!("{glyph} {}", section.title()), styles.section_title),
    ];
    if let Some(duration) = section.duration() {
        spans.push(Span::styled(format!(" [{duration}]"), styles.duration));
    }
    Line::from(spans)
}

/// A content row: gutter, optional timestamp, decoded segments.
fn content_line<'a>(line: &'a LogLine, styles: &ChromeStyles, config: ColorConfig) -> Line<'a> {
    let mut spans = vec![
        Span::styled(gutter_text(line.sequence()), styles.gutter_for(line.stream())),
        timestamp_span(line, styles),
    ];
    spans.extend(
        line.segments()
            .iter()
            .map(|segment| Span::styled(segment.text.as_str(), segment_style(segment.style, config))),
    );
    Line::from(spans)
}

fn gutter_text(sequence: u32) -> String {
    format!("{sequence:>GUTTER_WIDTH$} ")
}

/// The time-of-day column, or nothing for plain-mode traces.
fn timestamp_span<'a>(line: &'a LogLine, styles: &ChromeStyles) -> Span<'a> {
    match line.timestamp() {
        Some(time) => Span::styled(format!("{time} "), styles.timestamp),
        None => Span::raw(""),
    }
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_trace;
    use crate::view::styles::ColorConfig;

    fn plain_chrome() -> (ChromeStyles, ColorConfig) {
        // Flag-driven so the environment cannot interfere.
        let config = ColorConfig::from_env_and_args(true);
        (ChromeStyles::new(config), config)
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn content_rows_carry_gutter_and_text() {
        let (styles, config) = plain_chrome();
        let state = AppState::new(parse_trace("hello\n"));
        let lines = visible_lines(&state, &styles, config, 10);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "    1 hello");
    }

    #[test]
    fn section_header_shows_glyph_title_and_duration() {
        let (styles, config) = plain_chrome();
        let state = AppState::new(parse_trace(
            "section_start:100:build_script\ncompiling\nsection_end:165:build_script\n",
        ));
        let lines = visible_lines(&state, &styles, config, 10);
        assert_eq!(line_text(&lines[0]), "    1 ▾ Build Script [01:05]");
        assert_eq!(line_text(&lines[1]), "    2 compiling");
    }

    #[test]
    fn collapsed_section_shows_collapsed_glyph_and_no_body() {
        let (styles, config) = plain_chrome();
        let state = AppState::new(parse_trace("section_start:100:tests[collapsed=true]\nok\n"));
        let lines = visible_lines(&state, &styles, config, 10);
        assert_eq!(lines.len(), 1);
        assert!(line_text(&lines[0]).contains("▸ Tests"));
    }

    #[test]
    fn unterminated_section_has_no_duration_badge() {
        let (styles, config) = plain_chrome();
        let state = AppState::new(parse_trace("section_start:100:deploy\n"));
        let lines = visible_lines(&state, &styles, config, 10);
        assert_eq!(line_text(&lines[0]), "    1 ▾ Deploy");
    }

    #[test]
    fn timestamped_lines_include_time_of_day() {
        let (styles, config) = plain_chrome();
        let trace = "2024-03-05T10:30:59.123456Z 00O echo hi\n";
        let state = AppState::new(parse_trace(trace));
        let lines = visible_lines(&state, &styles, config, 10);
        assert_eq!(line_text(&lines[0]), "    1 10:30:59 echo hi");
    }

    #[test]
    fn viewport_clips_to_scroll_window() {
        let (styles, config) = plain_chrome();
        let mut state = AppState::new(parse_trace("a\nb\nc\nd\ne\n"));
        state.set_viewport_rows(2);
        state.handle_key(crossterm::event::KeyEvent::from(
            crossterm::event::KeyCode::Char('G'),
        ));
        let lines = visible_lines(&state, &styles, config, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "    4 d");
        assert_eq!(line_text(&lines[1]), "    5 e");
    }
}
