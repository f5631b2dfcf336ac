//! TUI rendering and terminal management (impure shell).

mod log_pane;
mod styles;

pub use styles::{segment_style, ChromeStyles, ColorConfig};

use crate::model::InputError;
use crate::parser::parse_trace;
use crate::source::InputSource;
use crate::state::{AppState, KeyOutcome};
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

/// Errors that can occur during TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations.
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// The initial trace read failed.
    #[error("Failed to read trace: {0}")]
    Input(#[from] InputError),
}

/// Resolved options the viewer runs with.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Re-read and re-parse the trace on an interval.
    pub follow: bool,
    /// Interval between follow-mode reloads.
    pub poll_interval: Duration,
    /// Color handling for content and chrome.
    pub color: ColorConfig,
}

/// Read the trace from `source` and run the viewer until the user quits.
///
/// Each follow-mode refresh re-reads the complete trace and re-parses it
/// from byte zero; there is no incremental mode. A failed reload keeps the
/// last good parse on screen.
///
/// # Errors
///
/// Returns `TuiError` for terminal failures or an unreadable initial
/// trace.
pub fn run_with_source(source: InputSource, options: ViewerOptions) -> Result<(), TuiError> {
    let trace = source.read_trace()?;
    let mut state = AppState::new(parse_trace(&trace));
    debug!(
        entries = state.log().entries().len(),
        follow = options.follow,
        "starting viewer"
    );

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut state, &source, &options);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &mut AppState,
    source: &InputSource,
    options: &ViewerOptions,
) -> Result<(), TuiError> {
    let chrome = ChromeStyles::new(options.color);
    let mut last_reload = Instant::now();

    loop {
        terminal.draw(|frame| draw(frame, state, &chrome, options, source))?;

        let timeout = if options.follow {
            options.poll_interval
        } else {
            Duration::from_millis(250)
        };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if state.handle_key(key) == KeyOutcome::Quit {
                        return Ok(());
                    }
                }
                // Resize triggers a redraw on the next loop turn.
                _ => {}
            }
        }

        if options.follow && last_reload.elapsed() >= options.poll_interval {
            match source.read_trace() {
                Ok(trace) => state.replace_log(parse_trace(&trace)),
                // Keep the last good parse; the file may reappear.
                Err(err) => warn!(error = %err, "follow-mode reload failed"),
            }
            last_reload = Instant::now();
        }
    }
}

fn draw(
    frame: &mut Frame,
    state: &mut AppState,
    chrome: &ChromeStyles,
    options: &ViewerOptions,
    source: &InputSource,
) {
    let [pane, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    state.set_viewport_rows(pane.height as usize);
    let lines = log_pane::visible_lines(state, chrome, options.color, pane.height as usize);
    frame.render_widget(Paragraph::new(lines), pane);
    frame.render_widget(status_line(state, chrome, options, source, status.width), status);
}

/// Bottom status bar: source name and counts on the left, key hints on
/// the right.
fn status_line<'a>(
    state: &AppState,
    chrome: &ChromeStyles,
    options: &ViewerOptions,
    source: &InputSource,
    width: u16,
) -> Paragraph<'a> {
    let left = format!(
        " {} — {} rows{}",
        source.display_name(),
        state.rows().len(),
        if options.follow { " (following)" } else { "" },
    );
    let right = "j/k move  ⏎ toggle  q quit ";
    let padding = (width as usize)
        .saturating_sub(left.width())
        .saturating_sub(right.width());
    let text = format!("{left}{}{right}", " ".repeat(padding));
    Paragraph::new(Line::from(Span::raw(text))).style(chrome.status_bar)
}
