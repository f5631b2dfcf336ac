//! CI trace parser.
//!
//! This module converts the complete raw output of one job into a
//! [`ParsedLog`]: an ordered sequence of content lines and named,
//! collapsible, duration-annotated sections.
//!
//! One pass walks the trace a physical line at a time:
//!
//! 1. The first non-empty line decides, once for the whole pass, whether
//!    the stream carries fixed-width runner headers (timestamp, stream
//!    kind, continuation flag). The decision is never revisited.
//! 2. Each body is searched for in-band `section_start` / `section_end`
//!    markers, which drive a one-deep section state machine.
//! 3. Header-flagged continuation lines merge into the previous logical
//!    line instead of creating a new one.
//! 4. Everything else becomes a numbered [`LogLine`], decoded into styled
//!    segments with SGR state carried across the pass.
//!
//! There is no fatal-error path. Malformed headers, truncated markers, and
//! orphan end markers all degrade to literal content; the parser never
//! fails, it only produces a flatter log.

pub mod ansi;

use crate::model::{LogEntry, LogLine, LogSection, ParsedLog, StreamKind, StyleSegment};
use ansi::StyleState;
use chrono::NaiveDateTime;
use tracing::debug;

// Runner header layout: 27-char timestamp, space, 2 hex digits, stream
// char, continuation char.
const HEADER_LEN: usize = 32;
const TIMESTAMP_LEN: usize = 27;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
// Byte range of the HH:MM:SS portion inside the timestamp field.
const TIME_OF_DAY_START: usize = 11;
const TIME_OF_DAY_END: usize = 19;

const SECTION_START: &str = "section_start:";
const SECTION_END: &str = "section_end:";
const COLLAPSED_OPTION: &str = "collapsed=true";

/// Parse a complete raw trace into a structured log.
///
/// This is the single entry point: one trace string in, one [`ParsedLog`]
/// out. All state (style carry-over, the open section, the sequence
/// counter) lives inside the call, so concurrent parses of different
/// traces are independent.
pub fn parse_trace(raw: &str) -> ParsedLog {
    let mut pass = ParsePass::new();
    for line in raw.lines() {
        pass.feed(line);
    }
    pass.finish()
}

/// Format a non-negative elapsed-seconds value as `MM:SS`, or `HH:MM:SS`
/// once it reaches an hour. Fields are zero-padded to two digits; negative
/// input clamps to zero.
pub fn format_duration(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

// ===== Runner header =====

/// Decoded fixed-width runner header of one physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunnerHeader {
    /// `HH:MM:SS` sliced out of the timestamp field.
    time_of_day: String,
    stream: StreamKind,
    /// True when this physical line continues the previous logical line.
    continuation: bool,
}

/// Test a physical line against the full header shape.
///
/// Used both for the one-time mode decision and per line afterwards: a
/// header-mode line that fails the shape keeps all its bytes as content.
fn parse_header(line: &str) -> Option<RunnerHeader> {
    let bytes = line.as_bytes();
    if bytes.len() < HEADER_LEN || !bytes[..HEADER_LEN].is_ascii() {
        return None;
    }
    if NaiveDateTime::parse_from_str(&line[..TIMESTAMP_LEN], TIMESTAMP_FORMAT).is_err() {
        return None;
    }
    if bytes[TIMESTAMP_LEN] != b' ' {
        return None;
    }
    if !is_lower_hex(bytes[28]) || !is_lower_hex(bytes[29]) {
        return None;
    }
    let stream = match bytes[30] {
        b'O' => StreamKind::Stdout,
        b'E' => StreamKind::Stderr,
        _ => return None,
    };
    let continuation = match bytes[31] {
        b'+' => true,
        b' ' => false,
        _ => return None,
    };
    Some(RunnerHeader {
        time_of_day: line[TIME_OF_DAY_START..TIME_OF_DAY_END].to_string(),
        stream,
        continuation,
    })
}

fn is_lower_hex(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'f')
}

// ===== Section markers =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Start,
    End,
}

/// A recognized in-band section marker and the byte span it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SectionMarker {
    kind: MarkerKind,
    timestamp: i64,
    name: String,
    collapsed: bool,
    span: std::ops::Range<usize>,
}

/// Find the first well-formed marker in a body.
///
/// Markers may appear anywhere in the line. A candidate that fails to
/// parse (truncated digits, empty name) is skipped, and later candidates
/// are still considered; a body with no well-formed marker falls through
/// to regular-line handling.
fn find_marker(body: &str) -> Option<SectionMarker> {
    for (pos, _) in body.match_indices("section_") {
        if let Some(marker) = parse_marker_at(body, pos) {
            return Some(marker);
        }
    }
    None
}

fn parse_marker_at(body: &str, pos: usize) -> Option<SectionMarker> {
    let tail = &body[pos..];
    let (kind, after_token) = if let Some(rest) = tail.strip_prefix(SECTION_START) {
        (MarkerKind::Start, rest)
    } else if let Some(rest) = tail.strip_prefix(SECTION_END) {
        (MarkerKind::End, rest)
    } else {
        return None;
    };

    // <digits>:
    let digits_len = after_token
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 || after_token.as_bytes().get(digits_len) != Some(&b':') {
        return None;
    }
    let timestamp: i64 = after_token[..digits_len].parse().ok()?;
    let after_colon = &after_token[digits_len + 1..];

    // <name>: stops at whitespace, CR/LF, an escape introducer, or the
    // options bracket.
    let name_len = after_colon
        .bytes()
        .take_while(|&b| !is_name_terminator(b))
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &after_colon[..name_len];
    let mut consumed = pos
        + match kind {
            MarkerKind::Start => SECTION_START.len(),
            MarkerKind::End => SECTION_END.len(),
        }
        + digits_len
        + 1
        + name_len;

    // Optional bracketed options, start markers only. An unclosed bracket
    // is not part of the marker and stays behind as text.
    let mut collapsed = false;
    if kind == MarkerKind::Start {
        if let Some(options) = leading_bracketed(&after_colon[name_len..]) {
            collapsed = options.split(',').any(|opt| opt.trim() == COLLAPSED_OPTION);
            consumed += options.len() + 2;
        }
    }

    Some(SectionMarker {
        kind,
        timestamp,
        name: name.to_string(),
        collapsed,
        span: pos..consumed,
    })
}

fn is_name_terminator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'\r' || b == 0x1b || b == b'[' || b == b']'
}

/// The content of a `[...]` group at the very start of `rest`, if the
/// closing bracket appears before any escape byte or line break.
fn leading_bracketed(rest: &str) -> Option<&str> {
    let inner = rest.strip_prefix('[')?;
    let close = inner.find(']')?;
    let options = &inner[..close];
    if options.bytes().any(|b| b == 0x1b || b == b'\r' || b == b'\n') {
        return None;
    }
    Some(options)
}

// ===== Parse pass =====

/// All state of one parse pass. Created fresh per call to [`parse_trace`];
/// nothing survives across calls.
struct ParsePass {
    /// Mode decision from the first non-empty physical line. `None` until
    /// decided; never changes afterwards.
    header_mode: Option<bool>,
    style: StyleState,
    sequence: u32,
    open: Option<LogSection>,
    entries: Vec<LogEntry>,
}

impl ParsePass {
    fn new() -> Self {
        Self {
            header_mode: None,
            style: StyleState::new(),
            sequence: 0,
            open: None,
            entries: Vec::new(),
        }
    }

    fn next_sequence(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }

    fn feed(&mut self, raw_line: &str) {
        if self.header_mode.is_none() && !raw_line.is_empty() {
            self.header_mode = Some(parse_header(raw_line).is_some());
        }

        let (header, body) = if self.header_mode == Some(true) {
            match parse_header(raw_line) {
                // The shape check guarantees the first 32 bytes are ASCII,
                // so the slice is UTF-8-safe.
                Some(header) => (Some(header), &raw_line[HEADER_LEN..]),
                None => (None, raw_line),
            }
        } else {
            (None, raw_line)
        };

        match find_marker(body) {
            Some(marker) => self.handle_marker(marker, body, header.as_ref()),
            None => self.handle_content(body, header.as_ref()),
        }
    }

    fn handle_marker(&mut self, marker: SectionMarker, body: &str, header: Option<&RunnerHeader>) {
        let mut leftover = String::with_capacity(body.len() - marker.span.len());
        leftover.push_str(&body[..marker.span.start]);
        leftover.push_str(&body[marker.span.end..]);
        leftover.retain(|c| c != '\r');

        match marker.kind {
            MarkerKind::Start => {
                // Only one section nests at a time: a new start force-
                // flushes whatever is open, without an end timestamp.
                self.flush_open_section();

                let header_line = LogLine::new(
                    self.next_sequence(),
                    header.map(|h| h.time_of_day.clone()),
                    header.map(|h| h.stream),
                    Vec::new(),
                );
                self.open = Some(LogSection::open(
                    marker.name,
                    marker.timestamp,
                    marker.collapsed,
                    header_line,
                ));

                let segments = ansi::decode(&leftover, &mut self.style);
                if !segments.is_empty() {
                    let line = self.new_line(header, segments);
                    if let Some(section) = self.open.as_mut() {
                        section.push_line(line);
                    }
                }
            }
            MarkerKind::End => {
                match self.open.take() {
                    Some(mut section) => {
                        let elapsed = marker.timestamp - section.start_timestamp();
                        section.close(marker.timestamp, format_duration(elapsed));
                        self.entries.push(LogEntry::Section(section));
                    }
                    // Orphan end marker: nothing to close, the marker text
                    // is simply stripped.
                    None => debug!(name = %marker.name, "section_end without open section"),
                }

                // Leftover text lands after the closed section, at the top
                // level.
                let segments = ansi::decode(&leftover, &mut self.style);
                if !segments.is_empty() {
                    let line = self.new_line(header, segments);
                    self.entries.push(LogEntry::Line(line));
                }
            }
        }
    }

    fn handle_content(&mut self, body: &str, header: Option<&RunnerHeader>) {
        let mut cleaned = body.to_string();
        cleaned.retain(|c| c != '\r');
        let segments = ansi::decode(&cleaned, &mut self.style);

        if header.is_some_and(|h| h.continuation) && !segments.is_empty() {
            if let Some(target) = self.last_content_line_mut() {
                target.extend_segments(segments);
                return;
            }
            debug!("continuation line with no prior line, promoting to new line");
        }

        let line = self.new_line(header, segments);
        match self.open.as_mut() {
            Some(section) => section.push_line(line),
            None => self.entries.push(LogEntry::Line(line)),
        }
    }

    fn new_line(&mut self, header: Option<&RunnerHeader>, segments: Vec<StyleSegment>) -> LogLine {
        LogLine::new(
            self.next_sequence(),
            header.map(|h| h.time_of_day.clone()),
            header.map(|h| h.stream),
            segments,
        )
    }

    /// The most recently created content line, for continuation merging.
    ///
    /// Looks at the open section's last body line first, then at the single
    /// most recent top-level entry — never further back. A trailing empty
    /// section therefore shadows older lines and the continuation is
    /// promoted to a new line instead.
    fn last_content_line_mut(&mut self) -> Option<&mut LogLine> {
        let open_has_lines = self.open.as_ref().is_some_and(LogSection::has_lines);
        if open_has_lines {
            return self.open.as_mut().and_then(LogSection::last_line_mut);
        }
        match self.entries.last_mut() {
            Some(LogEntry::Line(line)) => Some(line),
            Some(LogEntry::Section(section)) => section.last_line_mut(),
            None => None,
        }
    }

    /// Emit the open section without an end timestamp or duration.
    fn flush_open_section(&mut self) {
        if let Some(section) = self.open.take() {
            self.entries.push(LogEntry::Section(section));
        }
    }

    fn finish(mut self) -> ParsedLog {
        self.flush_open_section();
        let timestamped = self.header_mode.unwrap_or(false);
        debug!(
            entries = self.entries.len(),
            lines = self.sequence,
            timestamped,
            "parsed trace"
        );
        ParsedLog::new(self.entries, timestamped)
    }
}

// ===== Tests =====
