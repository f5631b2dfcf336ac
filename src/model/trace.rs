//! Parsed trace types.
//!
//! A parse pass turns one raw trace into a [`ParsedLog`]: an ordered list of
//! [`LogEntry`] values (flat lines or collapsible sections) plus a flag
//! recording whether the trace carried per-line runner headers. Everything
//! here is immutable once the pass completes; the crate-private mutators
//! exist only so the parser can build entries incrementally.

// ===== StreamKind =====

/// Which output stream the runner attributed a line to.
///
/// Only known for header-mode traces; plain traces carry no stream
/// information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output (`O` in the runner header).
    Stdout,
    /// Standard error (`E` in the runner header).
    Stderr,
}

// ===== TextStyle =====

/// A decoded terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiColor {
    /// Palette color: 0-7 normal, 8-15 bright, 16-255 extended.
    Indexed(u8),
    /// 24-bit color from an SGR `38;2;r;g;b` / `48;2;r;g;b` sequence.
    Rgb(u8, u8, u8),
}

/// Display attributes for one run of text.
///
/// The default value is the terminal's unstyled state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    /// Foreground color, if set.
    pub fg: Option<AnsiColor>,
    /// Background color, if set.
    pub bg: Option<AnsiColor>,
    /// Bold / increased intensity.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Underline.
    pub underline: bool,
}

impl TextStyle {
    /// True if no attribute is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

// ===== StyleSegment =====

/// A contiguous run of text sharing one decoded style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSegment {
    /// The visible text of the run.
    pub text: String,
    /// The style active over the whole run.
    pub style: TextStyle,
}

impl StyleSegment {
    /// Create a segment with an explicit style.
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Create an unstyled segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::default())
    }
}

// ===== LogLine =====

/// One logical content line of the parsed trace.
///
/// Invariant: `sequence` is assigned exactly once, at creation, and is
/// unique across the whole pass. Continuation merging appends segments to
/// an existing line instead of creating a new one, so merged content never
/// consumes a sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    sequence: u32,
    timestamp: Option<String>,
    stream: Option<StreamKind>,
    segments: Vec<StyleSegment>,
}

impl LogLine {
    /// Create a new line. Used by the parser.
    pub fn new(
        sequence: u32,
        timestamp: Option<String>,
        stream: Option<StreamKind>,
        segments: Vec<StyleSegment>,
    ) -> Self {
        Self {
            sequence,
            timestamp,
            stream,
            segments,
        }
    }

    /// The 1-based sequence number of the line.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Time of day (`HH:MM:SS`) from the runner header, if the trace had one.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Stream the runner attributed this line to, if known.
    pub fn stream(&self) -> Option<StreamKind> {
        self.stream
    }

    /// The styled runs making up the line, in order.
    pub fn segments(&self) -> &[StyleSegment] {
        &self.segments
    }

    /// Concatenated segment text, without styling.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Append continuation segments to this line.
    pub(crate) fn extend_segments(&mut self, more: Vec<StyleSegment>) {
        self.segments.extend(more);
    }
}

// ===== LogSection =====

/// A named, collapsible region of the trace.
///
/// The `header_line` is a structural marker: it owns the section's sequence
/// number and optional timestamp but never carries segments. Invariant:
/// `end_timestamp` and `duration` are set together or not at all; a section
/// closed by end-of-input or a force-flush has neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSection {
    name: String,
    start_timestamp: i64,
    end_timestamp: Option<i64>,
    duration: Option<String>,
    collapsed: bool,
    header_line: LogLine,
    lines: Vec<LogLine>,
}

impl LogSection {
    /// Open a section at its start marker. Used by the parser.
    pub fn open(name: impl Into<String>, start_timestamp: i64, collapsed: bool, header_line: LogLine) -> Self {
        Self {
            name: name.into(),
            start_timestamp,
            end_timestamp: None,
            duration: None,
            collapsed,
            header_line,
            lines: Vec::new(),
        }
    }

    /// Record the end marker. Sets the end timestamp and formatted duration
    /// together, keeping them paired.
    pub(crate) fn close(&mut self, end_timestamp: i64, duration: String) {
        self.end_timestamp = Some(end_timestamp);
        self.duration = Some(duration);
    }

    /// Append a body line. Used by the parser.
    pub(crate) fn push_line(&mut self, line: LogLine) {
        self.lines.push(line);
    }

    /// Mutable access to the most recent body line, for continuation
    /// merging. Never yields the header line.
    pub(crate) fn last_line_mut(&mut self) -> Option<&mut LogLine> {
        self.lines.last_mut()
    }

    /// True if the section has at least one body line.
    pub fn has_lines(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Raw section name as written in the marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unix seconds from the start marker.
    pub fn start_timestamp(&self) -> i64 {
        self.start_timestamp
    }

    /// Unix seconds from the end marker, if one was seen.
    pub fn end_timestamp(&self) -> Option<i64> {
        self.end_timestamp
    }

    /// Formatted duration, present iff the section was closed by an end
    /// marker.
    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    /// Initial collapsed state requested by the start marker options.
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Structural header line (sequence number and timestamp, no content).
    pub fn header_line(&self) -> &LogLine {
        &self.header_line
    }

    /// Body lines, in order.
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Display title: underscores become spaces and each word is
    /// title-cased, so `build_script` renders as `Build Script`.
    pub fn title(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ===== LogEntry =====

/// One top-level unit of parsed output: a flat line or a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A content line outside any section.
    Line(LogLine),
    /// A named, collapsible section.
    Section(LogSection),
}

impl LogEntry {
    /// The line payload, if this entry is a line.
    pub fn as_line(&self) -> Option<&LogLine> {
        match self {
            LogEntry::Line(line) => Some(line),
            LogEntry::Section(_) => None,
        }
    }

    /// The section payload, if this entry is a section.
    pub fn as_section(&self) -> Option<&LogSection> {
        match self {
            LogEntry::Line(_) => None,
            LogEntry::Section(section) => Some(section),
        }
    }
}

// ===== ParsedLog =====

/// The complete output of one parse pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLog {
    entries: Vec<LogEntry>,
    timestamped: bool,
}

impl ParsedLog {
    /// Assemble the final log. Used by the parser.
    pub fn new(entries: Vec<LogEntry>, timestamped: bool) -> Self {
        Self {
            entries,
            timestamped,
        }
    }

    /// Top-level entries in trace order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Whether the pass detected per-line runner headers.
    pub fn timestamped(&self) -> bool {
        self.timestamped
    }

    /// True if the trace produced no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All lines in order, flattening sections (header lines included).
    pub fn flattened_lines(&self) -> impl Iterator<Item = &LogLine> {
        self.entries.iter().flat_map(|entry| {
            let (first, rest): (&LogLine, &[LogLine]) = match entry {
                LogEntry::Line(line) => (line, &[]),
                LogEntry::Section(section) => (section.header_line(), section.lines()),
            };
            std::iter::once(first).chain(rest.iter())
        })
    }
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_line(sequence: u32, text: &str) -> LogLine {
        LogLine::new(sequence, None, None, vec![StyleSegment::plain(text)])
    }

    fn header_line(sequence: u32) -> LogLine {
        LogLine::new(sequence, None, None, vec![])
    }

    // ===== LogLine =====

    #[test]
    fn log_line_text_concatenates_segments() {
        let line = LogLine::new(
            1,
            None,
            None,
            vec![StyleSegment::plain("foo"), StyleSegment::plain("bar")],
        );
        assert_eq!(line.text(), "foobar");
    }

    #[test]
    fn log_line_extend_segments_appends_without_touching_sequence() {
        let mut line = plain_line(7, "foo");
        line.extend_segments(vec![StyleSegment::plain("bar")]);
        assert_eq!(line.sequence(), 7);
        assert_eq!(line.text(), "foobar");
        assert_eq!(line.segments().len(), 2);
    }

    #[test]
    fn log_line_timestamp_and_stream_default_to_none() {
        let line = plain_line(1, "x");
        assert!(line.timestamp().is_none());
        assert!(line.stream().is_none());
    }

    // ===== LogSection =====

    #[test]
    fn section_title_replaces_underscores_and_capitalizes() {
        let section = LogSection::open("build_script", 0, false, header_line(1));
        assert_eq!(section.title(), "Build Script");
    }

    #[test]
    fn section_title_single_word() {
        let section = LogSection::open("prepare", 0, false, header_line(1));
        assert_eq!(section.title(), "Prepare");
    }

    #[test]
    fn section_title_skips_empty_words() {
        let section = LogSection::open("get__sources", 0, false, header_line(1));
        assert_eq!(section.title(), "Get Sources");
    }

    #[test]
    fn section_open_has_no_end_or_duration() {
        let section = LogSection::open("a", 100, false, header_line(1));
        assert!(section.end_timestamp().is_none());
        assert!(section.duration().is_none());
        assert!(!section.has_lines());
    }

    #[test]
    fn section_close_sets_end_and_duration_together() {
        let mut section = LogSection::open("a", 100, false, header_line(1));
        section.close(110, "00:10".to_string());
        assert_eq!(section.end_timestamp(), Some(110));
        assert_eq!(section.duration(), Some("00:10"));
    }

    #[test]
    fn section_last_line_mut_skips_header_line() {
        let mut section = LogSection::open("a", 100, false, header_line(1));
        assert!(section.last_line_mut().is_none());

        section.push_line(plain_line(2, "body"));
        let last = section.last_line_mut().expect("has a body line");
        assert_eq!(last.sequence(), 2);
    }

    // ===== LogEntry =====

    #[test]
    fn log_entry_accessors_are_exclusive() {
        let line_entry = LogEntry::Line(plain_line(1, "x"));
        assert!(line_entry.as_line().is_some());
        assert!(line_entry.as_section().is_none());

        let section_entry = LogEntry::Section(LogSection::open("s", 0, false, header_line(2)));
        assert!(section_entry.as_line().is_none());
        assert!(section_entry.as_section().is_some());
    }

    // ===== ParsedLog =====

    #[test]
    fn parsed_log_flattened_lines_includes_section_header_and_body() {
        let mut section = LogSection::open("s", 0, false, header_line(2));
        section.push_line(plain_line(3, "in section"));
        let log = ParsedLog::new(
            vec![
                LogEntry::Line(plain_line(1, "top")),
                LogEntry::Section(section),
                LogEntry::Line(plain_line(4, "after")),
            ],
            false,
        );

        let sequences: Vec<u32> = log.flattened_lines().map(LogLine::sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn parsed_log_empty_trace() {
        let log = ParsedLog::default();
        assert!(log.is_empty());
        assert!(!log.timestamped());
    }
}
