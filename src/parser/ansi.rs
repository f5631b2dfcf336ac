//! Terminal escape decoding for trace bodies.
//!
//! Job output keeps its ANSI styling: the decoder splits a line into
//! [`StyleSegment`] runs while tracking the cumulative SGR state, and
//! swallows every other escape sequence (cursor movement, erase-in-line,
//! OSC hyperlinks) so they never reach the screen as garbage bytes.
//!
//! Style state is pass-scoped, not line-scoped: bold or a color set on one
//! line stays active on the next until an SGR code resets it, so one
//! [`StyleState`] must be created per parse pass and threaded through every
//! `decode` call of that pass.

use crate::model::{AnsiColor, StyleSegment, TextStyle};

const ESC: u8 = 0x1b;

/// Cumulative SGR state carried across the lines of one parse pass.
#[derive(Debug, Clone, Default)]
pub struct StyleState {
    current: TextStyle,
}

impl StyleState {
    /// Fresh state with no attributes active.
    pub fn new() -> Self {
        Self::default()
    }

    /// The style that would apply to the next run of text.
    pub fn current(&self) -> TextStyle {
        self.current
    }

    fn apply_sgr(&mut self, params: &[u16]) {
        let mut it = params.iter().copied();
        while let Some(param) = it.next() {
            match param {
                0 => self.current = TextStyle::default(),
                1 => self.current.bold = true,
                3 => self.current.italic = true,
                4 => self.current.underline = true,
                21 | 22 => self.current.bold = false,
                23 => self.current.italic = false,
                24 => self.current.underline = false,
                30..=37 => self.current.fg = Some(AnsiColor::Indexed((param - 30) as u8)),
                39 => self.current.fg = None,
                40..=47 => self.current.bg = Some(AnsiColor::Indexed((param - 40) as u8)),
                49 => self.current.bg = None,
                90..=97 => self.current.fg = Some(AnsiColor::Indexed((param - 90 + 8) as u8)),
                100..=107 => self.current.bg = Some(AnsiColor::Indexed((param - 100 + 8) as u8)),
                // 38/48 select an extended color and consume their own
                // arguments; a truncated argument list aborts the sequence.
                38 => match extended_color(&mut it) {
                    Some(color) => self.current.fg = Some(color),
                    None => break,
                },
                48 => match extended_color(&mut it) {
                    Some(color) => self.current.bg = Some(color),
                    None => break,
                },
                _ => {}
            }
        }
    }
}

/// Parse the argument tail of an SGR 38/48 extended color.
fn extended_color(it: &mut impl Iterator<Item = u16>) -> Option<AnsiColor> {
    match it.next()? {
        5 => Some(AnsiColor::Indexed(it.next()?.min(255) as u8)),
        2 => {
            let r = it.next()?.min(255) as u8;
            let g = it.next()?.min(255) as u8;
            let b = it.next()?.min(255) as u8;
            Some(AnsiColor::Rgb(r, g, b))
        }
        _ => None,
    }
}

/// Decode one line body into styled segments, updating `state`.
///
/// Escape-free input takes a single-segment fast path. Adjacent text with
/// the same effective style collapses into one segment; sequences that do
/// not change the style produce no segment boundary.
pub fn decode(text: &str, state: &mut StyleState) -> Vec<StyleSegment> {
    if !text.as_bytes().contains(&ESC) {
        if text.is_empty() {
            return Vec::new();
        }
        return vec![StyleSegment::new(text, state.current)];
    }

    let mut segments = Vec::new();
    let mut run = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find('\u{1b}') {
        run.push_str(&rest[..pos]);
        let seq = &rest.as_bytes()[pos..];
        let (consumed, sgr) = scan_escape(seq);
        if let Some(params) = sgr {
            flush(&mut segments, &mut run, state.current);
            state.apply_sgr(&params);
        }
        // Escape sequences are pure ASCII, so pos + consumed always lands
        // on a char boundary.
        rest = &rest[pos + consumed..];
    }
    run.push_str(rest);
    flush(&mut segments, &mut run, state.current);
    segments
}

fn flush(segments: &mut Vec<StyleSegment>, run: &mut String, style: TextStyle) {
    if !run.is_empty() {
        segments.push(StyleSegment::new(std::mem::take(run), style));
    }
}

/// Measure one escape sequence starting at an ESC byte.
///
/// Returns the number of bytes consumed and, for a complete SGR sequence,
/// its parsed parameter list. Unknown and truncated sequences are consumed
/// without producing parameters.
fn scan_escape(bytes: &[u8]) -> (usize, Option<Vec<u16>>) {
    debug_assert_eq!(bytes.first(), Some(&ESC));
    match bytes.get(1) {
        // CSI: ESC [ params final, final byte in 0x40..=0x7E
        Some(b'[') => {
            let mut i = 2;
            while i < bytes.len() {
                let b = bytes[i];
                i += 1;
                if (0x40..=0x7e).contains(&b) {
                    let params = if b == b'm' {
                        parse_sgr_params(&bytes[2..i - 1])
                    } else {
                        None
                    };
                    return (i, params);
                }
            }
            (i, None)
        }
        // OSC: ESC ] ... terminated by BEL or ST (ESC \)
        Some(b']') => {
            let mut i = 2;
            while i < bytes.len() {
                if bytes[i] == 0x07 {
                    return (i + 1, None);
                }
                if bytes[i] == ESC && bytes.get(i + 1) == Some(&b'\\') {
                    return (i + 2, None);
                }
                i += 1;
            }
            (i, None)
        }
        // Bare Fe escape: ESC + one byte in 0x40..=0x5F
        Some(b) if (0x40..=0x5f).contains(b) => (2, None),
        // Anything else (including a lone trailing ESC): drop the ESC byte
        _ => (1, None),
    }
}

/// Parse `;`-separated SGR parameters. An empty list or empty component
/// means 0 (reset); any non-numeric component invalidates the sequence.
fn parse_sgr_params(raw: &[u8]) -> Option<Vec<u16>> {
    if raw.is_empty() {
        return Some(vec![0]);
    }
    let text = std::str::from_utf8(raw).ok()?;
    text.split(';')
        .map(|part| {
            if part.is_empty() {
                Ok(0)
            } else {
                part.parse::<u16>()
            }
        })
        .collect::<Result<Vec<u16>, _>>()
        .ok()
}
