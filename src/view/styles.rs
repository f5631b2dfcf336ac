//! Style mapping for the log view.
//!
//! Decoded trace styles ([`TextStyle`]) stay render-library-agnostic in the
//! model; this module maps them onto ratatui styles and defines the chrome
//! (gutter, timestamps, section headers, status bar).

use crate::model::{AnsiColor, StreamKind, TextStyle};
use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

/// Map a decoded segment style onto a ratatui style.
///
/// With colors disabled everything renders unstyled; the parse itself is
/// unaffected.
pub fn segment_style(style: TextStyle, config: ColorConfig) -> Style {
    if !config.colors_enabled() {
        return Style::default();
    }
    let mut out = Style::default();
    if let Some(fg) = style.fg {
        out = out.fg(to_color(fg));
    }
    if let Some(bg) = style.bg {
        out = out.bg(to_color(bg));
    }
    if style.bold {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.underline {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

fn to_color(color: AnsiColor) -> Color {
    match color {
        AnsiColor::Indexed(index) => Color::Indexed(index),
        AnsiColor::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

// ===== ChromeStyles =====

/// Styles for everything around the trace content.
#[derive(Debug, Clone, Copy)]
pub struct ChromeStyles {
    /// Line number gutter.
    pub gutter: Style,
    /// Line number gutter for stderr lines.
    pub stderr_gutter: Style,
    /// Time-of-day column.
    pub timestamp: Style,
    /// Section title on header rows.
    pub section_title: Style,
    /// Duration badge on closed sections.
    pub duration: Style,
    /// Applied on top of the selected row.
    pub selection: Style,
    /// Bottom status bar.
    pub status_bar: Style,
}

impl ChromeStyles {
    /// Build the chrome palette, honoring the color configuration.
    pub fn new(config: ColorConfig) -> Self {
        if config.colors_enabled() {
            Self {
                gutter: Style::default().fg(Color::DarkGray),
                stderr_gutter: Style::default().fg(Color::Red),
                timestamp: Style::default().fg(Color::DarkGray),
                section_title: Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                duration: Style::default().fg(Color::Yellow),
                selection: Style::default().add_modifier(Modifier::REVERSED),
                status_bar: Style::default().fg(Color::Black).bg(Color::Gray),
            }
        } else {
            Self {
                gutter: Style::default(),
                stderr_gutter: Style::default(),
                timestamp: Style::default(),
                section_title: Style::default().add_modifier(Modifier::BOLD),
                duration: Style::default(),
                selection: Style::default().add_modifier(Modifier::REVERSED),
                status_bar: Style::default().add_modifier(Modifier::REVERSED),
            }
        }
    }

    /// Gutter style for a line, tinted for stderr.
    pub fn gutter_for(&self, stream: Option<StreamKind>) -> Style {
        match stream {
            Some(StreamKind::Stderr) => self.stderr_gutter,
            _ => self.gutter,
        }
    }
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(citv_env)]
    fn color_config_respects_no_color_flag() {
        std::env::remove_var("NO_COLOR");
        let config = ColorConfig::from_env_and_args(true);
        assert!(!config.colors_enabled());
    }

    #[test]
    #[serial(citv_env)]
    fn color_config_respects_no_color_env_var() {
        std::env::set_var("NO_COLOR", "1");
        let config = ColorConfig::from_env_and_args(false);
        assert!(!config.colors_enabled());
        std::env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial(citv_env)]
    fn color_config_defaults_to_enabled() {
        std::env::remove_var("NO_COLOR");
        let config = ColorConfig::from_env_and_args(false);
        assert!(config.colors_enabled());
    }

    #[test]
    #[serial(citv_env)]
    fn segment_style_maps_all_attributes() {
        std::env::remove_var("NO_COLOR");
        let config = ColorConfig::from_env_and_args(false);
        let style = segment_style(
            TextStyle {
                fg: Some(AnsiColor::Indexed(2)),
                bg: Some(AnsiColor::Rgb(1, 2, 3)),
                bold: true,
                italic: false,
                underline: true,
            },
            config,
        );
        assert_eq!(style.fg, Some(Color::Indexed(2)));
        assert_eq!(style.bg, Some(Color::Rgb(1, 2, 3)));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));
        assert!(!style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    #[serial(citv_env)]
    fn segment_style_is_plain_when_colors_disabled() {
        std::env::remove_var("NO_COLOR");
        let config = ColorConfig::from_env_and_args(true);
        let style = segment_style(
            TextStyle {
                fg: Some(AnsiColor::Indexed(1)),
                bg: None,
                bold: true,
                italic: false,
                underline: false,
            },
            config,
        );
        assert_eq!(style, Style::default());
    }

    #[test]
    #[serial(citv_env)]
    fn stderr_lines_get_the_red_gutter() {
        std::env::remove_var("NO_COLOR");
        let styles = ChromeStyles::new(ColorConfig::from_env_and_args(false));
        assert_eq!(
            styles.gutter_for(Some(StreamKind::Stderr)),
            styles.stderr_gutter
        );
        assert_eq!(styles.gutter_for(Some(StreamKind::Stdout)), styles.gutter);
        assert_eq!(styles.gutter_for(None), styles.gutter);
    }
}
