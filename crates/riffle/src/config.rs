//! Pager configuration as plain values.
//!
//! Nothing here reads the environment or parses flags; whoever embeds the
//! pager decides how these values are discovered and hands them over.

use riffle_source::DEFAULT_PAUSE_AFTER_LINES;
use riffle_text::{ColorDepth, FormatOptions};

/// Everything the pager needs to know that is not the input itself.
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Wrap long lines. When off, lines are sliced horizontally and the
    /// left/right keys pan the view.
    pub wrap: bool,
    pub show_line_numbers: bool,
    pub show_status_bar: bool,
    /// Deepest color model the terminal accepts; styles are downgraded to
    /// it while painting.
    pub color_depth: ColorDepth,
    /// Backpressure ceiling for the background reader; `usize::MAX`
    /// disables pausing.
    pub pause_after_lines: usize,
    /// Styling applied while formatting lines.
    pub format: FormatOptions,
    /// Rows kept visible above a search hit when scrolling to it.
    pub scroll_off: usize,
    /// Columns panned per horizontal scroll step.
    pub horizontal_step: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            wrap: true,
            show_line_numbers: true,
            show_status_bar: true,
            color_depth: ColorDepth::TrueColor,
            pause_after_lines: DEFAULT_PAUSE_AFTER_LINES,
            format: FormatOptions::default(),
            scroll_off: 0,
            horizontal_step: 16,
        }
    }
}
