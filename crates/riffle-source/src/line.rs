//! One stored input line.

use std::sync::OnceLock;

use regex::Regex;
use riffle_text::{CellLine, FormatOptions, format_line, plain_text};

/// A raw input line plus its lazily computed plain-text projection.
///
/// The raw text is immutable once stored. The plain text (formatting
/// stripped) is memoized because the renderer and concurrent search workers
/// all need it; [`OnceLock`] makes the first computation win and every later
/// call a cheap read. Formatted cells are never cached: rendered state is
/// rebuilt per frame.
#[derive(Debug)]
pub struct Line {
    raw: String,
    plain: OnceLock<String>,
}

impl Line {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            plain: OnceLock::new(),
        }
    }

    /// The line as read, escape sequences and all.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The line with all formatting stripped. Computed once, then shared.
    #[must_use]
    pub fn plain(&self) -> &str {
        self.plain.get_or_init(|| plain_text(&self.raw))
    }

    /// Format this line into styled cells.
    #[must_use]
    pub fn cells(&self, opts: &FormatOptions, matcher: Option<&Regex>) -> CellLine {
        format_line(&self.raw, opts, matcher)
    }
}
