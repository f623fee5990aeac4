//! Line formatting: raw text with embedded formatting to styled cells.
//!
//! [`format_line`] is a pure function of the raw text and a [`FormatOptions`]
//! value. It runs the ANSI tokenizer, the SGR style machine, man-page
//! overstrike handling, tab expansion, and unprintable-character substitution
//! in one pass, then optionally paints search matches over the result.
//!
//! The load-bearing invariant: the number of cells always equals the number
//! of characters in the line's plain-text projection. Search computes match
//! offsets on plain text and maps them back onto cells index-for-index, so
//! formatting may change how a character looks but never how many visible
//! characters there are.
//!
//! # Example
//!
//! ```
//! use riffle_text::{format_line, FormatOptions};
//!
//! let line = format_line("\x1b[1mbold\x1b[0m plain", &FormatOptions::default(), None);
//! assert_eq!(line.text(), "bold plain");
//! ```

use regex::Regex;
use unicode_width::UnicodeWidthChar;

use crate::ansi::{self, AnsiToken, AnsiTokenizer};
use crate::cell::{Cell, CellLine};
use crate::manpage::{self, HeadingUnit, Overstrike};
use crate::style::{AttrFlags, Style};

/// Fixed tab stop width, in cells.
pub const TAB_STOP: usize = 4;

/// How unprintable characters (controls, U+FFFD from invalid UTF-8) render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnprintableStyle {
    /// A `?` with inverted colors, making garbage visible.
    #[default]
    Highlight,
    /// A plain space, hiding it.
    Whitespace,
}

/// Style configuration for the formatter.
///
/// These are values, not globals: the caller decides the palette and passes
/// it in per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Base style for unformatted text; also what SGR 0/39/49 reset to.
    pub plain: Style,
    /// Style for search matches. `None` inverts the matched cells instead.
    pub standout: Option<Style>,
    /// Style for man-page heading lines.
    pub heading: Style,
    /// Style for man-page bullet glyphs.
    pub bullet: Style,
    /// Render mode for unprintable characters.
    pub unprintable: UnprintableStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            plain: Style::new(),
            standout: None,
            heading: Style::new().with_attr(AttrFlags::BOLD),
            bullet: Style::new(),
            unprintable: UnprintableStyle::Highlight,
        }
    }
}

/// Format one raw line into styled cells plus a trailer style.
///
/// `matcher` marks search hits: match ranges are found on the plain-text
/// projection and mapped onto the cells by character index.
#[must_use]
pub fn format_line(raw: &str, opts: &FormatOptions, matcher: Option<&Regex>) -> CellLine {
    let mut line = if manpage::is_heading(raw) {
        heading_cells(raw, opts)
    } else {
        formatted_cells(raw, opts)
    };
    if let Some(pattern) = matcher {
        mark_matches(&mut line.cells, pattern, opts);
    }
    line
}

/// The line's text with all formatting stripped.
///
/// This is the projection search and filtering run on; its character count
/// equals the cell count of any [`format_line`] call on the same input.
#[must_use]
pub fn plain_text(raw: &str) -> String {
    format_line(raw, &FormatOptions::default(), None).text()
}

fn formatted_cells(raw: &str, opts: &FormatOptions) -> CellLine {
    let mut cells = Vec::new();
    let mut style = opts.plain.clone();
    let mut trailer = Style::new().with_bg(opts.plain.bg);
    for token in AnsiTokenizer::new(raw) {
        match token {
            AnsiToken::Text(text) => push_text(&mut cells, text, &style, opts),
            AnsiToken::Sgr { params, raw: seq } => {
                match ansi::apply_sgr(&style, &opts.plain, params) {
                    Some(next) => style = next,
                    None => {
                        tracing::debug!(sequence = seq, "malformed SGR parameters, rendering literally");
                        push_text(&mut cells, seq, &style, opts);
                    }
                }
            }
            AnsiToken::EraseToEol => trailer = Style::new().with_bg(style.bg),
            AnsiToken::Hyperlink { uri } => {
                style.hyperlink = uri.map(Into::into);
            }
            AnsiToken::Literal(seq) => {
                tracing::debug!(sequence = seq, "unrecognized escape sequence, rendering literally");
                push_text(&mut cells, seq, &style, opts);
            }
        }
    }
    CellLine::new(cells, trailer)
}

fn heading_cells(raw: &str, opts: &FormatOptions) -> CellLine {
    let cells = manpage::heading_units(raw)
        .map(|unit| match unit {
            HeadingUnit::Space => Cell::new(' ', opts.heading.clone()),
            HeadingUnit::Overstruck(c) => Cell::new(c, opts.heading.clone()),
        })
        .collect();
    CellLine::new(cells, Style::new().with_bg(opts.plain.bg))
}

/// Append the cells for one run of text, handling overstrikes, tabs, and
/// unprintables. Also used for degraded escape sequences, whose ESC byte
/// renders as an unprintable like any other control character.
fn push_text(cells: &mut Vec<Cell>, text: &str, style: &Style, opts: &FormatOptions) {
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if let Some((kind, consumed)) = manpage::overstrike(rest) {
            let cell = match kind {
                Overstrike::Bold(c) => Cell::new(c, style.clone().with_attr(AttrFlags::BOLD)),
                Overstrike::Underline(c) => {
                    Cell::new(c, style.clone().with_attr(AttrFlags::UNDERLINE))
                }
                Overstrike::Bullet => Cell::new('•', opts.bullet.clone()),
            };
            cells.push(cell);
            rest = &rest[consumed..];
            continue;
        }
        rest = &rest[c.len_utf8()..];
        if c == '\t' {
            // Advance to the next tab stop, minimum one space.
            loop {
                cells.push(Cell::new(' ', style.clone()));
                if cells.len() % TAB_STOP == 0 {
                    break;
                }
            }
        } else if printable(c) {
            cells.push(Cell::new(c, style.clone()));
        } else {
            cells.push(unprintable_cell(style, opts));
        }
    }
}

fn printable(c: char) -> bool {
    // U+FFFD is what invalid UTF-8 decodes to; it has width 1 but marks
    // garbage input, so it goes through the unprintable path.
    c != '\u{FFFD}' && UnicodeWidthChar::width(c).is_some_and(|w| w > 0)
}

fn unprintable_cell(style: &Style, opts: &FormatOptions) -> Cell {
    match opts.unprintable {
        UnprintableStyle::Highlight => Cell::new('?', style.clone().inverted()),
        UnprintableStyle::Whitespace => Cell::new(' ', style.clone()),
    }
}

/// Restyle every cell covered by a pattern match.
fn mark_matches(cells: &mut [Cell], pattern: &Regex, opts: &FormatOptions) {
    if cells.is_empty() {
        return;
    }
    let plain: String = cells.iter().map(|c| c.ch).collect();
    if !pattern.is_match(&plain) {
        return;
    }
    // Map byte offsets from the regex onto character indices. Built only on
    // lines that actually contain a match.
    let char_starts: Vec<usize> = plain.char_indices().map(|(byte, _)| byte).collect();
    let char_at = |byte: usize| char_starts.binary_search(&byte).unwrap_or_else(|next| next);
    for found in pattern.find_iter(&plain) {
        let start = char_at(found.start());
        let end = char_at(found.end());
        for cell in &mut cells[start..end] {
            cell.style = match &opts.standout {
                // Standout replaces the whole style but keeps the link target.
                Some(standout) => standout.clone().with_hyperlink(cell.style.hyperlink.take()),
                None => cell.style.clone().inverted(),
            };
        }
    }
}
