//! Width-aware line wrapping with aesthetic breakpoints.
//!
//! [`wrap_cells`] splits one formatted line into display sub-lines no wider
//! than the given budget, preferring to break at whitespace, markdown link
//! boundaries (`](`), single path slashes, and hyphens before falling back to
//! a hard cut. Every input produces at least one sub-line; an empty or
//! all-whitespace line wraps to exactly one empty sub-line, so every line
//! occupies a screen row.

use crate::cell::{Cell, cell_width};

/// Split `cells` into sub-lines of at most `max_width` display columns.
///
/// Whitespace at a break point is dropped; leading whitespace survives only
/// on the first sub-line, preserving intentional indentation. A double-width
/// character that would straddle the limit moves wholly to the next sub-line.
/// The width bound can only be exceeded when a single character is wider than
/// the whole budget.
///
/// # Panics
///
/// Panics if `max_width` is zero.
#[must_use]
pub fn wrap_cells(cells: &[Cell], max_width: usize) -> Vec<Vec<Cell>> {
    assert!(max_width > 0, "wrap width must be positive");
    let mut rest = trim_end(cells);
    let mut wrapped: Vec<Vec<Cell>> = Vec::new();
    loop {
        if !wrapped.is_empty() {
            rest = trim_start(rest);
        }
        if cell_width(rest) <= max_width {
            wrapped.push(rest.to_vec());
            return wrapped;
        }
        let take = break_index(rest, max_width);
        wrapped.push(trim_end(&rest[..take]).to_vec());
        rest = &rest[take..];
    }
}

/// Breaking and trimming treat NBSP as content, not whitespace.
fn breakable_ws(c: char) -> bool {
    c.is_whitespace() && c != '\u{A0}'
}

fn trim_start(cells: &[Cell]) -> &[Cell] {
    let skip = cells.iter().take_while(|c| breakable_ws(c.ch)).count();
    &cells[skip..]
}

fn trim_end(cells: &[Cell]) -> &[Cell] {
    let keep = cells.len()
        - cells
            .iter()
            .rev()
            .take_while(|c| breakable_ws(c.ch))
            .count();
    &cells[..keep]
}

/// How many cells the next sub-line takes. Only called when the remaining
/// cells are wider than the budget, so the result is always below
/// `cells.len()`.
fn break_index(cells: &[Cell], max_width: usize) -> usize {
    // Hard-cut position: the most cells whose summed width still fits.
    let mut limit = 0;
    let mut used = 0;
    for cell in cells {
        let w = cell.width();
        if used + w > max_width {
            break;
        }
        used += w;
        limit += 1;
    }
    if limit == 0 {
        // A single rune wider than the whole budget cannot be split.
        return 1;
    }
    // A sub-line must keep some non-whitespace content, so never break
    // inside the leading whitespace run.
    let leading_ws = cells.iter().take_while(|c| breakable_ws(c.ch)).count();
    for i in (1..=limit).rev() {
        if i <= leading_ws {
            break;
        }
        if valid_break(cells, i) {
            return i;
        }
    }
    limit
}

/// Whether breaking before cell `i` lands on an aesthetic boundary.
fn valid_break(cells: &[Cell], i: usize) -> bool {
    let prev = cells[i - 1].ch;
    let next = cells[i].ch;
    if breakable_ws(next) {
        return true;
    }
    // Markdown link: `[text](url)` splits between label and target.
    if prev == ']' && next == '(' {
        return true;
    }
    // A single path slash; `//` as in URLs stays together.
    if prev == '/' && next != '/' && (i < 2 || cells[i - 2].ch != '/') {
        return true;
    }
    prev == '-'
}
