//! Styled cells, the unit of formatted output.
//!
//! A [`Cell`] is one printable `char` plus the [`Style`] it is painted with.
//! Control characters and zero-width runes never become cells; the formatter
//! renders them away before cells exist. A [`CellLine`] is the formatter's
//! output for one input line: the cells plus the trailer style painted to the
//! right of the last cell.

use unicode_width::UnicodeWidthChar;

use crate::style::Style;

/// One printable character with its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Cell {
    #[must_use]
    pub fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    /// Display width in terminal columns (1 for most, 2 for wide CJK).
    #[must_use]
    pub fn width(&self) -> usize {
        UnicodeWidthChar::width(self.ch).unwrap_or(0)
    }
}

/// A fully formatted line: cells plus the style of the space after them.
///
/// The trailer matters for `CSI K` (erase in line): a line that ends with
/// "clear to end of line" under a colored background paints that background
/// all the way to the right edge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellLine {
    pub cells: Vec<Cell>,
    pub trailer: Style,
}

impl CellLine {
    #[must_use]
    pub fn new(cells: Vec<Cell>, trailer: Style) -> Self {
        Self { cells, trailer }
    }

    /// Total display width of the cells.
    #[must_use]
    pub fn width(&self) -> usize {
        cell_width(&self.cells)
    }

    /// The characters without their styles.
    #[must_use]
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }
}

/// Total display width of a run of cells.
#[must_use]
pub fn cell_width(cells: &[Cell]) -> usize {
    cells.iter().map(Cell::width).sum()
}
