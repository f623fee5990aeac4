//! The terminal surface seam.

use riffle_text::Cell;

/// Where the pager paints.
///
/// Implementations own the real terminal (raw mode, flushing, diffing);
/// the pager only ever asks for the size and sets cells. Writes outside
/// the reported size should be ignored, not panic.
pub trait Screen {
    /// Current size as (columns, rows).
    fn size(&self) -> (usize, usize);

    /// Put one cell at (`column`, `row`).
    fn set_cell(&mut self, column: usize, row: usize, cell: &Cell);
}
