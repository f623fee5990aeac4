//! Building the visible rows for one frame.
//!
//! Rendered rows are ephemeral: built per call from the source, never
//! cached. With wrapping on, a source line contributes one row per wrapped
//! sub-line; with wrapping off it contributes exactly one row, sliced
//! horizontally at the left column. The line-number column, when enabled,
//! is baked into each row's cells, blank on continuation rows.

use regex::Regex;
use riffle_source::{LineIndex, LineSource};
use riffle_text::{AttrFlags, Cell, FormatOptions, Style, wrap_cells};

use crate::position::{CanonicalContext, CanonicalPosition};

/// One viewport row, ready to paint.
#[derive(Debug, Clone)]
pub struct RenderedLine {
    /// Source line this row came from.
    pub index: LineIndex,
    /// Which wrapped sub-line of that source line; 0 when not wrapping.
    pub wrap_index: usize,
    pub cells: Vec<Cell>,
    /// Style for the columns right of the content.
    pub trailer: Style,
}

/// The rows visible when `top` is the first one on screen.
///
/// `left_column` only applies when wrapping is off; wide runes straddling
/// either horizontal cut render as a space so edges stay aligned.
#[must_use]
pub fn visible_lines(
    top: CanonicalPosition,
    ctx: &CanonicalContext,
    source: &dyn LineSource,
    opts: &FormatOptions,
    matcher: Option<&Regex>,
    left_column: usize,
) -> Vec<RenderedLine> {
    let Some(first) = top.line else { return Vec::new() };
    let rows = ctx.content_rows();
    let mut out = Vec::with_capacity(rows);
    let mut index = first.as_usize();
    let mut skip_rows = top.row;

    while out.len() < rows && index < ctx.line_count {
        let Some(line) = source.line(LineIndex::new(index)) else { break };
        let formatted = line.cells(opts, matcher);
        if ctx.wrap {
            let wrapped = wrap_cells(&formatted.cells, ctx.text_width());
            for (wrap_index, cells) in wrapped.into_iter().enumerate().skip(skip_rows) {
                if out.len() >= rows {
                    break;
                }
                out.push(RenderedLine {
                    index: LineIndex::new(index),
                    wrap_index,
                    cells,
                    trailer: formatted.trailer.clone(),
                });
            }
        } else {
            out.push(RenderedLine {
                index: LineIndex::new(index),
                wrap_index: 0,
                cells: slice_columns(&formatted.cells, left_column, ctx.text_width()),
                trailer: formatted.trailer.clone(),
            });
        }
        skip_rows = 0;
        index += 1;
    }

    if ctx.show_line_numbers {
        let column = ctx.number_column_width();
        for row in &mut out {
            let mut cells = number_cells(row, column);
            cells.append(&mut row.cells);
            row.cells = cells;
        }
    }
    out
}

/// Style of the line-number column.
fn number_style() -> Style {
    Style::new().with_attr(AttrFlags::DIM)
}

fn number_cells(row: &RenderedLine, column: usize) -> Vec<Cell> {
    let style = number_style();
    let text = if row.wrap_index == 0 {
        format!("{:>width$} ", row.index.number().to_string(), width = column - 1)
    } else {
        " ".repeat(column)
    };
    text.chars().map(|ch| Cell::new(ch, style.clone())).collect()
}

/// Cut `cells` to the display columns `[skip, skip + width)`.
fn slice_columns(cells: &[Cell], skip: usize, width: usize) -> Vec<Cell> {
    let end = skip + width;
    let mut out = Vec::new();
    let mut col = 0;
    for cell in cells {
        let start = col;
        col += cell.width();
        if col <= skip {
            continue;
        }
        if start.max(skip) >= end {
            break;
        }
        if start < skip || col > end {
            // A wide rune straddling the cut contributes one blank column.
            out.push(Cell::new(' ', cell.style.clone()));
            if col > end {
                break;
            }
        } else {
            out.push(cell.clone());
        }
    }
    out
}
