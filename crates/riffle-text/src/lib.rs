#![forbid(unsafe_code)]

//! Text formatting for the riffle pager.
//!
//! This crate turns one raw input line into terminal-ready content:
//! - [`Style`], [`Color`], [`AttrFlags`] - the cell styling model
//! - [`Cell`], [`CellLine`] - styled characters with display widths
//! - [`format_line`] - ANSI/man-page formatting to cells, plus the
//!   plain-text projection used by search
//! - [`wrap_cells`] - width-aware wrapping at aesthetic breakpoints
//!
//! Formatting is pure: the same raw line and [`FormatOptions`] always produce
//! the same cells, and the cell count always equals the plain-text character
//! count, which is what lets search match ranges map onto cells by index.
//!
//! # Example
//! ```
//! use riffle_text::{FormatOptions, format_line, wrap_cells};
//!
//! let line = format_line("\x1b[31mhello\x1b[0m wrapped world", &FormatOptions::default(), None);
//! assert_eq!(line.text(), "hello wrapped world");
//!
//! let rows = wrap_cells(&line.cells, 10);
//! assert_eq!(rows.len(), 3);
//! ```

mod ansi;
pub mod cell;
pub mod format;
mod manpage;
pub mod style;
pub mod wrap;

pub use cell::{Cell, CellLine, cell_width};
pub use format::{FormatOptions, TAB_STOP, UnprintableStyle, format_line, plain_text};
pub use style::{AttrFlags, Color, ColorDepth, Style};
pub use wrap::wrap_cells;
