#![forbid(unsafe_code)]

//! Riffle public facade crate.
//!
//! Re-exports the pager engine from the internal crates and adds the
//! interactive layer on top: configuration, the mode state machine, and
//! frame painting against an abstract [`Screen`]. Terminal ownership (raw
//! mode, event polling, flushing) stays with the embedder; the pager only
//! consumes key events and sets cells.
//!
//! # Example
//!
//! ```
//! use riffle::prelude::*;
//!
//! let pager = Pager::from_text("greeting", "hello\nworld\n", PagerConfig::default());
//! assert_eq!(pager.store().line_count(), 2);
//! assert_eq!(*pager.mode(), PagerMode::Viewing);
//! ```

mod config;
mod mode;
mod pager;
mod screen;

// --- Text re-exports -------------------------------------------------------

pub use riffle_text::{
    AttrFlags, Cell, CellLine, Color, ColorDepth, FormatOptions, Style, UnprintableStyle,
};

// --- Source re-exports -----------------------------------------------------

pub use riffle_source::{
    FileOpener, Highlighter, Line, LineIndex, LineNumber, LineSource, LineStore, OpenedSource,
    Reader, ReaderError, ReaderOptions, SourceOpener, TailSource, Window,
};

// --- View re-exports -------------------------------------------------------

pub use riffle_view::{
    CanonicalContext, CanonicalPosition, FilteredSource, RenderedLine, ScrollPosition,
    SearchPattern,
};

// --- Input re-exports ------------------------------------------------------

pub use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

// --- Pager -----------------------------------------------------------------

pub use config::PagerConfig;
pub use mode::{PagerMode, handle_key};
pub use pager::Pager;
pub use screen::Screen;

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Cell, Color, ColorDepth, FormatOptions, KeyCode, KeyEvent, KeyModifiers, LineIndex,
        LineNumber, Pager, PagerConfig, PagerMode, Reader, ReaderError, ReaderOptions, Screen,
        Style,
    };

    pub use crate::{source, text, view};
}

pub use riffle_source as source;
pub use riffle_text as text;
pub use riffle_view as view;
