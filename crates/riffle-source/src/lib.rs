//! Input plumbing for the pager: lines, stores, and background readers.
//!
//! - [`Line`]: one raw input line with a memoized plain-text projection.
//! - [`LineStore`]: the shared, growing array of lines plus reader
//!   lifecycle state and backpressure.
//! - [`Reader`]: background thread feeding a store from a stream or file,
//!   with tailing and optional one-shot highlighting.
//! - [`LineSource`]: the seam that scrolling, search, and filtering share.
//!
//! # Example
//!
//! ```
//! use riffle_source::{LineIndex, Reader};
//!
//! let reader = Reader::from_text("greeting", "hello\nworld\n");
//! let store = reader.store();
//! assert_eq!(store.line_count(), 2);
//! assert_eq!(store.line(LineIndex::new(1)).unwrap().raw(), "world");
//! ```

#![forbid(unsafe_code)]

pub mod boundary;
pub mod index;
pub mod line;
pub mod reader;
pub mod source;
pub mod store;

pub use boundary::{FileOpener, Highlighter, OpenedSource, SourceOpener, TailSource};
pub use index::{LineIndex, LineNumber};
pub use line::Line;
pub use reader::{Reader, ReaderError, ReaderOptions};
pub use source::LineSource;
pub use store::{DEFAULT_PAUSE_AFTER_LINES, LineStore, Window};
