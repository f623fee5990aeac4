//! Viewport logic for the pager: positions, search, filtering, rendering.
//!
//! - [`ScrollPosition`] and [`canonicalize`]: fold raw scroll state into a
//!   renderable (line, wrapped row) pair under a geometry snapshot.
//! - [`SearchPattern`] and [`find_first_hit`]: smartcase queries scanned in
//!   parallel with a deterministic nearest-hit guarantee.
//! - [`FilteredSource`]: a [`riffle_source::LineSource`] exposing only the
//!   lines matching a pattern.
//! - [`visible_lines`]: the rows to paint for one frame.
//!
//! # Example
//!
//! ```
//! use riffle_source::Reader;
//! use riffle_view::{CanonicalContext, ScrollPosition};
//!
//! let reader = Reader::from_text("demo", "one\ntwo\nthree\n");
//! let store = reader.store();
//! let ctx = CanonicalContext {
//!     viewport_width: 80,
//!     viewport_height: 10,
//!     show_line_numbers: false,
//!     show_status_bar: true,
//!     wrap: true,
//!     line_count: store.line_count(),
//! };
//! // Three lines fit on one screen, so the end position is the top.
//! let mut position = ScrollPosition::end();
//! let top = position.canonical(&ctx, store.as_ref());
//! assert_eq!(top.line.map(|l| l.as_usize()), Some(0));
//! ```

#![forbid(unsafe_code)]

pub mod filter;
pub mod position;
pub mod render;
pub mod search;

pub use filter::FilteredSource;
pub use position::{
    CanonicalContext, CanonicalPosition, RawPosition, ScrollPosition, canonicalize, is_visible,
    last_visible,
};
pub use render::{RenderedLine, visible_lines};
pub use search::{SearchPattern, find_first_hit};
