//! Scroll positions and their canonicalization.
//!
//! A raw position is whatever the last key press left behind: an anchor
//! line plus a signed screen-row delta. Rendering needs a canonical one:
//! the delta folded into the anchor so it addresses a real wrapped row,
//! clamped at both document ends, and shifted up when the viewport would
//! otherwise show empty rows below the last line. Canonicalization is a
//! pure function of the position, a [`CanonicalContext`] snapshot, and the
//! line source; [`ScrollPosition`] memoizes the result per context.

use riffle_source::{LineIndex, LineSource};
use riffle_text::{FormatOptions, wrap_cells};

/// An uncanonicalized position: anchor line plus signed row delta.
///
/// `line` is `None` while nothing anchors the position yet (no data has
/// been seen); it resolves to the top once lines exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPosition {
    line: Option<LineIndex>,
    delta_screen_lines: isize,
}

impl RawPosition {
    /// First row of the first line.
    #[must_use]
    pub fn top() -> Self {
        Self::at(LineIndex::new(0))
    }

    /// Sentinel for the last screen of content; clamped during
    /// canonicalization.
    #[must_use]
    pub fn end() -> Self {
        Self { line: Some(LineIndex::new(usize::MAX)), delta_screen_lines: isize::MAX }
    }

    /// First row of `index`.
    #[must_use]
    pub fn at(index: LineIndex) -> Self {
        Self { line: Some(index), delta_screen_lines: 0 }
    }

    /// Row `row` within `index`.
    #[must_use]
    pub fn at_row(index: LineIndex, row: usize) -> Self {
        Self { line: Some(index), delta_screen_lines: row as isize }
    }

    #[must_use]
    pub fn moved_down(self, rows: usize) -> Self {
        Self {
            line: self.line,
            delta_screen_lines: self.delta_screen_lines.saturating_add_unsigned(rows),
        }
    }

    #[must_use]
    pub fn moved_up(self, rows: usize) -> Self {
        Self {
            line: self.line,
            delta_screen_lines: self.delta_screen_lines.saturating_sub_unsigned(rows),
        }
    }
}

/// The rendering geometry a canonical position is valid for.
///
/// Structural equality decides memoization reuse: any change, including the
/// store having grown, makes previously canonical positions stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalContext {
    pub viewport_width: usize,
    pub viewport_height: usize,
    pub show_line_numbers: bool,
    pub show_status_bar: bool,
    pub wrap: bool,
    pub line_count: usize,
}

impl CanonicalContext {
    /// Columns taken by the line-number column, separator included.
    #[must_use]
    pub fn number_column_width(&self) -> usize {
        if !self.show_line_numbers {
            return 0;
        }
        let last = LineIndex::new(self.line_count.saturating_sub(1)).number();
        last.to_string().chars().count() + 1
    }

    /// Columns left for line content.
    #[must_use]
    pub fn text_width(&self) -> usize {
        self.viewport_width.saturating_sub(self.number_column_width()).max(1)
    }

    /// Viewport rows available for content.
    #[must_use]
    pub fn content_rows(&self) -> usize {
        self.viewport_height.saturating_sub(usize::from(self.show_status_bar))
    }
}

/// A position rendering can start from: a real line and a real wrapped row
/// within it. `line` is `None` only for an empty store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPosition {
    pub line: Option<LineIndex>,
    pub row: usize,
}

impl CanonicalPosition {
    #[must_use]
    pub fn empty() -> Self {
        Self { line: None, row: 0 }
    }
}

/// Screen rows `index` occupies under `ctx`. Always at least 1; a line the
/// source no longer has counts as 1.
pub(crate) fn rows_for_line(index: usize, ctx: &CanonicalContext, source: &dyn LineSource) -> usize {
    if !ctx.wrap {
        return 1;
    }
    match source.line(LineIndex::new(index)) {
        Some(line) => {
            let cells = line.cells(&FormatOptions::default(), None);
            wrap_cells(&cells.cells, ctx.text_width()).len()
        }
        None => 1,
    }
}

/// Resolve a raw position against the context snapshot.
#[must_use]
pub fn canonicalize(
    raw: RawPosition,
    ctx: &CanonicalContext,
    source: &dyn LineSource,
) -> CanonicalPosition {
    if ctx.line_count == 0 {
        return CanonicalPosition::empty();
    }
    let anchor = raw.line.map_or(0, LineIndex::as_usize);
    let (index, row) = normalize(anchor, raw.delta_screen_lines, ctx, source);

    // Shift up when rows would sit empty below the last line; this is what
    // keeps End and near-end positions showing a full screen.
    let empty = empty_rows_below(index, row, ctx, source);
    if empty > 0 {
        let (index, row) = normalize(index, row as isize - empty as isize, ctx, source);
        return CanonicalPosition { line: Some(LineIndex::new(index)), row };
    }
    CanonicalPosition { line: Some(LineIndex::new(index)), row }
}

/// Fold a signed row delta into a concrete (line, row) pair, clamped to
/// `[first row of line 0, last row of the last line]`.
fn normalize(
    anchor: usize,
    delta: isize,
    ctx: &CanonicalContext,
    source: &dyn LineSource,
) -> (usize, usize) {
    let count = ctx.line_count;
    let mut index = anchor.min(count - 1);
    let mut delta = delta;

    while delta < 0 && index > 0 {
        index -= 1;
        delta += rows_for_line(index, ctx, source) as isize;
    }
    let mut delta = delta.max(0) as usize;

    let mut rows = rows_for_line(index, ctx, source);
    while delta >= rows {
        if index + 1 >= count {
            return (index, rows - 1);
        }
        delta -= rows;
        index += 1;
        rows = rows_for_line(index, ctx, source);
    }
    (index, delta)
}

/// Viewport rows left unfilled when rendering starts at (`index`, `row`).
fn empty_rows_below(
    index: usize,
    row: usize,
    ctx: &CanonicalContext,
    source: &dyn LineSource,
) -> usize {
    let target = ctx.content_rows();
    let mut filled = rows_for_line(index, ctx, source) - row;
    let mut next = index + 1;
    while filled < target && next < ctx.line_count {
        filled += rows_for_line(next, ctx, source);
        next += 1;
    }
    target.saturating_sub(filled)
}

/// The last (line, row) on screen when `top` is the first.
#[must_use]
pub fn last_visible(
    top: CanonicalPosition,
    ctx: &CanonicalContext,
    source: &dyn LineSource,
) -> CanonicalPosition {
    let Some(first) = top.line else { return top };
    let rows = ctx.content_rows();
    if rows == 0 {
        return top;
    }
    let mut index = first.as_usize();
    let mut row = top.row;
    let mut remaining = rows - 1;
    while remaining > 0 {
        let line_rows = rows_for_line(index, ctx, source);
        let below_in_line = line_rows - 1 - row.min(line_rows - 1);
        if remaining <= below_in_line {
            row += remaining;
            break;
        }
        if index + 1 >= ctx.line_count {
            row = line_rows - 1;
            break;
        }
        remaining -= below_in_line + 1;
        index += 1;
        row = 0;
    }
    CanonicalPosition { line: Some(LineIndex::new(index)), row }
}

/// Whether `target` falls within the screen topped by `top`, inclusive.
#[must_use]
pub fn is_visible(
    target: CanonicalPosition,
    top: CanonicalPosition,
    ctx: &CanonicalContext,
    source: &dyn LineSource,
) -> bool {
    let (Some(target_line), Some(top_line)) = (target.line, top.line) else {
        return target.line.is_none() && top.line.is_none();
    };
    let last = last_visible(top, ctx, source);
    let Some(last_line) = last.line else { return false };
    let target_key = (target_line.as_usize(), target.row);
    target_key >= (top_line.as_usize(), top.row)
        && target_key <= (last_line.as_usize(), last.row)
}

/// A raw position plus its memoized canonical form.
#[derive(Debug, Clone)]
pub struct ScrollPosition {
    raw: RawPosition,
    cache: Option<(CanonicalContext, CanonicalPosition)>,
}

impl ScrollPosition {
    #[must_use]
    pub fn top() -> Self {
        Self { raw: RawPosition::top(), cache: None }
    }

    #[must_use]
    pub fn end() -> Self {
        Self { raw: RawPosition::end(), cache: None }
    }

    #[must_use]
    pub fn at(index: LineIndex) -> Self {
        Self { raw: RawPosition::at(index), cache: None }
    }

    /// Canonical form under `ctx`, computed at most once per distinct
    /// context. The raw anchor collapses to the result so later relative
    /// moves start from solid ground.
    pub fn canonical(
        &mut self,
        ctx: &CanonicalContext,
        source: &dyn LineSource,
    ) -> CanonicalPosition {
        if let Some((cached_ctx, position)) = &self.cache
            && cached_ctx == ctx
        {
            return *position;
        }
        let position = canonicalize(self.raw, ctx, source);
        if let Some(line) = position.line {
            self.raw = RawPosition::at_row(line, position.row);
        }
        self.cache = Some((ctx.clone(), position));
        position
    }

    pub fn move_down(&mut self, rows: usize) {
        self.raw = self.raw.moved_down(rows);
        self.cache = None;
    }

    pub fn move_up(&mut self, rows: usize) {
        self.raw = self.raw.moved_up(rows);
        self.cache = None;
    }

    pub fn jump_to(&mut self, index: LineIndex) {
        self.raw = RawPosition::at(index);
        self.cache = None;
    }

    pub fn jump_to_end(&mut self) {
        self.raw = RawPosition::end();
        self.cache = None;
    }
}
