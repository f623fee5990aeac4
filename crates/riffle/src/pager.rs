//! The pager: one input source, its scroll state, and frame painting.
//!
//! A [`Pager`] ties a background [`Reader`] to a [`ScrollPosition`] and the
//! view layer. Key handling lives in [`crate::mode`]; this module owns the
//! operations those transitions call (scrolling, search execution, marks,
//! filtering) and [`Pager::draw`], which paints one frame onto anything
//! implementing [`Screen`].

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crossterm::event::KeyEvent;
use riffle_source::{LineIndex, LineNumber, LineSource, LineStore, Reader, ReaderOptions};
use riffle_text::{Cell, Style};
use riffle_view::{
    CanonicalContext, CanonicalPosition, FilteredSource, RenderedLine, ScrollPosition,
    SearchPattern, find_first_hit, is_visible, visible_lines,
};

use crate::config::PagerConfig;
use crate::mode::{PagerMode, handle_key};
use crate::screen::Screen;

/// The pattern being searched plus where a repeat continues from.
#[derive(Debug, Clone)]
struct ActiveSearch {
    pattern: SearchPattern,
    last_hit: Option<LineIndex>,
}

/// Interactive pager state for one input source.
#[derive(Debug)]
pub struct Pager {
    reader: Reader,
    config: PagerConfig,
    position: ScrollPosition,
    mode: PagerMode,
    left_column: usize,
    /// Stick to the end of growing input until the next scroll key.
    following: bool,
    search: Option<ActiveSearch>,
    filter: Option<FilteredSource<Arc<LineStore>>>,
    marks: HashMap<char, LineIndex>,
    /// Size reported by the screen on the last draw; key handling between
    /// frames works against this geometry.
    viewport: (usize, usize),
    quit: bool,
}

impl Pager {
    #[must_use]
    pub fn new(reader: Reader, config: PagerConfig) -> Pager {
        reader.store().set_pause_after_lines(config.pause_after_lines);
        Pager {
            reader,
            config,
            position: ScrollPosition::top(),
            mode: PagerMode::Viewing,
            left_column: 0,
            following: false,
            search: None,
            filter: None,
            marks: HashMap::new(),
            viewport: (80, 24),
            quit: false,
        }
    }

    /// Page a file, tailing it as it grows.
    pub fn open_file(path: impl AsRef<Path>, config: PagerConfig) -> io::Result<Pager> {
        let options = ReaderOptions {
            pause_after_lines: config.pause_after_lines,
            ..ReaderOptions::default()
        };
        let reader = Reader::from_file(path, options)?;
        Ok(Self::new(reader, config))
    }

    /// Page text that is already in memory.
    #[must_use]
    pub fn from_text(name: impl Into<String>, text: &str, config: PagerConfig) -> Pager {
        Self::new(Reader::from_text(name, text), config)
    }

    #[must_use]
    pub fn store(&self) -> &Arc<LineStore> {
        self.reader.store()
    }

    #[must_use]
    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> &PagerMode {
        &self.mode
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Feed one key event through the current mode.
    pub fn on_key(&mut self, event: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, PagerMode::Viewing);
        self.mode = handle_key(mode, event, self);
    }

    /// The source scrolling and search operate on: the filtered view while
    /// a filter is active, the store otherwise.
    fn effective<'a>(
        filter: &'a Option<FilteredSource<Arc<LineStore>>>,
        reader: &'a Reader,
    ) -> &'a dyn LineSource {
        match filter {
            Some(filtered) => filtered,
            None => reader.store().as_ref(),
        }
    }

    fn context(
        config: &PagerConfig,
        viewport: (usize, usize),
        source: &dyn LineSource,
    ) -> CanonicalContext {
        CanonicalContext {
            viewport_width: viewport.0,
            viewport_height: viewport.1,
            show_line_numbers: config.show_line_numbers,
            show_status_bar: config.show_status_bar,
            wrap: config.wrap,
            line_count: source.line_count(),
        }
    }

    fn canonical_top(&mut self) -> (CanonicalContext, CanonicalPosition) {
        let source = Self::effective(&self.filter, &self.reader);
        let ctx = Self::context(&self.config, self.viewport, source);
        let top = self.position.canonical(&ctx, source);
        (ctx, top)
    }

    // --- Scrolling ---

    pub(crate) fn scroll_up(&mut self, rows: usize) {
        self.following = false;
        // Relative moves start from the canonical position, not the raw
        // one; moving up from the end sentinel must start at the real
        // bottom.
        let _ = self.canonical_top();
        self.position.move_up(rows);
    }

    pub(crate) fn scroll_down(&mut self, rows: usize) {
        self.following = false;
        let _ = self.canonical_top();
        self.position.move_down(rows);
    }

    pub(crate) fn page_up(&mut self) {
        let (ctx, _) = self.canonical_top();
        self.following = false;
        self.position.move_up(page_step(&ctx));
    }

    pub(crate) fn page_down(&mut self) {
        let (ctx, _) = self.canonical_top();
        self.following = false;
        self.position.move_down(page_step(&ctx));
    }

    pub(crate) fn go_top(&mut self) {
        self.following = false;
        self.position = ScrollPosition::top();
    }

    /// Jump to the end and keep following growth until another scroll key.
    pub(crate) fn go_bottom(&mut self) {
        self.following = true;
        self.position.jump_to_end();
    }

    pub(crate) fn scroll_left(&mut self) {
        self.left_column = self.left_column.saturating_sub(self.config.horizontal_step);
    }

    pub(crate) fn scroll_right(&mut self) {
        if !self.config.wrap {
            self.left_column = self.left_column.saturating_add(self.config.horizontal_step);
        }
    }

    pub(crate) fn toggle_wrap(&mut self) {
        self.config.wrap = !self.config.wrap;
        self.left_column = 0;
    }

    pub(crate) fn goto_line(&mut self, number: LineNumber) {
        self.following = false;
        self.position.jump_to(number.as_index());
    }

    // --- Marks ---

    pub(crate) fn set_mark(&mut self, name: char) {
        let (_, top) = self.canonical_top();
        if let Some(line) = top.line {
            self.marks.insert(name, line);
        }
    }

    pub(crate) fn jump_to_mark(&mut self, name: char) {
        match self.marks.get(&name) {
            Some(line) => {
                self.following = false;
                self.position.jump_to(*line);
            }
            None => tracing::debug!(mark = %name, "no such mark"),
        }
    }

    pub(crate) fn quit(&mut self) {
        self.quit = true;
    }

    // --- Search ---

    /// Compile and run a fresh search from the top of the screen. An empty
    /// query cancels without touching the previous pattern.
    pub(crate) fn execute_search(&mut self, query: &str, backwards: bool) -> PagerMode {
        let Some(pattern) = SearchPattern::compile(query) else {
            return PagerMode::Viewing;
        };
        self.search = Some(ActiveSearch { pattern, last_hit: None });
        let (_, top) = self.canonical_top();
        let Some(start) = top.line else {
            return PagerMode::Viewing;
        };
        if self.try_hit(start, None, backwards) {
            PagerMode::Viewing
        } else {
            PagerMode::NotFound { origin: Some(start) }
        }
    }

    /// Repeat the active search from just past the last hit.
    pub(crate) fn search_next(&mut self, backwards: bool) -> PagerMode {
        let Some(last_hit) = self.search.as_ref().map(|search| search.last_hit) else {
            return PagerMode::Viewing;
        };
        let start = match last_hit {
            Some(hit) if backwards => match hit.as_usize().checked_sub(1) {
                Some(previous) => LineIndex::new(previous),
                // Already on the first line; only a wrap pass can move.
                None => return PagerMode::NotFound { origin: None },
            },
            Some(hit) => hit.non_wrapping_add(1),
            None => {
                let (_, top) = self.canonical_top();
                match top.line {
                    Some(line) => line,
                    None => return PagerMode::Viewing,
                }
            }
        };
        if self.try_hit(start, None, backwards) {
            PagerMode::Viewing
        } else {
            PagerMode::NotFound { origin: Some(start) }
        }
    }

    /// The second half of wrap-around: scan from the far boundary, bounded
    /// by the start of the scan that missed.
    pub(crate) fn wrap_search(&mut self, origin: Option<LineIndex>, backwards: bool) -> PagerMode {
        let count = Self::effective(&self.filter, &self.reader).line_count();
        if count == 0 {
            return PagerMode::NotFound { origin };
        }
        let start = if backwards { LineIndex::new(count - 1) } else { LineIndex::new(0) };
        if self.try_hit(start, origin, backwards) {
            PagerMode::Viewing
        } else {
            PagerMode::NotFound { origin }
        }
    }

    /// Run one scan and scroll to the hit; `true` when something matched.
    fn try_hit(&mut self, start: LineIndex, before: Option<LineIndex>, backwards: bool) -> bool {
        let Some(pattern) = self.search.as_ref().map(|search| search.pattern.clone()) else {
            return false;
        };
        let source = Self::effective(&self.filter, &self.reader);
        match find_first_hit(&pattern, source, start, before, backwards) {
            Some(hit) => {
                self.show_hit(hit);
                true
            }
            None => false,
        }
    }

    /// Remember the hit and scroll only when it is off screen.
    fn show_hit(&mut self, hit: LineIndex) {
        if let Some(search) = &mut self.search {
            search.last_hit = Some(hit);
        }
        let (ctx, top) = self.canonical_top();
        let target = CanonicalPosition { line: Some(hit), row: 0 };
        let source = Self::effective(&self.filter, &self.reader);
        if is_visible(target, top, &ctx, source) {
            return;
        }
        self.following = false;
        self.position.jump_to(hit);
        if self.config.scroll_off > 0 {
            self.position.move_up(self.config.scroll_off);
        }
    }

    // --- Filtering ---

    /// Install or clear the filtered view. The position resets on the way
    /// in and out; indexes name different lines across the switch.
    pub(crate) fn apply_filter(&mut self, query: &str) {
        self.filter = SearchPattern::compile(query)
            .map(|pattern| FilteredSource::new(Arc::clone(self.reader.store()), pattern));
        self.position = ScrollPosition::top();
        self.following = false;
        if let Some(search) = &mut self.search {
            search.last_hit = None;
        }
    }

    // --- Drawing ---

    /// Paint one frame: content rows, blank fill, then the status bar.
    pub fn draw(&mut self, screen: &mut dyn Screen) {
        let (width, height) = screen.size();
        self.viewport = (width, height);
        if width == 0 || height == 0 {
            return;
        }
        if let Some(filtered) = &mut self.filter {
            filtered.refresh();
        }
        if self.following {
            self.position.jump_to_end();
        }
        let (ctx, top) = self.canonical_top();
        let source = Self::effective(&self.filter, &self.reader);
        let matcher = self.search.as_ref().map(|search| search.pattern.as_regex());
        let rows = visible_lines(top, &ctx, source, &self.config.format, matcher, self.left_column);

        for (row, rendered) in rows.iter().enumerate() {
            let mut column = 0;
            for cell in &rendered.cells {
                let painted =
                    Cell::new(cell.ch, cell.style.clone().downgraded(self.config.color_depth));
                screen.set_cell(column, row, &painted);
                column += painted.width();
            }
            let trailer =
                Cell::new(' ', rendered.trailer.clone().downgraded(self.config.color_depth));
            while column < width {
                screen.set_cell(column, row, &trailer);
                column += 1;
            }
        }
        let blank = Cell::new(' ', Style::new());
        for row in rows.len()..ctx.content_rows() {
            for column in 0..width {
                screen.set_cell(column, row, &blank);
            }
        }

        if self.config.show_status_bar {
            self.draw_status(screen, &ctx, &rows);
        }
    }

    fn draw_status(&self, screen: &mut dyn Screen, ctx: &CanonicalContext, rows: &[RenderedLine]) {
        let row = ctx.viewport_height - 1;
        let text = self.status_text(rows);
        let style = Style::new().inverted().downgraded(self.config.color_depth);
        let mut column = 0;
        for ch in text.chars() {
            let cell = Cell::new(ch, style.clone());
            let width = cell.width();
            if column + width > ctx.viewport_width {
                break;
            }
            screen.set_cell(column, row, &cell);
            column += width;
        }
        let pad = Cell::new(' ', style);
        while column < ctx.viewport_width {
            screen.set_cell(column, row, &pad);
            column += 1;
        }
    }

    /// The status bar text: prompt modes win over the window summary.
    fn status_text(&self, rows: &[RenderedLine]) -> String {
        let store = self.reader.store();
        let name = store.name();
        match &self.mode {
            PagerMode::Search { query, backwards } => {
                return format!("{}{query}", if *backwards { '?' } else { '/' });
            }
            PagerMode::GotoLine { digits } => return format!("Go to line: {digits}"),
            PagerMode::Filter { query } => return format!("&{query}"),
            PagerMode::Mark => return "Set mark: ".to_owned(),
            PagerMode::JumpToMark => return "Jump to mark: ".to_owned(),
            PagerMode::NotFound { .. } => return format!("{name}: pattern not found"),
            PagerMode::Viewing => {}
        }
        match (&self.filter, rows.first(), rows.last()) {
            (None, Some(first), Some(last)) => {
                let wanted = last.index.as_usize() - first.index.as_usize() + 1;
                store.lines(first.index, wanted).status
            }
            (Some(filtered), Some(first), Some(last)) => format!(
                "{name}: {}-{}/{} filtered",
                first.index.number(),
                last.index.number(),
                filtered.line_count(),
            ),
            (Some(_), None, _) => format!("{name}: no matching lines"),
            _ => format!("{name}: <empty>"),
        }
    }
}

/// Rows one PageUp/PageDown moves: a screenful minus one line of overlap.
fn page_step(ctx: &CanonicalContext) -> usize {
    ctx.content_rows().saturating_sub(1).max(1)
}
