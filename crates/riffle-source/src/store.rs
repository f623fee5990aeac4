//! The line store: the single shared source of truth.
//!
//! One background reader thread appends; the UI thread and transient search
//! workers read. All shared state sits behind one mutex, acquired and
//! released per public call, never held across a caller-visible operation.
//! The condvar wakes whoever is blocked on state advancing: the pause gate,
//! [`LineStore::await_first_byte`], and [`LineStore::wait`].
//!
//! Backpressure: reading suspends once `pause_after` lines are buffered, so
//! a pathological input (`yes | riffle`) cannot eat unbounded memory while
//! nobody is looking at the tail. Requesting lines near the ceiling raises
//! it, keeping a lookahead margin ahead of the consumer. While paused and
//! not fully read, the line count is a lie waiting to happen, so
//! [`LineStore::should_show_line_count`] reports false.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::index::LineIndex;
use crate::line::Line;
use crate::reader::ReaderError;
use crate::source::LineSource;

/// Default line budget before the reader pauses.
pub const DEFAULT_PAUSE_AFTER_LINES: usize = 100_000;

/// Lookahead slack: requests within this margin of the ceiling raise it by
/// twice this much past the requested index.
const PAUSE_RAISE_MARGIN: usize = DEFAULT_PAUSE_AFTER_LINES / 2;

/// A window of lines returned by [`LineStore::lines`].
#[derive(Debug, Clone)]
pub struct Window {
    pub lines: Vec<Arc<Line>>,
    /// Index of `lines[0]`, after any end-anchoring shift.
    pub first_index: LineIndex,
    /// Status bar text for this window.
    pub status: String,
}

struct Shared {
    lines: Vec<Arc<Line>>,
    pause_after: usize,
    paused: bool,
    first_byte: bool,
    done_reading: bool,
    done_highlighting: bool,
    replaced: bool,
    stop: bool,
    error: Option<ReaderError>,
}

/// Growing array of input lines plus reader lifecycle state.
pub struct LineStore {
    name: String,
    shared: Mutex<Shared>,
    changed: Condvar,
    bytes_read: AtomicU64,
}

impl LineStore {
    pub(crate) fn new(name: impl Into<String>, pause_after: usize) -> Self {
        Self {
            name: name.into(),
            shared: Mutex::new(Shared {
                lines: Vec::new(),
                pause_after,
                paused: false,
                first_byte: false,
                done_reading: false,
                done_highlighting: false,
                replaced: false,
                stop: false,
                error: None,
            }),
            changed: Condvar::new(),
            bytes_read: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_on<'a>(&self, guard: MutexGuard<'a, Shared>) -> MutexGuard<'a, Shared> {
        self.changed.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Display name of the input.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total bytes consumed from the input so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Current number of available lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lock().lines.len()
    }

    /// The line at `index`, or `None` when out of bounds.
    ///
    /// Requests near the pause ceiling raise it; asking for a line is how
    /// the consumer signals it actually wants more of the input.
    #[must_use]
    pub fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
        let mut shared = self.lock();
        self.raise_pause_for(&mut shared, index.as_usize());
        shared.lines.get(index.as_usize()).cloned()
    }

    /// A best-effort window of `wanted` lines starting at `first`.
    ///
    /// A window that would run past the end is shifted backward so the count
    /// is still honored, unless fewer lines exist in total. This anchoring is
    /// what makes paging near the end and End itself behave without callers
    /// special-casing the tail.
    #[must_use]
    pub fn lines(&self, first: LineIndex, wanted: usize) -> Window {
        let mut shared = self.lock();
        let count = shared.lines.len();
        if count == 0 || wanted == 0 {
            return Window {
                lines: Vec::new(),
                first_index: LineIndex::new(0),
                status: format!("{}: <empty>", self.name),
            };
        }
        let first = first.as_usize().min(count.saturating_sub(wanted));
        let end = (first + wanted).min(count);
        self.raise_pause_for(&mut shared, end - 1);
        Window {
            lines: shared.lines[first..end].to_vec(),
            first_index: LineIndex::new(first),
            status: self.status_text(&shared, first, end - 1),
        }
    }

    /// Block until the first byte has been read, or EOF arrived with none.
    ///
    /// Avoids a flash of empty UI on slow-starting pipes.
    pub fn await_first_byte(&self) {
        let mut shared = self.lock();
        while !shared.first_byte && !shared.done_reading {
            shared = self.wait_on(shared);
        }
    }

    /// Set the backpressure ceiling. `usize::MAX` disables pausing.
    pub fn set_pause_after_lines(&self, limit: usize) {
        let mut shared = self.lock();
        shared.pause_after = limit;
        self.changed.notify_all();
    }

    /// False exactly while the reader is paused and the input is not fully
    /// read: the count would plateau at the ceiling and mislead.
    #[must_use]
    pub fn should_show_line_count(&self) -> bool {
        let shared = self.lock();
        !shared.paused || shared.done_reading
    }

    /// Whether reading and highlighting have both finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        let shared = self.lock();
        shared.done_reading && shared.done_highlighting
    }

    /// Block until reading and highlighting have both finished.
    pub fn await_done(&self) {
        let mut shared = self.lock();
        while !(shared.done_reading && shared.done_highlighting) {
            shared = self.wait_on(shared);
        }
    }

    /// Block until reading finished, then report the first error if any.
    ///
    /// The already-buffered lines stay usable even on error.
    pub fn wait(&self) -> Result<(), ReaderError> {
        let mut shared = self.lock();
        while !shared.done_reading {
            shared = self.wait_on(shared);
        }
        match &shared.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// The first read error, if one has occurred so far.
    #[must_use]
    pub fn error(&self) -> Option<ReaderError> {
        self.lock().error.clone()
    }

    fn status_text(&self, shared: &Shared, first: usize, last: usize) -> String {
        let count = shared.lines.len();
        let first = LineIndex::new(first).number();
        let last_number = LineIndex::new(last).number();
        if shared.paused && !shared.done_reading {
            format!("{}: {first}-{last_number}/…", self.name)
        } else {
            let percent = percent_through(last, count);
            let total = LineIndex::new(count - 1).number();
            format!("{}: {first}-{last_number}/{total} {percent}%", self.name)
        }
    }

    fn raise_pause_for(&self, shared: &mut Shared, index: usize) {
        if shared.pause_after == usize::MAX
            || index.saturating_add(PAUSE_RAISE_MARGIN) < shared.pause_after
        {
            return;
        }
        let raised = index.saturating_add(2 * PAUSE_RAISE_MARGIN);
        if raised > shared.pause_after {
            tracing::trace!(limit = raised, "raising pause ceiling for lookahead");
            shared.pause_after = raised;
            self.changed.notify_all();
        }
    }

    // ── Reader-side operations ──

    /// Block while the buffered line count sits at or above the ceiling.
    /// Only the initial read pauses; tailing appends are never gated.
    pub(crate) fn pause_gate(&self) {
        let mut shared = self.lock();
        while shared.lines.len() >= shared.pause_after && !shared.done_reading && !shared.stop {
            if !shared.paused {
                shared.paused = true;
                tracing::trace!(buffered = shared.lines.len(), "reader paused at line budget");
            }
            shared = self.wait_on(shared);
        }
        if shared.paused {
            shared.paused = false;
            tracing::trace!("reader resumed");
        }
    }

    /// Ask the feeding threads to wind down at their next checkpoint.
    pub(crate) fn request_stop(&self) {
        let mut shared = self.lock();
        shared.stop = true;
        self.changed.notify_all();
    }

    pub(crate) fn stopped(&self) -> bool {
        self.lock().stop
    }

    /// Sleep for `timeout`, waking early on stop. Returns false if stopped.
    pub(crate) fn sleep_unless_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut shared = self.lock();
        while !shared.stop {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _) = self
                .changed
                .wait_timeout(shared, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            shared = guard;
        }
        false
    }

    pub(crate) fn append_line(&self, text: String) {
        let mut shared = self.lock();
        shared.lines.push(Arc::new(Line::new(text)));
    }

    /// Replace the last stored line; used when a previously flushed partial
    /// line receives its continuation.
    ///
    /// # Panics
    ///
    /// Panics when no line exists; the caller only replaces what it flushed.
    pub(crate) fn replace_last(&self, text: String) {
        let mut shared = self.lock();
        assert!(!shared.lines.is_empty(), "no flushed line to replace");
        let last = shared.lines.len() - 1;
        shared.lines[last] = Arc::new(Line::new(text));
    }

    /// Atomically replace the whole text, once, after batch highlighting.
    ///
    /// # Panics
    ///
    /// Panics on a second replacement; the text generation resets exactly
    /// once per store.
    pub(crate) fn set_text(&self, text: &str) {
        let lines: Vec<Arc<Line>> = split_into_lines(text)
            .into_iter()
            .map(|line| Arc::new(Line::new(line)))
            .collect();
        let mut shared = self.lock();
        assert!(!shared.replaced, "store text already replaced once");
        shared.replaced = true;
        shared.lines = lines;
    }

    /// Reserve capacity from the line-count pre-pass. Skipped when lines
    /// already arrived; correctness never depends on this.
    pub(crate) fn reserve_lines(&self, count: usize) {
        let mut shared = self.lock();
        if shared.lines.is_empty() {
            shared.lines.reserve(count);
        }
    }

    pub(crate) fn add_bytes_read(&self, n: u64) {
        self.bytes_read.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn mark_first_byte(&self) {
        let mut shared = self.lock();
        shared.first_byte = true;
        self.changed.notify_all();
    }

    pub(crate) fn mark_done_reading(&self) {
        let mut shared = self.lock();
        shared.done_reading = true;
        shared.paused = false;
        self.changed.notify_all();
    }

    pub(crate) fn mark_done_highlighting(&self) {
        let mut shared = self.lock();
        shared.done_highlighting = true;
        self.changed.notify_all();
    }

    /// Record a stream error; the first one wins.
    pub(crate) fn set_error(&self, error: ReaderError) {
        let mut shared = self.lock();
        if shared.error.is_none() {
            shared.error = Some(error);
        }
    }
}

impl LineSource for LineStore {
    fn line_count(&self) -> usize {
        self.line_count()
    }

    fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
        self.line(index)
    }
}

impl std::fmt::Debug for LineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("LineStore")
            .field("name", &self.name)
            .field("lines", &shared.lines.len())
            .field("paused", &shared.paused)
            .field("done_reading", &shared.done_reading)
            .field("done_highlighting", &shared.done_highlighting)
            .finish_non_exhaustive()
    }
}

/// Split whole-text input the way the streaming reader would: on newlines,
/// dropping Windows carriage returns, with a final newline terminating the
/// last line rather than opening an empty one.
pub(crate) fn split_into_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
        .collect()
}

/// Percent of `count` lines covered once `last` is on screen.
///
/// Widened so `(last + 1) * 100` cannot wrap on 32-bit targets.
fn percent_through(last: usize, count: usize) -> usize {
    ((last as u128 + 1) * 100 / count as u128) as usize
}
