//! Background reading: stream in, lines out.
//!
//! A reader owns one input and feeds one [`LineStore`]. Raw bytes are
//! buffered and split on `\n`; a chunk ending mid-line leaves the partial
//! bytes buffered and flushes a display snapshot that is *replaced* once the
//! remainder arrives, so streaming and tailing never duplicate a line. After
//! EOF a configured [`Highlighter`] may substitute the whole text (small
//! inputs only), then regular files are tailed: poll the length every
//! second, reopen past the consumed bytes on growth.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::boundary::{FileOpener, Highlighter, SourceOpener, TailSource};
use crate::index::LineIndex;
use crate::store::{DEFAULT_PAUSE_AFTER_LINES, LineStore, split_into_lines};

const CHUNK_SIZE: usize = 64 * 1024;

/// Inputs above this size are never batch-highlighted.
const HIGHLIGHT_MAX_BYTES: u64 = 1024 * 1024;

const TAIL_POLL: Duration = Duration::from_secs(1);

/// Why reading an input failed. Cloneable so the store can hand it to every
/// caller of [`LineStore::wait`].
#[derive(Debug, Clone)]
pub struct ReaderError {
    name: String,
    source: Arc<io::Error>,
}

impl ReaderError {
    pub(crate) fn new(name: impl Into<String>, source: io::Error) -> Self {
        Self { name: name.into(), source: Arc::new(source) }
    }

    /// Display name of the input that failed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reading {}: {}", self.name, self.source)
    }
}

impl std::error::Error for ReaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Knobs for a new reader.
pub struct ReaderOptions {
    /// Backpressure ceiling; `usize::MAX` disables pausing.
    pub pause_after_lines: usize,
    /// Applied once after EOF for inputs at most 1 MiB.
    pub highlighter: Option<Box<dyn Highlighter>>,
    /// Follow regular files after EOF.
    pub tail: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            pause_after_lines: DEFAULT_PAUSE_AFTER_LINES,
            highlighter: None,
            tail: true,
        }
    }
}

impl std::fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("pause_after_lines", &self.pause_after_lines)
            .field("highlighter", &self.highlighter.is_some())
            .field("tail", &self.tail)
            .finish()
    }
}

/// Handle to a background reader and its store.
///
/// Dropping the reader stops background reading and tailing; the store and
/// its buffered lines stay usable through any surviving `Arc`.
#[derive(Debug)]
pub struct Reader {
    store: Arc<LineStore>,
}

impl Reader {
    /// Read from an already-open byte stream. No tailing.
    pub fn from_stream(
        name: impl Into<String>,
        stream: Box<dyn Read + Send>,
        options: ReaderOptions,
    ) -> Reader {
        Self::spawn(name.into(), stream, None, None, options)
    }

    /// Open and read a file, with tailing and the line-count pre-pass.
    pub fn from_file(path: impl AsRef<Path>, options: ReaderOptions) -> io::Result<Reader> {
        let name = path.as_ref().to_string_lossy().into_owned();
        Self::open(&name, &FileOpener, options)
    }

    /// Open `name` through an opener, which decides the effective display
    /// name and whether the input can be tailed.
    pub fn open(
        name: &str,
        opener: &dyn SourceOpener,
        options: ReaderOptions,
    ) -> io::Result<Reader> {
        let opened = opener.open(name)?;
        let tail = if options.tail { opened.tail } else { None };
        // Stat-able inputs get a second stream for the line-count pre-pass.
        // One-shot streams must not be opened twice, that would eat data.
        let prepass = if tail.is_some() {
            opener.open(name).ok().map(|second| second.stream)
        } else {
            None
        };
        Ok(Self::spawn(opened.effective_name, opened.stream, tail, prepass, options))
    }

    /// A store that is already fully read; for help screens and tests.
    pub fn from_text(name: impl Into<String>, text: &str) -> Reader {
        let store = Arc::new(LineStore::new(name, usize::MAX));
        for line in split_into_lines(text) {
            store.append_line(line);
        }
        store.add_bytes_read(text.len() as u64);
        if !text.is_empty() {
            store.mark_first_byte();
        }
        store.mark_done_reading();
        store.mark_done_highlighting();
        Reader { store }
    }

    /// The store this reader feeds.
    #[must_use]
    pub fn store(&self) -> &Arc<LineStore> {
        &self.store
    }

    /// Block until reading finished; first stream error if any.
    pub fn wait(&self) -> Result<(), ReaderError> {
        self.store.wait()
    }

    /// Ask the background threads to stop at the next chunk boundary.
    pub fn shutdown(&self) {
        self.store.request_stop();
    }

    fn spawn(
        name: String,
        stream: Box<dyn Read + Send>,
        tail: Option<Box<dyn TailSource>>,
        prepass: Option<Box<dyn Read + Send>>,
        options: ReaderOptions,
    ) -> Reader {
        let store = Arc::new(LineStore::new(name, options.pause_after_lines));
        if let Some(mut counter) = prepass {
            let store = Arc::clone(&store);
            thread::spawn(move || match count_lines(counter.as_mut()) {
                Ok(count) => store.reserve_lines(count),
                Err(error) => tracing::debug!(%error, "line-count pre-pass failed"),
            });
        }
        let pump_store = Arc::clone(&store);
        let highlighter = options.highlighter;
        thread::spawn(move || Pump::new(pump_store).run(stream, highlighter, tail));
        Reader { store }
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.store.request_stop();
    }
}

/// Mutable state of one read loop: the store plus the undelivered tail of
/// the last chunk.
struct Pump {
    store: Arc<LineStore>,
    partial: Vec<u8>,
    /// A snapshot of `partial` sits in the store as its last line and must
    /// be replaced, not appended to.
    shown_partial: bool,
    first_marked: bool,
}

impl Pump {
    fn new(store: Arc<LineStore>) -> Self {
        Self { store, partial: Vec::new(), shown_partial: false, first_marked: false }
    }

    fn run(
        mut self,
        mut stream: Box<dyn Read + Send>,
        highlighter: Option<Box<dyn Highlighter>>,
        tail: Option<Box<dyn TailSource>>,
    ) {
        if let Err(error) = self.pump(stream.as_mut()) {
            tracing::error!(name = self.store.name(), %error, "stream read failed");
            self.finish();
            self.store.set_error(ReaderError::new(self.store.name(), error));
            self.store.mark_done_reading();
            self.store.mark_done_highlighting();
            return;
        }
        drop(stream);
        if tail.is_some() {
            // The input may still grow; keep the raw partial buffered so a
            // continuation replaces the flushed fragment.
            self.flush_eof_keep();
        } else {
            self.finish();
        }
        self.store.mark_done_reading();
        self.apply_highlighting(highlighter);
        self.store.mark_done_highlighting();
        if let Some(tail) = tail {
            self.tail_loop(tail.as_ref());
        }
    }

    /// Read chunks until EOF, error, or stop.
    fn pump(&mut self, stream: &mut dyn Read) -> io::Result<()> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            self.store.pause_gate();
            if self.store.stopped() {
                return Ok(());
            }
            let n = match stream.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            };
            if !self.first_marked {
                self.first_marked = true;
                self.store.mark_first_byte();
            }
            self.store.add_bytes_read(n as u64);
            self.consume(&buf[..n]);
            self.flush_partial();
        }
    }

    /// Split a chunk on newlines; completed lines land in the store, the
    /// rest stays buffered as raw bytes.
    fn consume(&mut self, chunk: &[u8]) {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            let text = decode_line(&self.partial);
            self.partial.clear();
            if self.shown_partial {
                self.shown_partial = false;
                self.store.replace_last(text);
            } else {
                self.store.append_line(text);
            }
            rest = &rest[pos + 1..];
        }
        self.partial.extend_from_slice(rest);
    }

    /// Show what we have of an incomplete line. A chunk boundary can split a
    /// codepoint; the snapshot stops at the clean prefix and the raw bytes
    /// stay buffered for reassembly.
    fn flush_partial(&mut self) {
        if self.partial.is_empty() {
            return;
        }
        let text = partial_snapshot(&self.partial);
        if text.is_empty() && !self.shown_partial {
            return;
        }
        if self.shown_partial {
            self.store.replace_last(text);
        } else {
            self.shown_partial = true;
            self.store.append_line(text);
        }
    }

    /// Final flush at EOF: whatever is buffered is now a whole line.
    fn finish(&mut self) {
        if self.partial.is_empty() {
            return;
        }
        let text = decode_line(&self.partial);
        self.partial.clear();
        if self.shown_partial {
            self.shown_partial = false;
            self.store.replace_last(text);
        } else {
            self.store.append_line(text);
        }
    }

    /// EOF flush for a tailable input: display the full decode but keep the
    /// raw bytes and the replacement linkage alive.
    fn flush_eof_keep(&mut self) {
        if self.partial.is_empty() {
            return;
        }
        let text = decode_line(&self.partial);
        if self.shown_partial {
            self.store.replace_last(text);
        } else {
            self.shown_partial = true;
            self.store.append_line(text);
        }
    }

    fn apply_highlighting(&self, highlighter: Option<Box<dyn Highlighter>>) {
        let Some(highlighter) = highlighter else { return };
        let bytes = self.store.bytes_read();
        if bytes > HIGHLIGHT_MAX_BYTES {
            tracing::debug!(bytes, "input too large to highlight");
            return;
        }
        let window = self.store.lines(LineIndex::new(0), usize::MAX);
        let text = window
            .lines
            .iter()
            .map(|line| line.raw())
            .collect::<Vec<_>>()
            .join("\n");
        if let Some(replacement) = highlighter.highlight(&text) {
            if replacement.is_empty() && !text.is_empty() {
                tracing::debug!("highlighter returned empty text, keeping raw");
                return;
            }
            tracing::debug!(bytes, "replacing text with highlighted version");
            self.store.set_text(&replacement);
        }
    }

    /// Follow a grown input forever, until shrink, error, or stop.
    fn tail_loop(&mut self, tail: &dyn TailSource) {
        loop {
            if !self.store.sleep_unless_stopped(TAIL_POLL) {
                return;
            }
            let len = match tail.len() {
                Ok(len) => len,
                Err(error) => {
                    tracing::warn!(%error, "cannot stat input, tailing stopped");
                    return;
                }
            };
            let consumed = self.store.bytes_read();
            if len < consumed {
                tracing::warn!(len, consumed, "input shrank, tailing stopped");
                return;
            }
            if len == consumed {
                continue;
            }
            let mut stream = match tail.reopen_at(consumed) {
                Ok(stream) => stream,
                Err(error) => {
                    tracing::warn!(%error, "cannot reopen input, tailing stopped");
                    return;
                }
            };
            if let Err(error) = self.pump(stream.as_mut()) {
                tracing::warn!(%error, "tail read failed, tailing stopped");
                return;
            }
            // The partial stays buffered; the next growth may complete it.
        }
    }
}

/// Decode a complete line, dropping a Windows carriage return.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode an incomplete line for display. A trailing byte run that is merely
/// an unfinished codepoint is withheld rather than mangled; genuinely
/// invalid bytes show as replacement characters like anywhere else.
fn partial_snapshot(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(error) if error.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..error.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn count_lines(stream: &mut dyn Read) -> io::Result<usize> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut count = 0usize;
    let mut last = 0u8;
    let mut any = false;
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        any = true;
        count += buf[..n].iter().filter(|&&b| b == b'\n').count();
        last = buf[n - 1];
    }
    if any && last != b'\n' {
        count += 1;
    }
    Ok(count)
}
