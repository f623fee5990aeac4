//! Seams between the reader and everything outside the process.
//!
//! Filesystem access, decompression, and syntax highlighting live behind
//! these traits so the reader loop stays testable against in-memory fakes.
//! Only a plain [`FileOpener`] ships here; openers that decompress or fetch
//! remote content implement the same trait elsewhere.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

/// A freshly opened input stream.
pub struct OpenedSource {
    /// The byte stream to read.
    pub stream: Box<dyn Read + Send>,
    /// Name to display; an opener may rewrite it (a decompressing opener
    /// would strip the `.gz` suffix).
    pub effective_name: String,
    /// Follow-mode support; `None` for pipes and other one-shot streams.
    pub tail: Option<Box<dyn TailSource>>,
}

impl std::fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSource")
            .field("effective_name", &self.effective_name)
            .field("tail", &self.tail.is_some())
            .finish_non_exhaustive()
    }
}

/// Opens a named input for reading.
pub trait SourceOpener {
    fn open(&self, name: &str) -> io::Result<OpenedSource>;
}

/// Follow-mode hooks for inputs that can grow after EOF.
pub trait TailSource: Send {
    /// Current total length in bytes.
    fn len(&self) -> io::Result<u64>;

    /// Reopen the input positioned at `offset`.
    fn reopen_at(&self, offset: u64) -> io::Result<Box<dyn Read + Send>>;
}

/// One-shot syntax highlighter applied after a small input is fully read.
pub trait Highlighter: Send {
    /// Highlighted replacement for `text`, or `None` to keep it as is.
    /// The size ceiling is the reader's job, not the highlighter's.
    fn highlight(&self, text: &str) -> Option<String>;
}

/// Plain filesystem opener: no decompression, tailing supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOpener;

impl SourceOpener for FileOpener {
    fn open(&self, name: &str) -> io::Result<OpenedSource> {
        let path = PathBuf::from(name);
        let file = File::open(&path)?;
        Ok(OpenedSource {
            stream: Box::new(file),
            effective_name: name.to_owned(),
            tail: Some(Box::new(FileTail { path })),
        })
    }
}

struct FileTail {
    path: PathBuf,
}

impl TailSource for FileTail {
    fn len(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    fn reopen_at(&self, offset: u64) -> io::Result<Box<dyn Read + Send>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        Ok(Box::new(file))
    }
}
