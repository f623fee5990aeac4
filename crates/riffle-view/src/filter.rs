//! Filtering a line source down to matching lines.
//!
//! A [`FilteredSource`] wraps any [`LineSource`], owned or borrowed, and
//! exposes only the lines whose plain text matches a pattern, under fresh
//! contiguous indexes. Scrolling, search, and rendering all compose with it
//! unchanged because it is itself a [`LineSource`]. Call
//! [`FilteredSource::refresh`] after the underlying source grew; only the
//! new lines are scanned.

use std::sync::Arc;

use riffle_source::{Line, LineIndex, LineSource};

use crate::search::SearchPattern;

pub struct FilteredSource<S> {
    source: S,
    pattern: SearchPattern,
    matches: Vec<LineIndex>,
    scanned: usize,
}

impl<S: LineSource> FilteredSource<S> {
    #[must_use]
    pub fn new(source: S, pattern: SearchPattern) -> Self {
        let mut filtered = Self { source, pattern, matches: Vec::new(), scanned: 0 };
        filtered.refresh();
        filtered
    }

    /// Scan lines that arrived in the underlying source since the last
    /// refresh. Previously collected matches are never rescanned.
    pub fn refresh(&mut self) {
        let count = self.source.line_count();
        for index in self.scanned..count {
            if let Some(line) = self.source.line(LineIndex::new(index))
                && self.pattern.matches(line.plain())
            {
                self.matches.push(LineIndex::new(index));
            }
        }
        self.scanned = count;
    }

    #[must_use]
    pub fn pattern(&self) -> &SearchPattern {
        &self.pattern
    }

    /// The underlying source index of filtered line `index`.
    #[must_use]
    pub fn source_index(&self, index: LineIndex) -> Option<LineIndex> {
        self.matches.get(index.as_usize()).copied()
    }
}

impl<S: LineSource> LineSource for FilteredSource<S> {
    fn line_count(&self) -> usize {
        self.matches.len()
    }

    fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
        self.source.line(*self.matches.get(index.as_usize())?)
    }
}

impl<S> std::fmt::Debug for FilteredSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredSource")
            .field("matches", &self.matches.len())
            .field("scanned", &self.scanned)
            .finish_non_exhaustive()
    }
}
