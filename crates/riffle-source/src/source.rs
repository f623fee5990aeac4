//! The seam shared by scrolling, search, and filtering.

use std::sync::Arc;

use crate::index::LineIndex;
use crate::line::Line;

/// A read-only, concurrently growable sequence of lines.
///
/// Scroll canonicalization, search, and filtering all consume lines through
/// this trait, which is what lets a filtered view compose with the rest of
/// the pager unchanged. Implementations must tolerate any index: out of
/// bounds is `None`, never a panic. The `Sync` bound is load-bearing; search
/// shares one source across its scoped worker threads.
pub trait LineSource: Sync {
    /// Number of lines currently available. Grows while reading, and may
    /// change wholesale once if highlighting replaces the text.
    fn line_count(&self) -> usize;

    /// The line at `index`, or `None` when out of bounds.
    fn line(&self, index: LineIndex) -> Option<Arc<Line>>;

    fn is_empty(&self) -> bool {
        self.line_count() == 0
    }

    /// The last valid index, if any lines exist.
    fn last_index(&self) -> Option<LineIndex> {
        self.line_count().checked_sub(1).map(LineIndex::new)
    }
}

impl<S: LineSource + ?Sized> LineSource for &S {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
        (**self).line(index)
    }
}

impl<S: LineSource + Send + ?Sized> LineSource for Arc<S> {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
        (**self).line(index)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Fixed in-memory source for unit tests.
    pub(crate) struct StaticSource(pub Vec<Arc<Line>>);

    impl StaticSource {
        pub(crate) fn of(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| Arc::new(Line::new(*l))).collect())
        }
    }

    impl LineSource for StaticSource {
        fn line_count(&self) -> usize {
            self.0.len()
        }

        fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
            self.0.get(index.as_usize()).cloned()
        }
    }
}
