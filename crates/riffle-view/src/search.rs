//! Pattern compilation and the parallel hit search.
//!
//! Queries follow smartcase: all-lowercase searches are case-insensitive,
//! anything with an uppercase letter is exact. A query that fails to
//! compile as a regex is retried as escaped literal text, so `a[` finds
//! `a[` instead of erroring.
//!
//! [`find_first_hit`] fans the scan range out over contiguous chunks, one
//! scoped worker each. Results are joined in launch order and the first
//! `Some` wins, which guarantees the hit nearest `start` in scan order is
//! returned, never merely the fastest worker's.

use std::num::NonZeroUsize;
use std::thread;

use regex::{Regex, RegexBuilder};
use riffle_source::{LineIndex, LineSource};

/// A compiled search query.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
}

impl SearchPattern {
    /// Compile a user-typed query. `None` for the empty query.
    #[must_use]
    pub fn compile(query: &str) -> Option<SearchPattern> {
        if query.is_empty() {
            return None;
        }
        let case_insensitive = !query.chars().any(char::is_uppercase);
        let build = |pattern: &str| {
            RegexBuilder::new(pattern).case_insensitive(case_insensitive).build()
        };
        let regex = match build(query) {
            Ok(regex) => regex,
            Err(error) => {
                tracing::debug!(query, %error, "query is not a regex, matching literally");
                build(&regex::escape(query)).ok()?
            }
        };
        Some(Self { regex })
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The compiled regex, for styling matched ranges.
    #[must_use]
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

/// Find the hit nearest `start` in scan order.
///
/// Forward scans cover `[start, before)` with `before` defaulting to the
/// line count; backward scans run from `start` down to just above `before`,
/// or through index 0 when `before` is `None`. Wrap-around is the caller's
/// job: retry once from the opposite boundary, bounded by the original
/// start.
#[must_use]
pub fn find_first_hit(
    pattern: &SearchPattern,
    source: &dyn LineSource,
    start: LineIndex,
    before: Option<LineIndex>,
    backwards: bool,
) -> Option<LineIndex> {
    let count = source.line_count();
    if count == 0 {
        return None;
    }
    // Forward from past the end scans nothing; that miss is what lets the
    // caller decide to wrap. Backward starts clamp onto the last line.
    let (start, total) = if backwards {
        let start = start.as_usize().min(count - 1);
        let total = match before {
            Some(bound) => start.saturating_sub(bound.as_usize()),
            None => start + 1,
        };
        (start, total)
    } else {
        let start = start.as_usize();
        let limit = before.map_or(count, |bound| bound.as_usize().min(count));
        (start, limit.saturating_sub(start))
    };
    if total == 0 {
        return None;
    }

    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get).min(total);
    let chunk = total.div_ceil(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .filter_map(|worker| {
                let first = worker * chunk;
                let len = chunk.min(total.saturating_sub(first));
                (len > 0).then(|| {
                    scope.spawn(move || scan_chunk(pattern, source, start, first, len, backwards))
                })
            })
            .collect();

        // Join in launch order; the chunk nearest `start` decides first.
        let mut hit = None;
        for handle in handles {
            let result = match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            if hit.is_none() {
                hit = result;
            }
        }
        hit
    })
}

fn scan_chunk(
    pattern: &SearchPattern,
    source: &dyn LineSource,
    start: usize,
    offset: usize,
    len: usize,
    backwards: bool,
) -> Option<LineIndex> {
    for step in offset..offset + len {
        let index = if backwards { start - step } else { start + step };
        if let Some(line) = source.line(LineIndex::new(index))
            && pattern.matches(line.plain())
        {
            return Some(LineIndex::new(index));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use riffle_source::Line;

    use super::*;

    struct TextSource(Vec<Arc<Line>>);

    impl TextSource {
        fn of(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| Arc::new(Line::new(*l))).collect())
        }
    }

    impl LineSource for TextSource {
        fn line_count(&self) -> usize {
            self.0.len()
        }

        fn line(&self, index: LineIndex) -> Option<Arc<Line>> {
            self.0.get(index.as_usize()).cloned()
        }
    }

    fn find(
        source: &TextSource,
        query: &str,
        start: usize,
        before: Option<usize>,
        backwards: bool,
    ) -> Option<usize> {
        let pattern = SearchPattern::compile(query).unwrap();
        find_first_hit(
            &pattern,
            source,
            LineIndex::new(start),
            before.map(LineIndex::new),
            backwards,
        )
        .map(|i| i.as_usize())
    }

    // --- Compilation policy ---

    #[test]
    fn empty_query_compiles_to_nothing() {
        assert!(SearchPattern::compile("").is_none());
    }

    #[test]
    fn lowercase_queries_ignore_case() {
        let pattern = SearchPattern::compile("error").unwrap();
        assert!(pattern.matches("ERROR: disk full"));
        assert!(pattern.matches("error"));
    }

    #[test]
    fn uppercase_in_the_query_means_exact_case() {
        let pattern = SearchPattern::compile("Error").unwrap();
        assert!(pattern.matches("Error: disk full"));
        assert!(!pattern.matches("error: disk full"));
    }

    #[test]
    fn regex_queries_stay_regexes() {
        let pattern = SearchPattern::compile("foo.*bar").unwrap();
        assert!(pattern.matches("foo something bar"));
    }

    #[test]
    fn broken_regex_falls_back_to_literal_text() {
        let pattern = SearchPattern::compile("values[").unwrap();
        assert!(pattern.matches("let x = values[0];"));
        assert!(!pattern.matches("values"));
    }

    // --- Range scanning ---

    #[test]
    fn forward_search_includes_the_start_line() {
        let source = TextSource::of(&["x", "needle", "x"]);
        assert_eq!(find(&source, "needle", 1, None, false), Some(1));
    }

    #[test]
    fn forward_search_respects_the_before_bound() {
        let source = TextSource::of(&["x", "x", "needle", "x"]);
        assert_eq!(find(&source, "needle", 0, Some(2), false), None);
        assert_eq!(find(&source, "needle", 0, Some(3), false), Some(2));
    }

    #[test]
    fn forward_search_returns_the_earliest_hit_not_the_fastest() {
        let mut lines = vec!["filler"; 4000];
        lines[10] = "needle";
        lines[3990] = "needle";
        let source = TextSource::of(&lines);
        for _ in 0..16 {
            assert_eq!(find(&source, "needle", 0, None, false), Some(10));
        }
    }

    #[test]
    fn backward_search_returns_the_nearest_hit_below() {
        let source = TextSource::of(&["a", "needle", "c", "needle", "e"]);
        assert_eq!(find(&source, "needle", 4, None, true), Some(3));
        assert_eq!(find(&source, "needle", 2, None, true), Some(1));
    }

    #[test]
    fn backward_search_excludes_the_before_bound() {
        let source = TextSource::of(&["a", "b", "needle", "d", "e", "f"]);
        assert_eq!(find(&source, "needle", 5, Some(2), true), None);
        assert_eq!(find(&source, "needle", 5, Some(1), true), Some(2));
    }

    #[test]
    fn start_past_the_end_finds_nothing_forward() {
        let source = TextSource::of(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(find(&source, "f", 6, None, false), None);
        assert_eq!(find(&source, "a", 5, None, false), None);
    }

    #[test]
    fn wrap_pass_finds_the_only_occurrence_without_phantoms() {
        // Lines a..f, viewing the bottom: the forward pass from past the
        // hit misses once, the wrap pass from the top lands on index 5.
        let source = TextSource::of(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(find(&source, "f", 6, None, false), None, "nothing after the hit");
        assert_eq!(find(&source, "f", 0, Some(6), false), Some(5), "wrap returns to it");
        assert_eq!(find(&source, "f", 0, Some(5), false), None, "tighter bound excludes it");
    }

    #[test]
    fn empty_source_finds_nothing() {
        let source = TextSource::of(&[]);
        assert_eq!(find(&source, "x", 0, None, false), None);
        assert_eq!(find(&source, "x", 0, None, true), None);
    }

    #[test]
    fn matching_runs_on_plain_text_not_raw_escapes() {
        let source = TextSource::of(&["\x1b[31mred alert\x1b[0m"]);
        assert_eq!(find(&source, "red alert", 0, None, false), Some(0));
        // The escape bytes themselves are not searchable text.
        assert_eq!(find(&source, "31mred", 0, None, false), None);
    }
}
