//! Line addressing.
//!
//! [`LineIndex`] is the zero-based position used for every lookup.
//! [`LineNumber`] is the one-based value shown to people, and exists so the
//! two cannot be mixed up: numbers are never used to index storage.
//! Arithmetic on both saturates instead of wrapping; walking off either end
//! of a document must clamp, not panic or wrap around.

use std::fmt;

/// Zero-based position in the line store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineIndex(usize);

impl LineIndex {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Add a signed delta, saturating at both `0` and `usize::MAX`.
    #[must_use]
    pub fn non_wrapping_add(self, delta: isize) -> Self {
        if delta >= 0 {
            Self(self.0.saturating_add(delta as usize))
        } else {
            Self(self.0.saturating_sub(delta.unsigned_abs()))
        }
    }

    /// The display number for this index.
    #[must_use]
    pub fn number(self) -> LineNumber {
        LineNumber::from_index(self)
    }
}

impl fmt::Display for LineIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-based line number, for rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineNumber(usize);

impl LineNumber {
    /// The first line.
    pub const ONE: Self = Self(1);

    #[must_use]
    pub fn from_index(index: LineIndex) -> Self {
        Self(index.as_usize().saturating_add(1))
    }

    /// Construct from a zero-based value.
    #[must_use]
    pub fn from_zero_based(value: usize) -> Self {
        Self(value.saturating_add(1))
    }

    /// Construct from a one-based value as typed by a user.
    ///
    /// # Panics
    ///
    /// Panics on zero; there is no line 0.
    #[must_use]
    pub fn from_one_based(value: usize) -> Self {
        assert!(value >= 1, "line numbers are one-based");
        Self(value)
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// The storage index this number names.
    #[must_use]
    pub fn as_index(self) -> LineIndex {
        LineIndex::new(self.0 - 1)
    }

    /// Add a signed delta, saturating at line 1 and `usize::MAX`.
    #[must_use]
    pub fn non_wrapping_add(self, delta: isize) -> Self {
        if delta >= 0 {
            Self(self.0.saturating_add(delta as usize))
        } else {
            Self(self.0.saturating_sub(delta.unsigned_abs()).max(1))
        }
    }
}

impl fmt::Display for LineNumber {
    /// Formats with thousands separators: line 1234567 renders as
    /// `1,234,567`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        f.write_str(&out)
    }
}
