//! Man-page backspace formatting.
//!
//! nroff output marks emphasis by overstriking: `X BS X` for bold,
//! `_ BS X` for underline, `+ BS o` for a bullet. This module recognizes
//! those pairs and detects whole heading lines (every glyph bold, all caps)
//! so they can be painted in a dedicated heading style.

/// A recognized overstrike at the front of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overstrike {
    /// `c BS c`: the character in bold.
    Bold(char),
    /// `_ BS c`: the character underlined.
    Underline(char),
    /// `+ BS o` or the doubled `+ BS + BS o BS o`: a bullet glyph.
    Bullet,
}

/// Match an overstrike sequence at the start of `rest`.
///
/// Returns the recognized form and how many bytes it spans. `_ BS _` is
/// ambiguous; the same-character rule wins, so it renders bold.
pub(crate) fn overstrike(rest: &str) -> Option<(Overstrike, usize)> {
    // Check the bullet forms first: `+ BS +` would otherwise match as a
    // bold plus sign.
    for bullet in ["+\x08+\x08o\x08o", "+\x08o"] {
        if rest.starts_with(bullet) {
            return Some((Overstrike::Bullet, bullet.len()));
        }
    }
    let mut chars = rest.chars();
    let first = chars.next()?;
    if chars.next()? != '\x08' {
        return None;
    }
    let second = chars.next()?;
    let consumed = first.len_utf8() + 1 + second.len_utf8();
    if first == second {
        Some((Overstrike::Bold(second), consumed))
    } else if first == '_' {
        Some((Overstrike::Underline(second), consumed))
    } else {
        None
    }
}

/// One unit of a candidate heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeadingUnit {
    Space,
    Overstruck(char),
}

fn units(line: &str) -> impl Iterator<Item = Option<HeadingUnit>> + '_ {
    let mut chars = line.chars();
    let mut broken = false;
    std::iter::from_fn(move || {
        if broken {
            return None;
        }
        let c = chars.next()?;
        if c == ' ' {
            return Some(Some(HeadingUnit::Space));
        }
        if chars.next() == Some('\x08') && chars.next() == Some(c) {
            Some(Some(HeadingUnit::Overstruck(c)))
        } else {
            broken = true;
            Some(None)
        }
    })
}

/// Whether this raw line is a man-page heading.
///
/// A heading consists solely of spaces and same-character overstrikes, with
/// no lowercase letters and at least one uppercase one ("NAME", "SEE ALSO").
/// This is a dry run over the raw text; it allocates nothing, since it gets
/// called for every line of a document that might not be a man page at all.
pub(crate) fn is_heading(line: &str) -> bool {
    if !line.contains('\x08') {
        return false;
    }
    let mut saw_upper = false;
    for unit in units(line) {
        match unit {
            None => return false,
            Some(HeadingUnit::Space) => {}
            Some(HeadingUnit::Overstruck(c)) => {
                if c.is_lowercase() {
                    return false;
                }
                if c.is_uppercase() {
                    saw_upper = true;
                }
            }
        }
    }
    saw_upper
}

/// The units of a line already validated by [`is_heading`].
pub(crate) fn heading_units(line: &str) -> impl Iterator<Item = HeadingUnit> + '_ {
    units(line).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolded(text: &str) -> String {
        let mut out = String::new();
        for c in text.chars() {
            if c == ' ' {
                out.push(' ');
            } else {
                out.push(c);
                out.push('\x08');
                out.push(c);
            }
        }
        out
    }

    // --- Overstrike recognition ---

    #[test]
    fn same_char_is_bold() {
        assert_eq!(overstrike("X\x08Xrest"), Some((Overstrike::Bold('X'), 3)));
    }

    #[test]
    fn underscore_prefix_is_underline() {
        assert_eq!(overstrike("_\x08word"), Some((Overstrike::Underline('w'), 3)));
    }

    #[test]
    fn double_underscore_renders_bold() {
        assert_eq!(overstrike("_\x08_"), Some((Overstrike::Bold('_'), 3)));
    }

    #[test]
    fn simple_bullet() {
        assert_eq!(overstrike("+\x08o tail"), Some((Overstrike::Bullet, 3)));
    }

    #[test]
    fn doubled_bullet() {
        assert_eq!(overstrike("+\x08+\x08o\x08o tail"), Some((Overstrike::Bullet, 7)));
    }

    #[test]
    fn mismatched_pair_is_not_an_overstrike() {
        assert_eq!(overstrike("a\x08b"), None);
    }

    #[test]
    fn multibyte_bold_counts_bytes() {
        // 'é' is two bytes on either side of the backspace.
        assert_eq!(overstrike("é\x08é!"), Some((Overstrike::Bold('é'), 5)));
    }

    #[test]
    fn plain_text_is_not_an_overstrike() {
        assert_eq!(overstrike("abc"), None);
        assert_eq!(overstrike(""), None);
    }

    // --- Heading detection ---

    #[test]
    fn bold_caps_line_is_heading() {
        assert!(is_heading(&bolded("NAME")));
    }

    #[test]
    fn heading_may_contain_spaces() {
        assert!(is_heading(&bolded("SEE ALSO")));
    }

    #[test]
    fn digits_and_punctuation_are_allowed() {
        assert!(is_heading(&bolded("COMPATIBILITY 2.0")));
    }

    #[test]
    fn lowercase_disqualifies() {
        assert!(!is_heading(&bolded("Name")));
    }

    #[test]
    fn digits_only_is_not_a_heading() {
        assert!(!is_heading(&bolded("1.2.3")));
    }

    #[test]
    fn plain_caps_without_overstrike_is_not_a_heading() {
        assert!(!is_heading("NAME"));
    }

    #[test]
    fn partial_overstrike_disqualifies() {
        // "N\bNAME": only the first character is overstruck.
        assert!(!is_heading("N\x08NAME"));
    }

    #[test]
    fn empty_line_is_not_a_heading() {
        assert!(!is_heading(""));
    }

    #[test]
    fn heading_units_roundtrip() {
        let line = bolded("IO X");
        let text: String = heading_units(&line)
            .map(|u| match u {
                HeadingUnit::Space => ' ',
                HeadingUnit::Overstruck(c) => c,
            })
            .collect();
        assert_eq!(text, "IO X");
    }
}
