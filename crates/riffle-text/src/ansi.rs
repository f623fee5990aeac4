//! ANSI escape tokenizer and SGR interpreter.
//!
//! Input is one already-decoded line, so this scanner works on `&str` slices
//! instead of a byte stream. It recognizes exactly what a pager needs:
//!
//! - SGR sequences (`CSI ... m`) with 8-bit and 24-bit color composites
//! - erase-to-end-of-line (`CSI K` / `CSI 0 K`), which becomes the trailer
//! - OSC 8 hyperlinks, terminated by BEL or ESC-backslash
//!
//! Everything else comes back as [`AnsiToken::Literal`]: the formatter renders
//! those characters as plain runes. A sequence is never half-consumed; the
//! scanner either takes a complete recognized sequence or hands the consumed
//! span back for literal rendering.

use crate::style::{AttrFlags, Color, Style};

/// One scanned token. Slices borrow from the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnsiToken<'a> {
    /// A run of text with no escape characters.
    Text(&'a str),
    /// A well-formed SGR sequence. `raw` is the full sequence including the
    /// leading ESC, kept for literal fallback when the parameters turn out
    /// malformed (for example a truncated `38;5` composite).
    Sgr { params: &'a str, raw: &'a str },
    /// `CSI K` with mode 0 or no mode: clear to end of line.
    EraseToEol,
    /// An OSC 8 hyperlink boundary. `None` ends the current link span.
    Hyperlink { uri: Option<&'a str> },
    /// A malformed or unrecognized escape sequence, to be rendered as-is.
    Literal(&'a str),
}

/// Iterator over the ANSI tokens of one line.
pub(crate) struct AnsiTokenizer<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> AnsiTokenizer<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn escape(&mut self) -> AnsiToken<'a> {
        let start = self.pos;
        match self.line.as_bytes().get(start + 1) {
            Some(b'[') => self.csi(start),
            Some(b']') => self.osc(start),
            Some(_) => {
                // ESC plus one unknown character.
                let tail = &self.line[start + 1..];
                let ch_len = tail.chars().next().map_or(0, char::len_utf8);
                self.pos = start + 1 + ch_len;
                AnsiToken::Literal(&self.line[start..self.pos])
            }
            None => {
                // Bare ESC at end of line.
                self.pos = self.line.len();
                AnsiToken::Literal(&self.line[start..])
            }
        }
    }

    fn csi(&mut self, start: usize) -> AnsiToken<'a> {
        let bytes = self.line.as_bytes();
        let mut i = start + 2;
        // Parameter bytes, then intermediate bytes, then one final byte
        // (ECMA-48 5.4).
        while i < bytes.len() && (0x30..=0x3F).contains(&bytes[i]) {
            i += 1;
        }
        let params_end = i;
        while i < bytes.len() && (0x20..=0x2F).contains(&bytes[i]) {
            i += 1;
        }
        let Some(&final_byte) = bytes.get(i) else {
            self.pos = self.line.len();
            return AnsiToken::Literal(&self.line[start..]);
        };
        if !(0x40..=0x7E).contains(&final_byte) {
            // Sequence broken by a stray byte; resume scanning at it.
            self.pos = i;
            return AnsiToken::Literal(&self.line[start..i]);
        }
        self.pos = i + 1;
        let raw = &self.line[start..self.pos];
        let params = &self.line[start + 2..params_end];
        let plain_params = params_end == i && params.bytes().all(|b| b.is_ascii_digit() || b == b';');
        match final_byte {
            b'm' if plain_params => AnsiToken::Sgr { params, raw },
            b'K' if plain_params && (params.is_empty() || params == "0") => AnsiToken::EraseToEol,
            _ => AnsiToken::Literal(raw),
        }
    }

    fn osc(&mut self, start: usize) -> AnsiToken<'a> {
        let bytes = self.line.as_bytes();
        let mut i = start + 2;
        loop {
            match bytes.get(i) {
                None => {
                    // Unterminated on this line.
                    self.pos = self.line.len();
                    return AnsiToken::Literal(&self.line[start..]);
                }
                Some(0x07) => {
                    let body = &self.line[start + 2..i];
                    self.pos = i + 1;
                    return self.osc_body(body, start);
                }
                Some(0x1b) => {
                    if bytes.get(i + 1) == Some(&b'\\') {
                        let body = &self.line[start + 2..i];
                        self.pos = i + 2;
                        return self.osc_body(body, start);
                    }
                    // ESC aborts the OSC; rescan from it.
                    self.pos = i;
                    return AnsiToken::Literal(&self.line[start..i]);
                }
                Some(_) => i += 1,
            }
        }
    }

    fn osc_body(&self, body: &'a str, start: usize) -> AnsiToken<'a> {
        // Only OSC 8 (hyperlink) is meaningful inside line content:
        // `8 ; params ; uri`. The params field (id=...) is ignored.
        if let Some(rest) = body.strip_prefix("8;")
            && let Some((_params, uri)) = rest.split_once(';')
        {
            let uri = if uri.is_empty() { None } else { Some(uri) };
            return AnsiToken::Hyperlink { uri };
        }
        AnsiToken::Literal(&self.line[start..self.pos])
    }
}

impl<'a> Iterator for AnsiTokenizer<'a> {
    type Item = AnsiToken<'a>;

    fn next(&mut self) -> Option<AnsiToken<'a>> {
        if self.pos >= self.line.len() {
            return None;
        }
        let rest = &self.line[self.pos..];
        match rest.find('\x1b') {
            Some(0) => Some(self.escape()),
            Some(offset) => {
                self.pos += offset;
                Some(AnsiToken::Text(&rest[..offset]))
            }
            None => {
                self.pos = self.line.len();
                Some(AnsiToken::Text(rest))
            }
        }
    }
}

/// Apply one SGR parameter list to `current`.
///
/// `base` is what SGR 0 and the default-color codes (39/49) reset to; a pager
/// may run with a non-default plain style. Returns `None` when the parameters
/// are malformed (truncated or unparseable color composite, oversized number),
/// in which case the caller renders the raw sequence literally. Unknown but
/// well-formed parameter values are consumed with a debug log, matching how
/// terminals skip SGR codes they do not implement.
///
/// SGR 0 keeps the active hyperlink: OSC 8 spans are terminated only by an
/// empty-URI OSC 8.
pub(crate) fn apply_sgr(current: &Style, base: &Style, params: &str) -> Option<Style> {
    let mut style = current.clone();
    let mut parts = params.split(';');
    while let Some(part) = parts.next() {
        let code: u16 = if part.is_empty() { 0 } else { part.parse().ok()? };
        match code {
            0 => {
                let hyperlink = style.hyperlink.take();
                style = base.clone();
                style.hyperlink = hyperlink;
            }
            1 => style.flags |= AttrFlags::BOLD,
            2 => style.flags |= AttrFlags::DIM,
            3 => style.flags |= AttrFlags::ITALIC,
            4 => style.flags |= AttrFlags::UNDERLINE,
            5 | 6 => style.flags |= AttrFlags::BLINK,
            7 => style.flags |= AttrFlags::INVERSE,
            8 => style.flags |= AttrFlags::HIDDEN,
            9 => style.flags |= AttrFlags::STRIKETHROUGH,
            22 => style.flags -= AttrFlags::BOLD | AttrFlags::DIM,
            23 => style.flags -= AttrFlags::ITALIC,
            24 => style.flags -= AttrFlags::UNDERLINE,
            25 => style.flags -= AttrFlags::BLINK,
            27 => style.flags -= AttrFlags::INVERSE,
            28 => style.flags -= AttrFlags::HIDDEN,
            29 => style.flags -= AttrFlags::STRIKETHROUGH,
            30..=37 => style.fg = Color::Ansi((code - 30) as u8),
            38 => style.fg = extended_color(&mut parts)?,
            39 => style.fg = base.fg,
            40..=47 => style.bg = Color::Ansi((code - 40) as u8),
            48 => style.bg = extended_color(&mut parts)?,
            49 => style.bg = base.bg,
            58 => {
                // Underline color: parsed to keep the parameter stream
                // aligned, but not tracked.
                extended_color(&mut parts)?;
            }
            59 => {}
            90..=97 => style.fg = Color::Ansi((code - 90 + 8) as u8),
            100..=107 => style.bg = Color::Ansi((code - 100 + 8) as u8),
            other => {
                tracing::debug!(code = other, "skipping unsupported SGR parameter");
            }
        }
    }
    Some(style)
}

/// Parse the tail of a `38`/`48`/`58` composite: `5;N` or `2;R;G;B`.
fn extended_color<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<Color> {
    match parts.next()? {
        "5" => {
            let index: u8 = parts.next()?.parse().ok()?;
            Some(Color::Indexed(index))
        }
        "2" => {
            let r: u8 = parts.next()?.parse().ok()?;
            let g: u8 = parts.next()?.parse().ok()?;
            let b: u8 = parts.next()?.parse().ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<AnsiToken<'_>> {
        AnsiTokenizer::new(line).collect()
    }

    // --- Tokenizer ---

    #[test]
    fn plain_text_is_one_token() {
        assert_eq!(tokens("hello"), vec![AnsiToken::Text("hello")]);
    }

    #[test]
    fn sgr_splits_surrounding_text() {
        assert_eq!(
            tokens("a\x1b[31mb"),
            vec![
                AnsiToken::Text("a"),
                AnsiToken::Sgr { params: "31", raw: "\x1b[31m" },
                AnsiToken::Text("b"),
            ]
        );
    }

    #[test]
    fn empty_sgr_params() {
        assert_eq!(
            tokens("\x1b[m"),
            vec![AnsiToken::Sgr { params: "", raw: "\x1b[m" }]
        );
    }

    #[test]
    fn erase_to_eol_with_and_without_mode() {
        assert_eq!(tokens("\x1b[K"), vec![AnsiToken::EraseToEol]);
        assert_eq!(tokens("\x1b[0K"), vec![AnsiToken::EraseToEol]);
    }

    #[test]
    fn erase_other_modes_are_literal() {
        assert_eq!(tokens("\x1b[2K"), vec![AnsiToken::Literal("\x1b[2K")]);
    }

    #[test]
    fn cursor_movement_is_literal() {
        assert_eq!(tokens("\x1b[2A"), vec![AnsiToken::Literal("\x1b[2A")]);
    }

    #[test]
    fn dec_private_mode_is_literal() {
        assert_eq!(tokens("\x1b[?25h"), vec![AnsiToken::Literal("\x1b[?25h")]);
    }

    #[test]
    fn truncated_csi_is_literal() {
        assert_eq!(tokens("x\x1b[31"), vec![
            AnsiToken::Text("x"),
            AnsiToken::Literal("\x1b[31"),
        ]);
    }

    #[test]
    fn bare_esc_at_end_is_literal() {
        assert_eq!(tokens("x\x1b"), vec![
            AnsiToken::Text("x"),
            AnsiToken::Literal("\x1b"),
        ]);
    }

    #[test]
    fn esc_inside_csi_restarts_scan() {
        assert_eq!(
            tokens("\x1b[3\x1b[31mx"),
            vec![
                AnsiToken::Literal("\x1b[3"),
                AnsiToken::Sgr { params: "31", raw: "\x1b[31m" },
                AnsiToken::Text("x"),
            ]
        );
    }

    #[test]
    fn colon_composites_are_literal() {
        // Only the semicolon form is supported.
        assert_eq!(
            tokens("\x1b[38:5:196m"),
            vec![AnsiToken::Literal("\x1b[38:5:196m")]
        );
    }

    #[test]
    fn hyperlink_bel_terminated() {
        assert_eq!(
            tokens("\x1b]8;;https://example.com\x07text"),
            vec![
                AnsiToken::Hyperlink { uri: Some("https://example.com") },
                AnsiToken::Text("text"),
            ]
        );
    }

    #[test]
    fn hyperlink_st_terminated_and_closed() {
        assert_eq!(
            tokens("\x1b]8;;http://x\x1b\\link\x1b]8;;\x1b\\"),
            vec![
                AnsiToken::Hyperlink { uri: Some("http://x") },
                AnsiToken::Text("link"),
                AnsiToken::Hyperlink { uri: None },
            ]
        );
    }

    #[test]
    fn hyperlink_uri_keeps_embedded_semicolons() {
        assert_eq!(
            tokens("\x1b]8;id=1;http://x/a;b\x07"),
            vec![AnsiToken::Hyperlink { uri: Some("http://x/a;b") }]
        );
    }

    #[test]
    fn unterminated_osc_is_literal() {
        assert_eq!(
            tokens("\x1b]8;;http://x no terminator"),
            vec![AnsiToken::Literal("\x1b]8;;http://x no terminator")]
        );
    }

    #[test]
    fn non_hyperlink_osc_is_literal() {
        assert_eq!(
            tokens("\x1b]0;title\x07"),
            vec![AnsiToken::Literal("\x1b]0;title\x07")]
        );
    }

    #[test]
    fn multibyte_text_around_sequences() {
        assert_eq!(
            tokens("å\x1b[1mé"),
            vec![
                AnsiToken::Text("å"),
                AnsiToken::Sgr { params: "1", raw: "\x1b[1m" },
                AnsiToken::Text("é"),
            ]
        );
    }

    // --- SGR application ---

    fn applied(params: &str) -> Style {
        apply_sgr(&Style::new(), &Style::new(), params).unwrap()
    }

    #[test]
    fn basic_colors() {
        assert_eq!(applied("31").fg, Color::Ansi(1));
        assert_eq!(applied("44").bg, Color::Ansi(4));
        assert_eq!(applied("96").fg, Color::Ansi(14));
        assert_eq!(applied("103").bg, Color::Ansi(11));
    }

    #[test]
    fn attributes_set_and_clear() {
        let style = applied("1;4");
        assert!(style.flags.contains(AttrFlags::BOLD | AttrFlags::UNDERLINE));
        let cleared = apply_sgr(&style, &Style::new(), "22;24").unwrap();
        assert!(cleared.flags.is_empty());
    }

    #[test]
    fn composite_256() {
        assert_eq!(applied("38;5;196").fg, Color::Indexed(196));
        assert_eq!(applied("48;5;17").bg, Color::Indexed(17));
    }

    #[test]
    fn composite_rgb() {
        assert_eq!(applied("38;2;1;2;3").fg, Color::Rgb(1, 2, 3));
        assert_eq!(applied("48;2;250;251;252").bg, Color::Rgb(250, 251, 252));
    }

    #[test]
    fn underline_color_consumed_without_effect() {
        let style = applied("58;5;10;31");
        // The 31 after the composite must still land.
        assert_eq!(style.fg, Color::Ansi(1));
    }

    #[test]
    fn truncated_composite_is_malformed() {
        assert!(apply_sgr(&Style::new(), &Style::new(), "38;5").is_none());
        assert!(apply_sgr(&Style::new(), &Style::new(), "38;2;1;2").is_none());
        assert!(apply_sgr(&Style::new(), &Style::new(), "38;9;1").is_none());
    }

    #[test]
    fn out_of_range_component_is_malformed() {
        assert!(apply_sgr(&Style::new(), &Style::new(), "38;5;256").is_none());
    }

    #[test]
    fn reset_restores_base_not_default() {
        let base = Style::new().with_fg(Color::Ansi(7));
        let current = Style::new().with_fg(Color::Ansi(1)).with_attr(AttrFlags::BOLD);
        let reset = apply_sgr(&current, &base, "0").unwrap();
        assert_eq!(reset, base);
    }

    #[test]
    fn empty_param_means_reset() {
        let current = Style::new().with_attr(AttrFlags::BOLD);
        let reset = apply_sgr(&current, &Style::new(), "").unwrap();
        assert!(reset.flags.is_empty());
    }

    #[test]
    fn default_color_codes_restore_base_colors() {
        let base = Style::new().with_fg(Color::Ansi(2)).with_bg(Color::Ansi(0));
        let current = Style::new().with_fg(Color::Rgb(1, 2, 3)).with_bg(Color::Rgb(4, 5, 6));
        let style = apply_sgr(&current, &base, "39;49").unwrap();
        assert_eq!(style.fg, base.fg);
        assert_eq!(style.bg, base.bg);
    }

    #[test]
    fn reset_keeps_hyperlink_span() {
        let current = Style::new()
            .with_attr(AttrFlags::BOLD)
            .with_hyperlink(Some("http://x".into()));
        let reset = apply_sgr(&current, &Style::new(), "0").unwrap();
        assert!(reset.flags.is_empty());
        assert_eq!(reset.hyperlink.as_deref(), Some("http://x"));
    }

    #[test]
    fn unknown_code_is_skipped() {
        let style = applied("73;31");
        assert_eq!(style.fg, Color::Ansi(1));
    }
}
