//! Text styles: attribute flags, the terminal color model, and downgrading.
//!
//! A [`Style`] is absolute, not a delta: it fully describes how a cell is
//! painted. The formatter's SGR machine mutates a working `Style` as escape
//! sequences arrive and stamps a copy onto every cell it emits.

use std::sync::Arc;

use bitflags::bitflags;

bitflags! {
    /// SGR text attribute flags.
    ///
    /// Maps directly to the ECMA-48 SGR parameter values the formatter
    /// recognizes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u8 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Color representation for styled cells.
///
/// Follows the standard terminal hierarchy: default → 16 named → 256
/// indexed → 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// Named color index (0–15): standard 8 + bright 8.
    Ansi(u8),
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

/// How much color the downstream terminal can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorDepth {
    /// No color output.
    Mono,
    /// Standard 16 ANSI colors.
    Ansi16,
    /// Extended 256-color palette.
    Ansi256,
    /// Full 24-bit RGB.
    TrueColor,
}

impl Color {
    /// Create a true-color RGB value.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(r, g, b)
    }

    /// Downgrade this color to fit the given depth.
    ///
    /// `Default` always survives unchanged; everything else walks down the
    /// hierarchy RGB → 256 → 16 → mono as needed.
    #[must_use]
    pub fn downgrade(self, depth: ColorDepth) -> Self {
        match depth {
            ColorDepth::TrueColor => self,
            ColorDepth::Ansi256 => match self {
                Self::Rgb(r, g, b) => Self::Indexed(rgb_to_256(r, g, b)),
                _ => self,
            },
            ColorDepth::Ansi16 => match self {
                Self::Rgb(r, g, b) => Self::Ansi(rgb_to_ansi16(r, g, b)),
                Self::Indexed(idx) => {
                    let (r, g, b) = ansi256_to_rgb(idx);
                    Self::Ansi(rgb_to_ansi16(r, g, b))
                }
                _ => self,
            },
            ColorDepth::Mono => Self::Default,
        }
    }
}

/// How a cell is painted: colors, attributes, and an optional hyperlink.
///
/// The hyperlink URI is shared (`Arc<str>`) because every cell inside an
/// OSC 8 span carries the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
    pub hyperlink: Option<Arc<str>>,
}

impl Style {
    /// The all-default style.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            flags: AttrFlags::empty(),
            hyperlink: None,
        }
    }

    /// Replace the foreground color.
    #[must_use]
    pub fn with_fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Replace the background color.
    #[must_use]
    pub fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Add attribute flags.
    #[must_use]
    pub fn with_attr(mut self, flags: AttrFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Remove attribute flags.
    #[must_use]
    pub fn without_attr(mut self, flags: AttrFlags) -> Self {
        self.flags -= flags;
        self
    }

    /// Replace the hyperlink target.
    #[must_use]
    pub fn with_hyperlink(mut self, uri: Option<Arc<str>>) -> Self {
        self.hyperlink = uri;
        self
    }

    /// Toggle INVERSE relative to this style.
    ///
    /// Used for search-match standout when no explicit standout style is
    /// configured: matches inside already-inverted text flip back.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.flags ^= AttrFlags::INVERSE;
        self
    }

    /// Downgrade both colors to the given depth.
    #[must_use]
    pub fn downgraded(mut self, depth: ColorDepth) -> Self {
        self.fg = self.fg.downgrade(depth);
        self.bg = self.bg.downgrade(depth);
        if depth == ColorDepth::Mono {
            // Keep only attributes a monochrome terminal can show.
            self.flags &= AttrFlags::BOLD | AttrFlags::UNDERLINE | AttrFlags::INVERSE;
        }
        self
    }
}

const ANSI16_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),       // Black
    (205, 0, 0),     // Red
    (0, 205, 0),     // Green
    (205, 205, 0),   // Yellow
    (0, 0, 238),     // Blue
    (205, 0, 205),   // Magenta
    (0, 205, 205),   // Cyan
    (229, 229, 229), // White
    (127, 127, 127), // Bright Black
    (255, 0, 0),     // Bright Red
    (0, 255, 0),     // Bright Green
    (255, 255, 0),   // Bright Yellow
    (92, 92, 255),   // Bright Blue
    (255, 0, 255),   // Bright Magenta
    (0, 255, 255),   // Bright Cyan
    (255, 255, 255), // Bright White
];

/// Convert an RGB color to the nearest ANSI 256-color index.
#[must_use]
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        let idx = ((r - 8) / 10).min(23);
        return 232 + idx;
    }
    16 + 36 * cube_index(r) + 6 * cube_index(g) + cube_index(b)
}

/// Map an 8-bit channel to the nearest 6×6×6 cube index.
///
/// Cube levels are `[0, 95, 135, 175, 215, 255]`; not uniformly spaced, so
/// the midpoints (48, 115, 155, 195, 235) decide the bins.
fn cube_index(v: u8) -> u8 {
    if v < 48 {
        0
    } else if v < 115 {
        1
    } else {
        (v - 35) / 40
    }
}

/// Convert a 256-color index to its RGB representation.
#[must_use]
pub fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    if index < 16 {
        return ANSI16_PALETTE[index as usize];
    }
    if index >= 232 {
        let gray = 8 + 10 * (index - 232);
        return (gray, gray, gray);
    }
    let idx = index - 16;
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    (
        LEVELS[(idx / 36) as usize],
        LEVELS[((idx / 6) % 6) as usize],
        LEVELS[(idx % 6) as usize],
    )
}

/// Convert an RGB color to the nearest ANSI 16-color index.
#[must_use]
pub fn rgb_to_ansi16(r: u8, g: u8, b: u8) -> u8 {
    let mut best = 0u8;
    let mut best_dist = u64::MAX;
    for (idx, &(pr, pg, pb)) in ANSI16_PALETTE.iter().enumerate() {
        let dist = weighted_distance((r, g, b), (pr, pg, pb));
        if dist < best_dist {
            best = idx as u8;
            best_dist = dist;
        }
    }
    best
}

// BT.709 channel weights, same as the luminance computation.
fn weighted_distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u64 {
    let dr = i32::from(a.0) - i32::from(b.0);
    let dg = i32::from(a.1) - i32::from(b.1);
    let db = i32::from(a.2) - i32::from(b.2);
    2126 * (dr * dr) as u64 + 7152 * (dg * dg) as u64 + 722 * (db * db) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Style building ---

    #[test]
    fn new_style_is_all_default() {
        let style = Style::new();
        assert_eq!(style.fg, Color::Default);
        assert_eq!(style.bg, Color::Default);
        assert!(style.flags.is_empty());
        assert!(style.hyperlink.is_none());
    }

    #[test]
    fn with_attr_accumulates() {
        let style = Style::new()
            .with_attr(AttrFlags::BOLD)
            .with_attr(AttrFlags::UNDERLINE);
        assert!(style.flags.contains(AttrFlags::BOLD | AttrFlags::UNDERLINE));
    }

    #[test]
    fn without_attr_removes_only_named_flags() {
        let style = Style::new()
            .with_attr(AttrFlags::BOLD | AttrFlags::ITALIC)
            .without_attr(AttrFlags::BOLD);
        assert!(!style.flags.contains(AttrFlags::BOLD));
        assert!(style.flags.contains(AttrFlags::ITALIC));
    }

    #[test]
    fn inverted_twice_is_identity() {
        let style = Style::new().with_fg(Color::Ansi(1));
        assert_eq!(style.clone().inverted().inverted(), style);
    }

    #[test]
    fn hyperlink_is_shared_not_copied() {
        let uri: Arc<str> = Arc::from("https://example.com/");
        let style = Style::new().with_hyperlink(Some(uri.clone()));
        let copy = style.clone();
        assert_eq!(copy.hyperlink, Some(uri.clone()));
        assert_eq!(Arc::strong_count(&uri), 3);
    }

    // --- Downgrading ---

    #[test]
    fn truecolor_passthrough() {
        let color = Color::rgb(12, 34, 56);
        assert_eq!(color.downgrade(ColorDepth::TrueColor), color);
    }

    #[test]
    fn default_survives_every_depth() {
        for depth in [
            ColorDepth::Mono,
            ColorDepth::Ansi16,
            ColorDepth::Ansi256,
            ColorDepth::TrueColor,
        ] {
            assert_eq!(Color::Default.downgrade(depth), Color::Default);
        }
    }

    #[test]
    fn rgb_downgrades_to_indexed() {
        let color = Color::rgb(255, 0, 0).downgrade(ColorDepth::Ansi256);
        assert!(matches!(color, Color::Indexed(_)));
    }

    #[test]
    fn indexed_downgrades_to_ansi16() {
        let color = Color::Indexed(196).downgrade(ColorDepth::Ansi16);
        // 196 is pure red in the 256 cube; nearest named color is a red.
        assert!(matches!(color, Color::Ansi(9) | Color::Ansi(1)));
    }

    #[test]
    fn mono_discards_color_but_keeps_bold() {
        let style = Style::new()
            .with_fg(Color::rgb(10, 200, 10))
            .with_attr(AttrFlags::BOLD | AttrFlags::ITALIC)
            .downgraded(ColorDepth::Mono);
        assert_eq!(style.fg, Color::Default);
        assert!(style.flags.contains(AttrFlags::BOLD));
        assert!(!style.flags.contains(AttrFlags::ITALIC));
    }

    // --- Palette mapping ---

    #[test]
    fn gray_maps_into_gray_ramp() {
        assert_eq!(rgb_to_256(128, 128, 128), 232 + 12);
    }

    #[test]
    fn near_black_gray_maps_to_cube_corner() {
        assert_eq!(rgb_to_256(3, 3, 3), 16);
    }

    #[test]
    fn near_white_gray_maps_to_cube_corner() {
        assert_eq!(rgb_to_256(250, 250, 250), 231);
    }

    #[test]
    fn cube_round_trip_is_stable() {
        for idx in 16u8..=231 {
            let (r, g, b) = ansi256_to_rgb(idx);
            assert_eq!(rgb_to_256(r, g, b), idx, "index {idx} did not round-trip");
        }
    }

    #[test]
    fn gray_ramp_round_trip_is_stable() {
        for idx in 232u8..=255 {
            let (r, g, b) = ansi256_to_rgb(idx);
            assert_eq!(rgb_to_256(r, g, b), idx, "gray {idx} did not round-trip");
        }
    }

    #[test]
    fn primary_colors_map_to_expected_ansi16() {
        assert_eq!(rgb_to_ansi16(0, 0, 0), 0);
        assert_eq!(rgb_to_ansi16(255, 255, 255), 15);
        assert_eq!(rgb_to_ansi16(255, 0, 0), 9);
    }
}
