//! Pager modes and the key transition function.
//!
//! Every state the pager can be in is one [`PagerMode`] variant, and every
//! key press flows through [`handle_key`]: the current mode plus the event
//! decide the next mode, mutating the [`Pager`] on the way. Prompt state
//! (query buffers, goto digits) lives in the variant itself, so leaving a
//! mode drops its state with it.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use riffle_source::{LineIndex, LineNumber};

use crate::pager::Pager;

/// What the pager is currently doing with key input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerMode {
    /// Plain scrolling.
    Viewing,
    /// The last search scan ran out of lines. `origin` is where that scan
    /// started; repeating the search wraps around, bounded by it. `None`
    /// means the whole source is fair game on the wrap pass.
    NotFound { origin: Option<LineIndex> },
    /// Typing a search query.
    Search { query: String, backwards: bool },
    /// Typing a line number.
    GotoLine { digits: String },
    /// Typing a filter pattern.
    Filter { query: String },
    /// Waiting for the name of the mark to set.
    Mark,
    /// Waiting for the name of the mark to jump to.
    JumpToMark,
}

/// Advance the pager by one key event.
///
/// Key releases are ignored; terminals speaking the kitty keyboard
/// protocol report them, and acting on both edges would double every
/// action.
#[must_use]
pub fn handle_key(mode: PagerMode, event: KeyEvent, pager: &mut Pager) -> PagerMode {
    if event.kind == KeyEventKind::Release {
        return mode;
    }
    match mode {
        PagerMode::Viewing => viewing_key(event, pager),
        PagerMode::NotFound { origin } => not_found_key(event, pager, origin),
        PagerMode::Search { query, backwards } => search_key(event, pager, query, backwards),
        PagerMode::GotoLine { digits } => goto_key(event, pager, digits),
        PagerMode::Filter { query } => filter_key(event, pager, query),
        PagerMode::Mark => mark_key(event, pager),
        PagerMode::JumpToMark => jump_to_mark_key(event, pager),
    }
}

fn viewing_key(event: KeyEvent, pager: &mut Pager) -> PagerMode {
    match event.code {
        KeyCode::Up | KeyCode::Char('k') => pager.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => pager.scroll_down(1),
        KeyCode::Left | KeyCode::Char('h') => pager.scroll_left(),
        KeyCode::Right | KeyCode::Char('l') => pager.scroll_right(),
        KeyCode::PageUp | KeyCode::Char('b') => pager.page_up(),
        KeyCode::PageDown | KeyCode::Char(' ') => pager.page_down(),
        KeyCode::Home | KeyCode::Char('<') => pager.go_top(),
        KeyCode::End | KeyCode::Char('>') => pager.go_bottom(),
        KeyCode::Char('w') => pager.toggle_wrap(),
        KeyCode::Char('q') => pager.quit(),
        KeyCode::Char('/') => return PagerMode::Search { query: String::new(), backwards: false },
        KeyCode::Char('?') => return PagerMode::Search { query: String::new(), backwards: true },
        KeyCode::Char('n') => return pager.search_next(false),
        KeyCode::Char('N') => return pager.search_next(true),
        KeyCode::Char('g') => return PagerMode::GotoLine { digits: String::new() },
        KeyCode::Char('&') => return PagerMode::Filter { query: String::new() },
        KeyCode::Char('m') => return PagerMode::Mark,
        KeyCode::Char('\'') => return PagerMode::JumpToMark,
        _ => {}
    }
    PagerMode::Viewing
}

fn not_found_key(event: KeyEvent, pager: &mut Pager, origin: Option<LineIndex>) -> PagerMode {
    match event.code {
        KeyCode::Char('n') => pager.wrap_search(origin, false),
        KeyCode::Char('N') => pager.wrap_search(origin, true),
        // Anything else drops back to plain viewing behavior.
        _ => viewing_key(event, pager),
    }
}

fn search_key(event: KeyEvent, pager: &mut Pager, mut query: String, backwards: bool) -> PagerMode {
    match event.code {
        KeyCode::Enter => pager.execute_search(&query, backwards),
        KeyCode::Esc => PagerMode::Viewing,
        KeyCode::Backspace => {
            if query.pop().is_none() {
                return PagerMode::Viewing;
            }
            PagerMode::Search { query, backwards }
        }
        KeyCode::Char(ch) => {
            query.push(ch);
            PagerMode::Search { query, backwards }
        }
        _ => PagerMode::Search { query, backwards },
    }
}

fn goto_key(event: KeyEvent, pager: &mut Pager, mut digits: String) -> PagerMode {
    match event.code {
        KeyCode::Enter => {
            if let Ok(number) = digits.parse::<usize>()
                && number >= 1
            {
                pager.goto_line(LineNumber::from_one_based(number));
            }
            PagerMode::Viewing
        }
        KeyCode::Esc => PagerMode::Viewing,
        KeyCode::Backspace => {
            if digits.pop().is_none() {
                return PagerMode::Viewing;
            }
            PagerMode::GotoLine { digits }
        }
        KeyCode::Char(ch) if ch.is_ascii_digit() => {
            digits.push(ch);
            PagerMode::GotoLine { digits }
        }
        _ => PagerMode::GotoLine { digits },
    }
}

fn filter_key(event: KeyEvent, pager: &mut Pager, mut query: String) -> PagerMode {
    match event.code {
        // An empty query on Enter clears the active filter.
        KeyCode::Enter => {
            pager.apply_filter(&query);
            PagerMode::Viewing
        }
        KeyCode::Esc => PagerMode::Viewing,
        KeyCode::Backspace => {
            if query.pop().is_none() {
                return PagerMode::Viewing;
            }
            PagerMode::Filter { query }
        }
        KeyCode::Char(ch) => {
            query.push(ch);
            PagerMode::Filter { query }
        }
        _ => PagerMode::Filter { query },
    }
}

fn mark_key(event: KeyEvent, pager: &mut Pager) -> PagerMode {
    if let KeyCode::Char(name) = event.code {
        pager.set_mark(name);
    }
    PagerMode::Viewing
}

fn jump_to_mark_key(event: KeyEvent, pager: &mut Pager) -> PagerMode {
    if let KeyCode::Char(name) = event.code {
        pager.jump_to_mark(name);
    }
    PagerMode::Viewing
}
