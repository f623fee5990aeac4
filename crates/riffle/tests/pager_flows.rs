//! End-to-end pager flows: keys in, painted frames out.

use std::io::Write;
use std::thread;
use std::time::Duration;

use riffle::{
    AttrFlags, Cell, KeyCode, KeyEvent, KeyModifiers, Pager, PagerConfig, PagerMode, Screen, Style,
};

/// Poll `condition` for a few seconds; tailing has no completion signal.
fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..800 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

/// In-memory cell grid standing in for a terminal.
struct GridScreen {
    width: usize,
    height: usize,
    cells: Vec<Vec<Cell>>,
}

impl GridScreen {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![Cell::new(' ', Style::new()); width]; height],
        }
    }

    /// Text of one row, trailing blanks stripped.
    fn row_text(&self, row: usize) -> String {
        let text: String = self.cells[row].iter().map(|cell| cell.ch).collect();
        text.trim_end().to_owned()
    }

    fn cell(&self, column: usize, row: usize) -> &Cell {
        &self.cells[row][column]
    }
}

impl Screen for GridScreen {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn set_cell(&mut self, column: usize, row: usize, cell: &Cell) {
        if column < self.width && row < self.height {
            self.cells[row][column] = cell.clone();
        }
    }
}

fn numbered_lines(count: usize) -> String {
    let mut text = String::new();
    for number in 1..=count {
        text.push_str(&format!("line {number}\n"));
    }
    text
}

fn press(pager: &mut Pager, code: KeyCode) {
    pager.on_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_chars(pager: &mut Pager, text: &str) {
    for ch in text.chars() {
        press(pager, KeyCode::Char(ch));
    }
}

#[test]
fn the_first_frame_shows_numbered_lines_and_a_status_bar() {
    let mut pager = Pager::from_text("test.txt", "alpha\nbeta\ngamma\n", PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);
    pager.draw(&mut screen);

    assert_eq!(screen.row_text(0), "1 alpha");
    assert_eq!(screen.row_text(1), "2 beta");
    assert_eq!(screen.row_text(2), "3 gamma");
    assert_eq!(screen.row_text(3), "", "rows past the content stay blank");
    assert_eq!(screen.row_text(9), "test.txt: 1-3/3 100%");
    assert!(
        screen.cell(0, 9).style.flags.contains(AttrFlags::INVERSE),
        "the status bar paints inverted"
    );
}

#[test]
fn typing_a_search_jumps_to_the_match() {
    let mut pager = Pager::from_text("test.txt", &numbered_lines(100), PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);
    pager.draw(&mut screen);

    press(&mut pager, KeyCode::Char('/'));
    type_chars(&mut pager, "line 50$");
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(9), "/line 50$", "the prompt echoes on the status bar");

    press(&mut pager, KeyCode::Enter);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), " 50 line 50");
    assert_eq!(*pager.mode(), PagerMode::Viewing);
}

#[test]
fn search_matches_paint_inverted() {
    let mut pager = Pager::from_text("test.txt", "hello world\n", PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);

    press(&mut pager, KeyCode::Char('/'));
    type_chars(&mut pager, "world");
    press(&mut pager, KeyCode::Enter);
    pager.draw(&mut screen);

    // "1 hello world": the number column is 2 wide, "world" starts at 8.
    assert_eq!(screen.row_text(0), "1 hello world");
    assert!(
        screen.cell(8, 0).style.flags.contains(AttrFlags::INVERSE),
        "matched text stands out"
    );
    assert!(
        !screen.cell(2, 0).style.flags.contains(AttrFlags::INVERSE),
        "unmatched text does not"
    );
}

#[test]
fn a_missed_search_wraps_back_to_the_single_occurrence() {
    let mut pager = Pager::from_text("test.txt", "a\nb\nc\nd\ne\nf\n", PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);

    press(&mut pager, KeyCode::Char('/'));
    type_chars(&mut pager, "f");
    press(&mut pager, KeyCode::Enter);
    assert_eq!(*pager.mode(), PagerMode::Viewing, "the first pass finds line f");

    press(&mut pager, KeyCode::Char('n'));
    assert!(
        matches!(pager.mode(), PagerMode::NotFound { .. }),
        "no second occurrence exists"
    );
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(9), "test.txt: pattern not found");

    press(&mut pager, KeyCode::Char('n'));
    assert_eq!(
        *pager.mode(),
        PagerMode::Viewing,
        "the wrap pass returns to the original occurrence"
    );
}

#[test]
fn goto_line_typed_in_lands_on_that_line() {
    let mut pager = Pager::from_text("test.txt", &numbered_lines(100), PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);

    press(&mut pager, KeyCode::Char('g'));
    type_chars(&mut pager, "42");
    press(&mut pager, KeyCode::Enter);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), " 42 line 42");
}

#[test]
fn filtering_shows_only_matching_lines_renumbered() {
    let text = "warn: disk\ninfo: boot\nwarn: net\ninfo: done\n";
    let mut pager = Pager::from_text("log", text, PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);

    press(&mut pager, KeyCode::Char('&'));
    type_chars(&mut pager, "warn");
    press(&mut pager, KeyCode::Enter);
    pager.draw(&mut screen);

    // The filtered view numbers its own sequence, not the source lines.
    assert_eq!(screen.row_text(0), "1 warn: disk");
    assert_eq!(screen.row_text(1), "2 warn: net");
    assert_eq!(screen.row_text(2), "");
    assert_eq!(screen.row_text(9), "log: 1-2/2 filtered");

    // An empty filter query clears the filter again.
    press(&mut pager, KeyCode::Char('&'));
    press(&mut pager, KeyCode::Enter);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(1), "2 info: boot");
}

#[test]
fn wrap_toggle_plus_horizontal_pan_slices_long_lines() {
    let text = "abcdefghijklmnopqrstuvwxyz0123456789\n";
    let mut pager = Pager::from_text("wide", text, PagerConfig::default());
    let mut screen = GridScreen::new(20, 10);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), "1 abcdefghijklmnopqr");
    // The number column stays blank on continuation rows.
    assert_eq!(screen.row_text(1), "  stuvwxyz0123456789");

    press(&mut pager, KeyCode::Char('w'));
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), "1 abcdefghijklmnopqr");
    assert_eq!(screen.row_text(1), "", "no wrap, the rest is cut off");

    press(&mut pager, KeyCode::Right);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), "1 qrstuvwxyz01234567");

    press(&mut pager, KeyCode::Left);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), "1 abcdefghijklmnopqr");
}

#[test]
fn marks_set_and_jump_by_keys() {
    let mut pager = Pager::from_text("test.txt", &numbered_lines(100), PagerConfig::default());
    let mut screen = GridScreen::new(40, 10);

    press(&mut pager, KeyCode::Char('g'));
    type_chars(&mut pager, "30");
    press(&mut pager, KeyCode::Enter);
    press(&mut pager, KeyCode::Char('m'));
    press(&mut pager, KeyCode::Char('a'));

    press(&mut pager, KeyCode::Home);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), "  1 line 1");

    press(&mut pager, KeyCode::Char('\''));
    press(&mut pager, KeyCode::Char('a'));
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(0), " 30 line 30");
}

#[test]
fn end_keeps_following_a_growing_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", numbered_lines(30)).unwrap();
    file.flush().unwrap();

    let mut pager = Pager::open_file(file.path(), PagerConfig::default()).unwrap();
    assert!(
        eventually(|| pager.store().line_count() == 30),
        "initial content never arrived"
    );

    let mut screen = GridScreen::new(40, 10);
    press(&mut pager, KeyCode::End);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(8), "30 line 30", "End shows the last line");

    file.write_all(b"line 31\nline 32\n").unwrap();
    file.flush().unwrap();
    assert!(
        eventually(|| {
            pager.draw(&mut screen);
            screen.row_text(8) == "32 line 32"
        }),
        "the view did not follow the appended lines"
    );

    // A scroll key stops following.
    press(&mut pager, KeyCode::Up);
    pager.draw(&mut screen);
    assert_eq!(screen.row_text(8), "31 line 31");
}

#[test]
fn q_asks_to_quit() {
    let mut pager = Pager::from_text("test.txt", "a\n", PagerConfig::default());
    assert!(!pager.should_quit());
    press(&mut pager, KeyCode::Char('q'));
    assert!(pager.should_quit());
}
