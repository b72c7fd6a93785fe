//! Serial command-line editor and command parser.

use heapless::String;
use platform::config::COMMAND_LINE_BYTES;
use platform::{DisplayNotifier, KeyCode};

const BACKSPACE: u8 = 0x08;
const UNKNOWN_COMMAND: &str = "command not found";

const COMMANDS: [(&str, KeyCode); 7] = [
    ("stop", KeyCode::Stop),
    ("playpause", KeyCode::PlayPause),
    ("next", KeyCode::Next),
    ("prev", KeyCode::Prev),
    ("playinfo", KeyCode::PlayInfo),
    ("repeat", KeyCode::Repeat),
    ("help", KeyCode::Help),
];

/// Line buffer fed one received byte at a time.
///
/// Printable ASCII is appended while there is room, backspace deletes, and
/// CR, LF or NUL ends the line. Every byte echoes the line to the display.
#[derive(Debug, Default)]
pub struct CommandLine {
    line: String<COMMAND_LINE_BYTES>,
}

impl CommandLine {
    /// An empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text typed so far.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Feed one byte. Returns the command when a finished line names one.
    ///
    /// A finished line holding a single unknown word prints
    /// `command not found`; an empty line or several words are dropped
    /// quietly.
    pub fn feed(&mut self, byte: u8, display: &dyn DisplayNotifier) -> Option<KeyCode> {
        let finished = match byte {
            b' '..=b'~' => {
                if self.line.len() < COMMAND_LINE_BYTES.saturating_sub(1) {
                    let _ = self.line.push(char::from(byte));
                }
                false
            }
            b'\r' | b'\n' | 0 => true,
            BACKSPACE => {
                self.line.pop();
                false
            }
            _ => false,
        };
        display.input_string(&self.line, finished);
        if !finished {
            return None;
        }

        let key = match parse_word(&self.line) {
            Word::One(word) => {
                let key = lookup(word);
                if key.is_none() {
                    display.print_string(UNKNOWN_COMMAND);
                }
                key
            }
            Word::None | Word::Many => None,
        };
        self.line.clear();
        key
    }
}

enum Word<'l> {
    None,
    One(&'l str),
    Many,
}

fn parse_word(line: &str) -> Word<'_> {
    let mut words = line.split(' ').filter(|w| !w.is_empty());
    match (words.next(), words.next()) {
        (None, _) => Word::None,
        (Some(word), None) => Word::One(word),
        (Some(_), Some(_)) => Word::Many,
    }
}

fn lookup(word: &str) -> Option<KeyCode> {
    COMMANDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map(|&(_, key)| key)
}
