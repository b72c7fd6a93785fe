//! Host terminal as the player's serial console.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use platform::ConsoleInput;

/// Console input from a script, then from stdin.
///
/// Script lines are typed one byte per poll, each followed by `\r` and a
/// pause of `gap` idle polls so the player can react in between.
#[derive(Default)]
pub struct SimConsole {
    script: VecDeque<Option<u8>>,
    stdin: Option<Receiver<u8>>,
}

impl SimConsole {
    /// A console with nothing to type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `commands` to be typed, pausing `gap` polls after each.
    pub fn with_script<'c>(mut self, commands: impl IntoIterator<Item = &'c str>, gap: usize) -> Self {
        for command in commands {
            self.script.extend(command.trim().bytes().map(Some));
            self.script.push_back(Some(b'\r'));
            self.script.extend(core::iter::repeat(None).take(gap));
        }
        self
    }

    /// Also read stdin, on a background thread.
    pub fn with_stdin(mut self) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for byte in io::stdin().lock().bytes() {
                let Ok(byte) = byte else {
                    break;
                };
                let byte = if byte == b'\n' { b'\r' } else { byte };
                if tx.send(byte).is_err() {
                    break;
                }
            }
        });
        self.stdin = Some(rx);
        self
    }

    /// Whether scripted input is still pending.
    pub fn script_pending(&self) -> bool {
        !self.script.is_empty()
    }
}

impl ConsoleInput for SimConsole {
    fn read_byte(&mut self) -> Option<u8> {
        if let Some(next) = self.script.pop_front() {
            return next;
        }
        self.stdin.as_ref().and_then(|rx| rx.try_recv().ok())
    }
}

/// Terminal output to stdout, flushed after every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTerminal;

impl core::fmt::Write for StdoutTerminal {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut out = io::stdout().lock();
        out.write_all(s.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|_| core::fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_types_each_command_then_pauses() {
        let mut console = SimConsole::new().with_script(["next", " stop "], 2);
        let typed: Vec<Option<u8>> = (0..16).map(|_| console.read_byte()).collect();
        let expected: Vec<Option<u8>> = b"next\r"
            .iter()
            .copied()
            .map(Some)
            .chain([None, None])
            .chain(b"stop\r".iter().copied().map(Some))
            .chain([None, None])
            .chain([None, None])
            .collect();
        assert_eq!(typed, expected);
        assert!(!console.script_pending());
    }
}
