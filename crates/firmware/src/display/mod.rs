//! Display actor for the Rivulet player.
//!
//! Other actors never draw anything themselves. They call the
//! [`DisplayNotifier`] methods of a [`DisplayOutbox`], which turns each call
//! into a [`DisplayMsg`] for the display actor's mailbox and drops it when
//! the mailbox is full. The actor keeps the latest value of everything it
//! was told and redraws from that, so a dropped update only delays the
//! screen.
//!
//! [`TerminalDisplay`] renders to a VT100 serial terminal.

pub mod terminal;

pub use terminal::TerminalDisplay;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use platform::config::{COMMAND_LINE_BYTES, DISPLAY_TEXT_BYTES};
use platform::{DisplayNotifier, PlayStatus};
use playback::{post, Mailbox};

/// Status text as carried in display mail; longer text is cut short.
pub type DisplayText = String<DISPLAY_TEXT_BYTES>;

/// Command-line echo as carried in display mail.
pub type InputText = String<COMMAND_LINE_BYTES>;

/// Mail for the display actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMsg {
    /// Play position changed.
    PlayTime {
        /// Status shown.
        status: PlayStatus,
        /// 1-based track number, 0 when out of range.
        track_no: u32,
        /// Seconds played.
        play_secs: u32,
        /// Track length in seconds.
        total_secs: u32,
    },
    /// Format of the opened track.
    PlayInfo {
        /// 1-based track number, 0 when out of range.
        track_no: u32,
        /// Source sample rate.
        sample_rate_hz: u32,
        /// Source channel count.
        channels: u8,
    },
    /// Repeat mode changed.
    PlayMode(bool),
    /// Name of the track about to play.
    FileName(DisplayText),
    /// Free-text status line.
    Print(DisplayText),
    /// Command-line echo.
    Input {
        /// Line typed so far.
        text: InputText,
        /// Enter was pressed.
        finished: bool,
    },
    /// Show the command help.
    Help,
}

impl DisplayMsg {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayTime { .. } => "play-time",
            Self::PlayInfo { .. } => "play-info",
            Self::PlayMode(_) => "play-mode",
            Self::FileName(_) => "file-name",
            Self::Print(_) => "print",
            Self::Input { .. } => "input",
            Self::Help => "help",
        }
    }
}

/// Copy as much of `text` as fits, ending on a character boundary.
///
/// One byte of capacity is kept free, matching the terminal line buffer.
pub fn clipped<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    let limit = N.saturating_sub(1);
    for c in text.chars() {
        if out.len().saturating_add(c.len_utf8()) > limit || out.push(c).is_err() {
            break;
        }
    }
    out
}

/// [`DisplayNotifier`] that posts into the display actor's mailbox.
pub struct DisplayOutbox<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M, DisplayMsg>,
}

impl<M: RawMutex> Clone for DisplayOutbox<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for DisplayOutbox<'_, M> {}

impl<'a, M: RawMutex> DisplayOutbox<'a, M> {
    /// Wrap the display mailbox.
    pub fn new(mailbox: &'a Mailbox<M, DisplayMsg>) -> Self {
        Self { mailbox }
    }

    fn send(&self, msg: DisplayMsg) {
        let label = msg.as_str();
        if post(self.mailbox, msg).is_err() {
            trace!("display mailbox full, {} dropped", label);
        }
    }
}

impl<M: RawMutex> DisplayNotifier for DisplayOutbox<'_, M> {
    fn play_time(&self, status: PlayStatus, track_no: u32, play_secs: u32, total_secs: u32) {
        self.send(DisplayMsg::PlayTime {
            status,
            track_no,
            play_secs,
            total_secs,
        });
    }

    fn play_info(&self, track_no: u32, sample_rate_hz: u32, channels: u8) {
        self.send(DisplayMsg::PlayInfo {
            track_no,
            sample_rate_hz,
            channels,
        });
    }

    fn play_mode(&self, repeat: bool) {
        self.send(DisplayMsg::PlayMode(repeat));
    }

    fn file_name(&self, path: &str) {
        self.send(DisplayMsg::FileName(clipped(path)));
    }

    fn print_string(&self, text: &str) {
        self.send(DisplayMsg::Print(clipped(text)));
    }

    fn input_string(&self, text: &str, finished: bool) {
        self.send(DisplayMsg::Input {
            text: clipped(text),
            finished,
        });
    }

    fn request_help(&self) {
        self.send(DisplayMsg::Help);
    }
}
