//! VT100 terminal renderer.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::PlayStatus;
use playback::Mailbox;

use super::{clipped, DisplayMsg, DisplayText, InputText};

const MOVE_LEFT: &str = "\x1b[128D";
const CLEAR_RIGHT: &str = "\x1b[0K";
const CLEAR_LINE: &str = "\x1b[2K";
const CLEAR_ALL: &str = "\x1b[2J";
const CR: &str = "\r\n";

const HELP_LINES: [&str; 7] = [
    "help      : Show help information for commands.",
    "next      : Select the next song.",
    "playinfo  : Show the song information.",
    "playpause : Control playback/pause.",
    "prev      : Select the previous song.",
    "repeat    : Turn on and off the repeat mode.",
    "stop      : Stop playback.",
];

/// Latest values the screen is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Screen {
    track_no: u32,
    play_secs: u32,
    total_secs: u32,
    status: PlayStatus,
    sample_rate_hz: u32,
    channels: u8,
    repeat: bool,
    file_name: DisplayText,
    print: DisplayText,
    input: InputText,
    input_finished: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            track_no: 0,
            play_secs: 0,
            total_secs: 0,
            status: PlayStatus::Stop,
            sample_rate_hz: 0,
            channels: 0,
            repeat: false,
            file_name: DisplayText::new(),
            print: DisplayText::new(),
            input: InputText::new(),
            input_finished: false,
        }
    }
}

/// Split seconds into hours, minutes and seconds.
#[allow(clippy::arithmetic_side_effects)]
fn hms(secs: u32) -> (u32, u32, u32) {
    (secs / 3600, secs % 3600 / 60, secs % 60)
}

/// Renders display mail to a serial terminal.
///
/// Each message redraws the prompt line `T<track> h:mm:ss > ` followed by
/// the command line being typed. Messages carrying text first print their
/// lines above the prompt. When a command line finishes, the prompt is
/// drawn once more on a fresh line and the echo is cleared.
pub struct TerminalDisplay<W: Write> {
    out: W,
    screen: Screen,
}

impl<W: Write> TerminalDisplay<W> {
    /// Wrap a terminal writer.
    pub fn new(out: W) -> Self {
        Self {
            out,
            screen: Screen::default(),
        }
    }

    /// Clear the whole terminal.
    pub fn init(&mut self) {
        self.put(CLEAR_ALL);
    }

    /// The terminal writer.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Mutable access to the terminal writer.
    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Give back the terminal writer.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Track number last shown.
    pub fn track_no(&self) -> u32 {
        self.screen.track_no
    }

    /// Status last shown.
    pub fn status(&self) -> PlayStatus {
        self.screen.status
    }

    /// Track length last shown, in seconds.
    pub fn total_secs(&self) -> u32 {
        self.screen.total_secs
    }

    /// Apply one message and redraw.
    pub fn handle(&mut self, msg: DisplayMsg) {
        match msg {
            DisplayMsg::PlayTime {
                status,
                track_no,
                play_secs,
                total_secs,
            } => {
                self.screen.status = status;
                self.screen.track_no = track_no;
                self.screen.play_secs = play_secs;
                self.screen.total_secs = total_secs;
            }
            DisplayMsg::PlayInfo {
                track_no,
                sample_rate_hz,
                channels,
            } => {
                self.screen.track_no = track_no;
                self.screen.sample_rate_hz = sample_rate_hz;
                self.screen.channels = channels;
                self.clear_line();
                self.play_info();
            }
            DisplayMsg::PlayMode(repeat) => {
                self.screen.repeat = repeat;
                self.clear_line();
                self.put("Repeat Mode = ");
                self.put(if repeat { "on" } else { "off" });
                self.put(CR);
            }
            DisplayMsg::FileName(name) => {
                self.screen.file_name = name;
                self.clear_line();
                self.put("File Name = ");
                let _ = self.out.write_str(&self.screen.file_name);
                self.put(CR);
            }
            DisplayMsg::Print(text) => {
                self.screen.print = text;
                self.clear_line();
                let _ = self.out.write_str(&self.screen.print);
                self.put(CR);
            }
            DisplayMsg::Input { text, finished } => {
                self.screen.input = text;
                self.screen.input_finished = finished;
            }
            DisplayMsg::Help => {
                self.clear_line();
                for line in HELP_LINES {
                    self.put(line);
                    self.put(CR);
                }
            }
        }
        self.redraw();
    }

    /// Render mail forever.
    pub async fn run<M: RawMutex>(&mut self, mailbox: &Mailbox<M, DisplayMsg>) -> ! {
        self.init();
        loop {
            let msg = mailbox.receive().await;
            self.handle(msg);
        }
    }

    fn play_info(&mut self) {
        self.put("File type      : FLAC");
        self.put(CR);
        let _ = write!(self.out, "Sampling freq. : {} Hz", self.screen.sample_rate_hz);
        self.put(CR);
        self.put("Channel        : ");
        self.put(if self.screen.channels == 1 {
            "Mono"
        } else {
            "Stereo"
        });
        self.put(CR);
    }

    fn redraw(&mut self) {
        self.prompt();
        let _ = self.out.write_str(&self.screen.input);
        if self.screen.input_finished {
            self.put(CR);
            self.prompt();
            self.screen.input = clipped("");
            self.screen.input_finished = false;
        }
    }

    fn prompt(&mut self) {
        let (h, m, s) = hms(self.screen.play_secs);
        let _ = write!(
            self.out,
            "{MOVE_LEFT}T{} {}:{:02}:{:02} > {CLEAR_RIGHT}",
            self.screen.track_no, h, m, s
        );
    }

    fn clear_line(&mut self) {
        self.put(MOVE_LEFT);
        self.put(CLEAR_LINE);
    }

    fn put(&mut self, text: &str) {
        let _ = self.out.write_str(text);
    }
}
