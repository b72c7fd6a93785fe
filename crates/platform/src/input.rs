//! Raw input sources and the key codes they are decoded into.

/// User commands understood by the system controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    /// Stop playback.
    Stop,
    /// Toggle play / pause, or start playing when stopped.
    PlayPause,
    /// Skip to the next track.
    Next,
    /// Go back to the previous track.
    Prev,
    /// Show the current track's format.
    PlayInfo,
    /// Toggle repeat mode.
    Repeat,
    /// Show command help.
    Help,
}

impl KeyCode {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::PlayPause => "playpause",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::PlayInfo => "playinfo",
            Self::Repeat => "repeat",
            Self::Help => "help",
        }
    }
}

/// A momentary push switch, sampled by level.
pub trait Switch {
    /// `true` while the switch is held.
    fn is_active(&mut self) -> bool;
}

/// On-screen (touch) controls.
pub trait TouchPanel {
    /// A key produced since the last poll, if any.
    fn poll_key(&mut self) -> Option<KeyCode>;
}

/// Serial console receive side.
pub trait ConsoleInput {
    /// Next received byte, if one is waiting.
    fn read_byte(&mut self) -> Option<u8>;
}

/// A touch panel that never reports anything (boards without a screen).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTouch;

impl TouchPanel for NoTouch {
    fn poll_key(&mut self) -> Option<KeyCode> {
        None
    }
}

/// A switch that is never pressed (boards or hosts without one).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSwitch;

impl Switch for NoSwitch {
    fn is_active(&mut self) -> bool {
        false
    }
}
