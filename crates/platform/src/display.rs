//! Display / status notifier contract.
//!
//! Every notification is fire-and-forget: implementations queue the update
//! for a display actor and silently drop it when that queue is full.

/// Playback status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayStatus {
    /// Nothing playing.
    Stop,
    /// Audio is being produced.
    Play,
    /// Paused; silence is being produced.
    Pause,
}

impl PlayStatus {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Play => "play",
            Self::Pause => "pause",
        }
    }
}

/// Receiver of user-visible status updates.
///
/// Methods take `&self` so the system and input actors can share one
/// notifier.
pub trait DisplayNotifier {
    /// Current position of the playing track. `track_no` is 1-based.
    fn play_time(&self, status: PlayStatus, track_no: u32, play_secs: u32, total_secs: u32);

    /// Format of the track that just opened.
    fn play_info(&self, track_no: u32, sample_rate_hz: u32, channels: u8);

    /// Repeat mode changed.
    fn play_mode(&self, repeat: bool);

    /// Path of the track about to play.
    fn file_name(&self, path: &str);

    /// Free-text status line.
    fn print_string(&self, text: &str);

    /// Echo of the command line being edited; `finished` once Enter is seen.
    fn input_string(&self, text: &str, finished: bool);

    /// Show the command help.
    fn request_help(&self);
}
