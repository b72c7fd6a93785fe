//! Runtime player settings.

use embassy_time::Duration;
use platform::config::{INPUT_TICK_MS, SYSTEM_RECEIVE_TIMEOUT_MS};

/// Settings chosen at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Repeat mode when the player boots.
    pub repeat: bool,
    /// How long the system actor waits for mail before polling the media.
    pub receive_timeout: Duration,
    /// Period of the input poller.
    pub input_tick: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            repeat: true,
            receive_timeout: Duration::from_millis(SYSTEM_RECEIVE_TIMEOUT_MS),
            input_tick: Duration::from_millis(INPUT_TICK_MS),
        }
    }
}

impl PlayerConfig {
    /// Same settings with a different initial repeat mode.
    pub fn with_repeat(self, repeat: bool) -> Self {
        Self { repeat, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_timing() {
        let config = PlayerConfig::default();
        assert!(config.repeat);
        assert_eq!(config.receive_timeout.as_millis(), 10);
        assert_eq!(config.input_tick.as_millis(), 2);
        assert!(!config.with_repeat(false).repeat);
    }
}
