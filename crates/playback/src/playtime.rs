//! Play-time bookkeeping for the current stream.

use platform::PlayStatus;

use crate::message::PlayReport;

/// Tracks status and whole-second play time, reporting only changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayClock {
    status: PlayStatus,
    play_secs: u32,
    total_secs: u32,
}

impl PlayClock {
    /// A stopped clock at zero.
    pub const fn new() -> Self {
        Self {
            status: PlayStatus::Stop,
            play_secs: 0,
            total_secs: 0,
        }
    }

    /// Start a new stream of `total_secs`. Does not report.
    pub fn reset(&mut self, total_secs: u32) {
        *self = Self {
            total_secs,
            ..Self::new()
        };
    }

    /// Change status; returns the report to publish if it changed.
    pub fn set_status(&mut self, status: PlayStatus) -> Option<PlayReport> {
        if self.status == status {
            return None;
        }
        self.status = status;
        Some(self.report())
    }

    /// Change play time; returns the report to publish if it changed.
    pub fn set_play_secs(&mut self, play_secs: u32) -> Option<PlayReport> {
        if self.play_secs == play_secs {
            return None;
        }
        self.play_secs = play_secs;
        Some(self.report())
    }

    /// Current values.
    pub fn report(&self) -> PlayReport {
        PlayReport {
            status: self.status,
            play_secs: self.play_secs,
            total_secs: self.total_secs,
        }
    }
}

impl Default for PlayClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_changes() {
        let mut clock = PlayClock::new();
        clock.reset(180);
        assert_eq!(clock.set_status(PlayStatus::Stop), None);
        let report = clock.set_status(PlayStatus::Play).unwrap();
        assert_eq!(report.total_secs, 180);
        assert_eq!(clock.set_play_secs(0), None);
        assert_eq!(clock.set_play_secs(1).unwrap().play_secs, 1);
        assert_eq!(clock.set_play_secs(1), None);
    }

    #[test]
    fn reset_clears_play_time_and_status() {
        let mut clock = PlayClock::new();
        clock.reset(10);
        clock.set_status(PlayStatus::Pause);
        clock.set_play_secs(7);
        clock.reset(20);
        assert_eq!(
            clock.report(),
            PlayReport {
                status: PlayStatus::Stop,
                play_secs: 0,
                total_secs: 20
            }
        );
    }
}
