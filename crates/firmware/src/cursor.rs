//! Position in the play list and the repeat rule for moving it.

use library::TrackId;
use platform::config::DISPLAY_TRACK_LIMIT;

/// Which track is selected, out of how many.
///
/// Moving past either end wraps. The move reports success only when there is
/// a track to go on to: always inside the list, and at the ends only with
/// repeat on. Callers fall back to stopping when it reports `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackCursor {
    track: usize,
    total: usize,
    repeat: bool,
}

impl TrackCursor {
    /// First track of an empty list.
    pub const fn new(repeat: bool) -> Self {
        Self {
            track: 0,
            total: 0,
            repeat,
        }
    }

    /// Start over on a freshly scanned list of `total` tracks.
    pub fn reset(&mut self, total: usize) {
        self.track = 0;
        self.total = total;
    }

    /// Selected track index.
    pub fn track(&self) -> usize {
        self.track
    }

    /// Number of tracks in the list.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Selected track, if the list has one at that position.
    pub fn current(&self) -> Option<TrackId> {
        if self.track < self.total {
            TrackId::new(self.track)
        } else {
            None
        }
    }

    /// Whether repeat mode is on.
    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Flip repeat mode and return the new setting.
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    /// Move to the next track.
    pub fn next(&mut self) -> bool {
        match self.track.checked_add(1).filter(|&n| n < self.total) {
            Some(n) => {
                self.track = n;
                true
            }
            None => {
                self.track = 0;
                self.repeat
            }
        }
    }

    /// Move to the previous track.
    pub fn prev(&mut self) -> bool {
        if let Some(p) = self.track.checked_sub(1).filter(|&p| p < self.total) {
            self.track = p;
            return true;
        }
        match self.total.checked_sub(1).filter(|_| self.repeat) {
            Some(last) => {
                self.track = last;
                true
            }
            None => {
                self.track = 0;
                false
            }
        }
    }

    /// 1-based number shown to the user; 0 when it would not fit the display.
    pub fn display_number(track: usize) -> u32 {
        u32::try_from(track)
            .ok()
            .filter(|&t| t < DISPLAY_TRACK_LIMIT)
            .map_or(0, |t| t.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cursor(track: usize, total: usize, repeat: bool) -> TrackCursor {
        TrackCursor {
            track,
            total,
            repeat,
        }
    }

    #[test]
    fn next_wraps_only_with_repeat() {
        let mut c = cursor(2, 3, true);
        assert!(c.next());
        assert_eq!(c.track(), 0);

        let mut c = cursor(2, 3, false);
        assert!(!c.next());
        assert_eq!(c.track(), 0);

        let mut c = cursor(0, 3, false);
        assert!(c.next());
        assert_eq!(c.track(), 1);
    }

    #[test]
    fn prev_from_first_track() {
        let mut c = cursor(0, 3, true);
        assert!(c.prev());
        assert_eq!(c.track(), 2);

        let mut c = cursor(0, 3, false);
        assert!(!c.prev());
        assert_eq!(c.track(), 0);

        let mut c = cursor(0, 0, true);
        assert!(!c.prev());
        assert_eq!(c.current(), None);
    }

    #[test]
    fn display_numbers_are_one_based_and_capped() {
        assert_eq!(TrackCursor::display_number(0), 1);
        assert_eq!(TrackCursor::display_number(998), 999);
        assert_eq!(TrackCursor::display_number(999), 0);
    }

    #[test]
    fn reset_selects_first_track() {
        let mut c = cursor(5, 9, true);
        c.reset(2);
        assert_eq!(c.current(), TrackId::new(0));
        assert_eq!(c.total(), 2);
        assert!(!c.toggle_repeat());
        assert!(!c.repeat());
    }

    proptest! {
        #[test]
        fn cursor_stays_in_range(
            total in 0usize..50,
            start in 0usize..50,
            repeat in any::<bool>(),
            moves in prop::collection::vec(any::<bool>(), 0..100),
        ) {
            let mut c = cursor(start.min(total.saturating_sub(1)), total, repeat);
            for forward in moves {
                let before = c.track();
                let moved = if forward { c.next() } else { c.prev() };
                prop_assert!(total == 0 || c.track() < total);
                if !moved {
                    prop_assert!(!repeat || total == 0);
                    prop_assert_eq!(c.track(), 0);
                }
                if moved && total > 1 {
                    let step = if forward { 1 } else { total - 1 };
                    prop_assert_eq!(c.track(), (before + step) % total);
                }
            }
        }

        #[test]
        fn full_lap_with_repeat_returns_home(total in 1usize..40, start in 0usize..40) {
            let start = start % total;
            let mut c = cursor(start, total, true);
            for _ in 0..total {
                prop_assert!(c.next());
            }
            prop_assert_eq!(c.track(), start);
            for _ in 0..total {
                prop_assert!(c.prev());
            }
            prop_assert_eq!(c.track(), start);
        }
    }
}
