//! Push-switch debounce by counting.

use platform::config::SWITCH_DECISION_TICKS;

/// Counts consecutive active samples of a momentary switch.
///
/// A press is reported once, on the sample that completes the decision
/// window. Holding the switch longer reports nothing more; any released
/// sample starts the count over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    count: u32,
    decision: u32,
}

impl Debouncer {
    /// Decide after `decision` consecutive active samples.
    pub const fn new(decision: u32) -> Self {
        Self { count: 0, decision }
    }

    /// Feed one sample. Returns `true` on the sample that decides a press.
    pub fn sample(&mut self, active: bool) -> bool {
        if !active {
            self.count = 0;
            return false;
        }
        if self.count >= self.decision {
            return false;
        }
        self.count = self.count.saturating_add(1);
        self.count == self.decision
    }

    /// Whether the switch is currently held past the decision window.
    pub fn is_pressed(&self) -> bool {
        self.count >= self.decision
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SWITCH_DECISION_TICKS)
    }
}
