//! Fixed-tick polling of every input source.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};
use platform::config::{COMMAND_PERIOD_TICKS, INPUT_CADENCE_TICKS, TOUCH_PERIOD_TICKS};
use platform::{ConsoleInput, DisplayNotifier, KeyCode, Switch, TouchPanel};

use crate::input::{CommandLine, Debouncer};
use crate::message::SystemOutbox;

/// Polls a switch, a touch panel and a console on one tick.
pub struct InputPoller<S, T, C> {
    switch: S,
    touch: T,
    console: C,
    debouncer: Debouncer,
    line: CommandLine,
    tick: u32,
}

impl<S, T, C> InputPoller<S, T, C>
where
    S: Switch,
    T: TouchPanel,
    C: ConsoleInput,
{
    /// A poller at tick zero.
    pub fn new(switch: S, touch: T, console: C) -> Self {
        Self {
            switch,
            touch,
            console,
            debouncer: Debouncer::default(),
            line: CommandLine::new(),
            tick: 0,
        }
    }

    /// Run one tick and return the key it produced, if any.
    pub fn poll(&mut self, display: &dyn DisplayNotifier) -> Option<KeyCode> {
        let mut key = None;
        if self.tick.checked_rem(TOUCH_PERIOD_TICKS) == Some(0) {
            key = self.touch.poll_key();
        }
        // The switch is sampled every tick; its decision window is counted in ticks.
        if self.debouncer.sample(self.switch.is_active()) {
            key = Some(KeyCode::PlayPause);
        }
        if self.tick.checked_rem(COMMAND_PERIOD_TICKS) == Some(0) {
            if let Some(command) = self
                .console
                .read_byte()
                .and_then(|byte| self.line.feed(byte, display))
            {
                key = key.or(Some(command));
            }
        }
        self.tick = if self.tick >= INPUT_CADENCE_TICKS {
            1
        } else {
            self.tick.saturating_add(1)
        };
        key
    }

    /// Poll every `period`, forever, posting keys to the system actor.
    pub async fn run<M: RawMutex>(
        &mut self,
        outbox: SystemOutbox<'_, M>,
        display: &dyn DisplayNotifier,
        period: Duration,
    ) -> ! {
        let mut ticker = Ticker::every(period);
        loop {
            if let Some(key) = self.poll(display) {
                debug!("input: {}", key.as_str());
                outbox.key(key);
            }
            ticker.next().await;
        }
    }
}
