//! Desktop collaborators for running the player without hardware.
//!
//! | Contract                              | Simulator driver        | Backed by   |
//! |---------------------------------------|-------------------------|-------------|
//! | [`StreamCodec`](platform::StreamCodec) | [`FlacCodec`]          | symphonia   |
//! | converter input / output halves       | [`RateConverter`]       | rubato      |
//! | [`DacOutput`](platform::DacOutput)    | [`WavDac`]              | hound       |
//! | [`MediaVolume`](platform::MediaVolume) | `library::LocalVolume` | host folder |
//! | [`ConsoleInput`](platform::ConsoleInput) | [`SimConsole`]        | stdin       |
//! | terminal output                       | [`StdoutTerminal`]      | stdout      |
//!
//! Hardware drivers complete their requests from interrupt context. Here a
//! driver queues each completion on a [`Relay`] instead, and the relay's
//! forwarding loop moves it into the actor's mailbox, waiting for room
//! rather than dropping it.

pub mod codec;
pub mod console;
pub mod converter;
pub mod dac;

pub use codec::FlacCodec;
pub use console::{SimConsole, StdoutTerminal};
pub use converter::{RateConverter, RateConverterInput, RateConverterOutput};
pub use dac::WavDac;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use playback::Mailbox;

/// Completions a relay can hold before it starts dropping them.
pub const RELAY_DEPTH: usize = 64;

/// Staging queue between a simulated driver and an actor mailbox.
pub struct Relay<M: RawMutex, T> {
    queue: Channel<M, T, RELAY_DEPTH>,
}

impl<M: RawMutex, T> Relay<M, T> {
    /// An empty relay.
    pub fn new() -> Self {
        Self {
            queue: Channel::new(),
        }
    }

    /// Queue a completion. Returns `false` if the relay was full.
    pub fn push(&self, msg: T) -> bool {
        if self.queue.try_send(msg).is_err() {
            error!("driver relay full, completion dropped");
            return false;
        }
        true
    }

    /// Completions waiting to be forwarded.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Move queued completions into `mailbox`, forever.
    pub async fn forward(&self, mailbox: &Mailbox<M, T>) -> ! {
        loop {
            let msg = self.queue.receive().await;
            mailbox.send(msg).await;
        }
    }
}

impl<M: RawMutex, T> Default for Relay<M, T> {
    fn default() -> Self {
        Self::new()
    }
}
