//! Actor wiring.
//!
//! Five actors run side by side, each owning its state and its mailbox:
//!
//! ```text
//!  input ──Key──▶ system ──DecodeMsg──▶ decode ──AudioOutMsg──▶ audio out
//!                   ▲  │                  │                        │
//!                   │  └─ DisplayMsg ─┐   │ open/close/status      │ errors
//!                   └─────────────────┼───┘                        │
//!                                     ▼                            │
//!                                  display ◀───────────────────────┘
//! ```
//!
//! [`run_player`] registers the reply listeners, builds every controller
//! and polls all five run loops on the current task. It only returns if
//! wiring fails.

use core::convert::Infallible;

use embassy_futures::join::join5;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use library::Catalog;
use platform::config::DECODE_BUFFER_COUNT;
use platform::{
    ConsoleInput, ConverterInput, ConverterOutput, DacOutput, MediaVolume, SlotBank, StreamCodec,
    Switch, TouchPanel,
};
use playback::{
    AudioOutClient, AudioOutController, AudioOutMsg, DecodeBuffer, DecodeClient, DecodeController,
    DecodeMsg, Mailbox, RegistryFull,
};

use crate::config::PlayerConfig;
use crate::display::{DisplayMsg, DisplayOutbox, TerminalDisplay};
use crate::input::InputPoller;
use crate::message::{SystemMsg, SystemOutbox};
use crate::system::SystemController;

/// Every mailbox of the player plus the shared PCM slots.
///
/// `F` is the media volume's file handle type, carried by open requests.
pub struct Mailboxes<M: RawMutex, F> {
    /// System actor mail.
    pub system: Mailbox<M, SystemMsg>,
    /// Decode actor mail, including converter write completions.
    pub decode: Mailbox<M, DecodeMsg<F>>,
    /// Audio output mail, including converter read and DAC completions.
    pub audio_out: Mailbox<M, AudioOutMsg>,
    /// Display actor mail.
    pub display: Mailbox<M, DisplayMsg>,
    /// PCM slots shared by the converter, audio output and DAC.
    pub slots: SlotBank<M>,
}

impl<M: RawMutex, F> Mailboxes<M, F> {
    /// Empty mailboxes and silent slots.
    pub fn new() -> Self {
        Self {
            system: Channel::new(),
            decode: Channel::new(),
            audio_out: Channel::new(),
            display: Channel::new(),
            slots: SlotBank::new(),
        }
    }
}

impl<M: RawMutex, F> Default for Mailboxes<M, F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drivers owned by the playback actors.
pub struct AudioDrivers<C, I, O, D> {
    /// Stream decoder, owned by the decode actor.
    pub codec: C,
    /// Converter write half, owned by the decode actor.
    pub converter_in: I,
    /// Converter read half, owned by the audio output actor.
    pub converter_out: O,
    /// DAC, owned by the audio output actor.
    pub dac: D,
}

/// Raw input sources, owned by the input actor.
pub struct InputSources<S, T, K> {
    /// Push switch.
    pub switch: S,
    /// Touch panel.
    pub touch: T,
    /// Serial console receive side.
    pub console: K,
}

/// Wire every actor and run them until the program ends.
///
/// The drivers must post their completions into the matching mailbox of
/// `mailboxes`. Returns only if a reply listener could not be registered.
#[allow(clippy::too_many_arguments)]
pub async fn run_player<M, V, C, I, O, D, S, T, K, W>(
    mailboxes: &Mailboxes<M, V::File>,
    volume: V,
    catalog: &mut Catalog,
    drivers: AudioDrivers<C, I, O, D>,
    inputs: InputSources<S, T, K>,
    buffers: &mut [DecodeBuffer; DECODE_BUFFER_COUNT],
    terminal: W,
    config: &PlayerConfig,
) -> Result<Infallible, RegistryFull>
where
    M: RawMutex,
    V: MediaVolume,
    C: StreamCodec<Stream = V::File>,
    I: ConverterInput,
    O: ConverterOutput,
    D: DacOutput,
    S: Switch,
    T: TouchPanel,
    K: ConsoleInput,
    W: core::fmt::Write,
{
    let display = DisplayOutbox::new(&mailboxes.display);
    let system_outbox = SystemOutbox::new(&mailboxes.system);

    let mut audio_out = AudioOutController::new(
        drivers.converter_out,
        drivers.dac,
        &mailboxes.slots,
        &display,
    );
    let data_out_reply = audio_out.register_listener(&mailboxes.decode)?;

    let mut decode = DecodeController::new(
        drivers.codec,
        drivers.converter_in,
        AudioOutClient::new(&mailboxes.audio_out),
        data_out_reply,
        &system_outbox,
        buffers,
    );
    let system_reply = decode.register_listener(&system_outbox)?;

    let mut system = SystemController::new(
        volume,
        catalog,
        DecodeClient::new(&mailboxes.decode),
        system_reply,
        &display,
        config,
    );
    let mut input = InputPoller::new(inputs.switch, inputs.touch, inputs.console);
    let mut terminal = TerminalDisplay::new(terminal);

    info!("player wired, repeat {}", config.repeat);
    let (never, _, _, _, _) = join5(
        system.run(&mailboxes.system, config.receive_timeout),
        decode.run(&mailboxes.decode),
        audio_out.run(&mailboxes.audio_out),
        input.run(system_outbox, &display, config.input_tick),
        terminal.run(&mailboxes.display),
    )
    .await;
    never
}
