//! Hand-pumped player for integration tests.
//!
//! The system, decode and audio output actors are wired exactly like
//! `run_player` does, but over mock drivers and without an executor: each
//! [`Player::step`] drains every mailbox, then completes at most one pending
//! operation per driver. Interleavings are therefore reproducible.

#![allow(dead_code, clippy::expect_used, clippy::panic)]

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use firmware::{PlayerConfig, SystemController, SystemMsg, SystemOutbox, SystemState};
use library::Catalog;
use platform::config::DECODE_BUFFER_COUNT;
use platform::mocks::{
    DisplayEvent, MockCodec, MockConverter, MockConverterInput, MockConverterOutput, MockDac,
    MockFile, MockStream, MockVolume, RecordingDisplay,
};
use platform::{KeyCode, PlayStatus, SlotBank};
use playback::{
    AudioOutClient, AudioOutController, AudioOutMsg, DecodeBuffer, DecodeClient, DecodeController,
    DecodeMsg, Mailbox,
};

/// Sample value the mock converter writes into the slots it fills.
pub const FILL: i32 = 0x0012_3400;

/// Give up on a scenario after this many steps.
pub const MAX_STEPS: usize = 20_000;

/// Mock drivers, mailboxes and slots shared by the actors.
pub struct World {
    pub volume: MockVolume,
    pub codec: MockCodec,
    pub converter: MockConverter,
    pub dac: MockDac,
    pub display: RecordingDisplay,
    pub slots: SlotBank<NoopRawMutex>,
    pub system_mail: Mailbox<NoopRawMutex, SystemMsg>,
    pub decode_mail: Mailbox<NoopRawMutex, DecodeMsg<MockFile>>,
    pub audio_mail: Mailbox<NoopRawMutex, AudioOutMsg>,
}

impl World {
    /// A plugged-in volume holding `tracks`, each playing `stream`.
    pub fn new(tracks: &[&str], stream: MockStream) -> Box<Self> {
        Box::new(Self {
            volume: MockVolume::with_files(tracks),
            codec: MockCodec::new(stream),
            converter: MockConverter::new(),
            dac: MockDac::new(),
            display: RecordingDisplay::new(),
            slots: SlotBank::new(),
            system_mail: Channel::new(),
            decode_mail: Channel::new(),
            audio_mail: Channel::new(),
        })
    }

    /// Tracks the codec was asked to open, in order.
    pub fn opened(&self) -> Vec<String> {
        self.codec.log().opened.clone()
    }

    /// Whether the display was ever told that `track_no` (1-based) played.
    pub fn showed_playing(&self, track_no: u32) -> bool {
        self.display.events().iter().any(|e| {
            matches!(
                e,
                DisplayEvent::PlayTime { status: PlayStatus::Play, track_no: n, .. } if *n == track_no
            )
        })
    }
}

/// Memory the actors borrow mutably.
pub struct Storage {
    pub catalog: Box<Catalog>,
    pub buffers: Box<[DecodeBuffer; DECODE_BUFFER_COUNT]>,
}

impl Storage {
    pub fn new() -> Self {
        Self {
            catalog: Box::new(Catalog::new()),
            buffers: playback::decode::boxed_buffers().expect("decode buffers"),
        }
    }
}

/// The three playback actors over one [`World`].
pub struct Player<'w> {
    world: &'w World,
    pub system: SystemController<'w, NoopRawMutex, MockVolume>,
    pub decode: DecodeController<'w, NoopRawMutex, MockCodec, MockConverterInput>,
    pub audio_out: AudioOutController<'w, NoopRawMutex, MockConverterOutput, MockDac>,
}

impl<'w> Player<'w> {
    pub fn new(
        world: &'w World,
        outbox: &'w SystemOutbox<'w, NoopRawMutex>,
        storage: &'w mut Storage,
        config: &PlayerConfig,
    ) -> Self {
        let Storage { catalog, buffers } = storage;
        let mut audio_out = AudioOutController::new(
            world.converter.output(),
            world.dac.clone(),
            &world.slots,
            &world.display,
        );
        let data_out_reply = audio_out
            .register_listener(&world.decode_mail)
            .expect("audio out listener");
        let mut decode = DecodeController::new(
            world.codec.clone(),
            world.converter.input(),
            AudioOutClient::new(&world.audio_mail),
            data_out_reply,
            outbox,
            buffers,
        );
        let system_reply = decode.register_listener(outbox).expect("decode listener");
        let system = SystemController::new(
            world.volume.clone(),
            catalog,
            DecodeClient::new(&world.decode_mail),
            system_reply,
            &world.display,
            config,
        );
        Self {
            world,
            system,
            decode,
            audio_out,
        }
    }

    /// Queue a key for the system actor.
    pub fn press(&self, key: KeyCode) {
        self.world
            .system_mail
            .try_send(SystemMsg::Key(key))
            .expect("system mailbox full");
    }

    pub fn state(&self) -> SystemState {
        self.system.state()
    }

    /// Drain every mailbox, then complete one operation per driver.
    ///
    /// Returns whether anything happened.
    pub fn step(&mut self) -> bool {
        let w = self.world;
        let mut busy = self.system.poll_media();
        while let Ok(msg) = w.system_mail.try_receive() {
            self.system.handle(msg);
            busy = true;
        }
        while let Ok(msg) = w.decode_mail.try_receive() {
            self.decode.handle(msg);
            busy = true;
        }
        while let Ok(msg) = w.audio_mail.try_receive() {
            self.audio_out.handle(msg);
            busy = true;
        }

        if let Some(buffer) = w.converter.complete_write() {
            w.decode_mail
                .try_send(DecodeMsg::WriteFinished { result: Ok(()), buffer })
                .expect("decode mailbox full");
            busy = true;
        }
        if w.converter.complete_flush() {
            w.decode_mail
                .try_send(DecodeMsg::FlushFinished { result: Ok(()) })
                .expect("decode mailbox full");
            busy = true;
        }
        if let Some((slot, bytes)) = w.converter.complete_read(&w.slots, FILL) {
            w.audio_mail
                .try_send(AudioOutMsg::ReadFinished {
                    result: Ok(()),
                    slot: slot.index(),
                    bytes,
                })
                .expect("audio out mailbox full");
            busy = true;
        }
        if let Some(slot) = w.dac.complete_write() {
            w.audio_mail
                .try_send(AudioOutMsg::WriteFinished { result: Ok(()), slot })
                .expect("audio out mailbox full");
            busy = true;
        }
        busy
    }

    /// Step until nothing moves. Panics if the player never goes quiet.
    pub fn settle(&mut self) {
        for _ in 0..MAX_STEPS {
            if !self.step() {
                return;
            }
        }
        panic!("player still busy after {MAX_STEPS} steps in {:?}", self.state());
    }

    /// Step until `done` holds. Returns `false` if it never does.
    pub fn run_until(&mut self, mut done: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..MAX_STEPS {
            if done(self) {
                return true;
            }
            self.step();
        }
        done(self)
    }
}
