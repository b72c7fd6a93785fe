//! Decode actor: codec → PCM expansion → sample-rate converter.
//!
//! ```text
//!  Idle ──Open ok──▶ MetadataReady ──Play──▶ Playing ◀──PauseOff── Paused
//!   ▲                     │                  │  │ └──PauseOn──────▶ │
//!   │                   Close               Stop └─end / refused─┐  Stop
//!   │                     ▼                  ▼                   ▼  ▼
//!   └─────Close─────── Stopped ◀──FlushFinished── StopPreparing   Stopped
//! ```
//!
//! While playing, every free decode buffer is filled with up to a few codec
//! blocks and written to the converter; each write completion refills that
//! one buffer. While paused, the same completions are answered with short
//! units of silence so the converter keeps running. When the codec runs dry
//! or the converter refuses a write, the converter is asked to flush; its
//! completion ends the stream.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;
use platform::config::{
    DECODE_BUFFER_COUNT, DECODE_BUFFER_SAMPLES, MAX_BLOCK_SAMPLES, OUTPUT_SAMPLE_RATE_HZ,
    PAUSE_UNIT_SAMPLES,
};
use platform::{
    audio_types, BlockStatus, ChannelMap, ConverterConfig, ConverterInput, PlayStatus,
    StreamCodec, StreamFormat, StreamInfo,
};

use crate::mailbox::{AudioOutClient, Mailbox};
use crate::message::{DecodeMsg, OpenError, OpenInfo, PlayReport};
use crate::pcm::PcmAccumulator;
use crate::playtime::PlayClock;
use crate::reply::{DecodeListener, PlayStatusListener, RegistryFull, ReplyHandle, ReplyRegistry};

/// One converter write buffer: the largest block plus a pause unit.
pub type DecodeBuffer = [i32; DECODE_BUFFER_SAMPLES];

/// Listeners that may open and close streams.
pub const DECODE_LISTENERS: usize = 2;

/// Heap-allocated decode buffers for hosted builds.
#[cfg(any(test, feature = "std"))]
pub fn boxed_buffers() -> Option<std::boxed::Box<[DecodeBuffer; DECODE_BUFFER_COUNT]>> {
    let buffers: std::vec::Vec<DecodeBuffer> = (0..DECODE_BUFFER_COUNT)
        .map(|_| [0; DECODE_BUFFER_SAMPLES])
        .collect();
    buffers.into_boxed_slice().try_into().ok()
}

/// Decode actor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeState {
    /// No stream.
    Idle,
    /// Metadata parsed, converter started, waiting for `Play`.
    MetadataReady,
    /// Decoding and writing to the converter.
    Playing,
    /// Writing silence to the converter.
    Paused,
    /// Waiting for the converter flush to complete.
    StopPreparing,
    /// Stream finished or stopped, waiting for `Close`.
    Stopped,
}

impl DecodeState {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MetadataReady => "metadata-ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::StopPreparing => "stop-preparing",
            Self::Stopped => "stopped",
        }
    }
}

/// The decode state machine.
pub struct DecodeController<'a, M: RawMutex, C, I> {
    codec: C,
    converter: I,
    audio_out: AudioOutClient<'a, M>,
    data_out_reply: ReplyHandle,
    status: &'a dyn PlayStatusListener,
    replies: ReplyRegistry<'a, dyn DecodeListener + 'a, DECODE_LISTENERS>,
    buffers: &'a mut [DecodeBuffer; DECODE_BUFFER_COUNT],
    /// Buffers the converter has accepted and not yet completed.
    in_flight: [bool; DECODE_BUFFER_COUNT],
    state: DecodeState,
    format: Option<StreamFormat>,
    decoded_frames: u64,
    clock: PlayClock,
}

impl<'a, M, C, I> DecodeController<'a, M, C, I>
where
    M: RawMutex,
    C: StreamCodec,
    I: ConverterInput,
{
    /// An idle controller.
    ///
    /// `data_out_reply` is the handle the audio output actor issued for this
    /// actor's mailbox; `status` receives play status and time changes.
    pub fn new(
        codec: C,
        converter: I,
        audio_out: AudioOutClient<'a, M>,
        data_out_reply: ReplyHandle,
        status: &'a dyn PlayStatusListener,
        buffers: &'a mut [DecodeBuffer; DECODE_BUFFER_COUNT],
    ) -> Self {
        Self {
            codec,
            converter,
            audio_out,
            data_out_reply,
            status,
            replies: ReplyRegistry::new(),
            buffers,
            in_flight: [false; DECODE_BUFFER_COUNT],
            state: DecodeState::Idle,
            format: None,
            decoded_frames: 0,
            clock: PlayClock::new(),
        }
    }

    /// Register a listener for open and close answers.
    pub fn register_listener(
        &mut self,
        listener: &'a (dyn DecodeListener + 'a),
    ) -> Result<ReplyHandle, RegistryFull> {
        self.replies.register(listener)
    }

    /// Current state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Current play status and time.
    pub fn report(&self) -> PlayReport {
        self.clock.report()
    }

    /// Process mail forever.
    pub async fn run<MM: RawMutex>(&mut self, mailbox: &Mailbox<MM, DecodeMsg<C::Stream>>) -> ! {
        loop {
            let msg = mailbox.receive().await;
            self.handle(msg);
        }
    }

    /// Process one message.
    pub fn handle(&mut self, msg: DecodeMsg<C::Stream>) {
        let next = match self.state {
            DecodeState::Idle => self.on_idle(msg),
            DecodeState::MetadataReady => self.on_metadata_ready(msg),
            DecodeState::Playing => self.on_playing(msg),
            DecodeState::Paused => self.on_paused(msg),
            DecodeState::StopPreparing => self.on_stop_preparing(msg),
            DecodeState::Stopped => self.on_stopped(msg),
        };
        if next != self.state {
            debug!("decode: {} -> {}", self.state.as_str(), next.as_str());
            self.state = next;
        }
    }

    // ── Per-state handlers ──────────────────────────────────────────────────

    fn on_idle(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        match msg {
            DecodeMsg::Open { file, reply } => {
                let result = self.open_stream(file);
                let next = if result.is_ok() {
                    DecodeState::MetadataReady
                } else {
                    DecodeState::Idle
                };
                self.answer_open(reply, result);
                next
            }
            other => self.ignore(other),
        }
    }

    fn on_metadata_ready(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        match msg {
            DecodeMsg::Play => {
                let total = self.format.map_or(0, |f| f.total_seconds());
                self.clock.reset(total);
                self.set_status(PlayStatus::Play);
                if self.audio_out.request_data_out(self.data_out_reply).is_err() {
                    warn!("decode: audio out mailbox full, data out not requested");
                }
                DecodeState::Playing
            }
            DecodeMsg::Close { reply } => {
                self.converter.clear_stop();
                self.close_stream(reply);
                DecodeState::Idle
            }
            other => self.ignore(other),
        }
    }

    fn on_playing(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        match msg {
            DecodeMsg::PauseOn => {
                self.set_status(PlayStatus::Pause);
                DecodeState::Paused
            }
            DecodeMsg::Stop => self.stop_now(),
            DecodeMsg::DataOutDone { .. } => {
                self.after_fill(Self::fill_with_audio, 0, DECODE_BUFFER_COUNT)
            }
            DecodeMsg::WriteFinished { buffer, .. } => match self.complete_write(buffer) {
                Some(index) => self.after_fill(Self::fill_with_audio, index, 1),
                None => DecodeState::Playing,
            },
            other => self.ignore(other),
        }
    }

    fn on_paused(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        match msg {
            DecodeMsg::PauseOff => {
                self.set_status(PlayStatus::Play);
                DecodeState::Playing
            }
            DecodeMsg::Stop => self.stop_now(),
            DecodeMsg::DataOutDone { .. } => {
                self.after_fill(Self::fill_with_silence, 0, DECODE_BUFFER_COUNT)
            }
            DecodeMsg::WriteFinished { buffer, .. } => match self.complete_write(buffer) {
                Some(index) => self.after_fill(Self::fill_with_silence, index, 1),
                None => DecodeState::Paused,
            },
            other => self.ignore(other),
        }
    }

    fn on_stop_preparing(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        match msg {
            DecodeMsg::FlushFinished { .. } => {
                self.finish_stop();
                DecodeState::Stopped
            }
            other => self.ignore(other),
        }
    }

    fn on_stopped(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        match msg {
            DecodeMsg::Close { reply } => {
                self.close_stream(reply);
                DecodeState::Idle
            }
            other => self.ignore(other),
        }
    }

    /// Drop a message the current state has no transition for. An open
    /// request still gets its answer so the requester is not left waiting.
    fn ignore(&mut self, msg: DecodeMsg<C::Stream>) -> DecodeState {
        trace!("decode: {} ignored in {}", msg.as_str(), self.state.as_str());
        if let DecodeMsg::Open { file, reply } = msg {
            drop(file);
            self.answer_open(reply, Err(OpenError::Busy));
        }
        self.state
    }

    // ── Stream lifecycle ────────────────────────────────────────────────────

    fn open_stream(&mut self, file: C::Stream) -> Result<OpenInfo, OpenError> {
        let info = self.codec.open(file).map_err(OpenError::Codec)?;
        let format = match self.start_converter(&info) {
            Ok(format) => format,
            Err(err) => {
                self.codec.close();
                return Err(err);
            }
        };
        info!(
            "decode: opened {} Hz, {} ch, {} bit",
            format.sample_rate.get(),
            format.channels.get(),
            format.bits.get()
        );
        self.format = Some(format);
        self.decoded_frames = 0;
        self.in_flight = [false; DECODE_BUFFER_COUNT];
        Ok(OpenInfo {
            sample_rate_hz: format.sample_rate.get(),
            channels: format.channels.get(),
        })
    }

    fn start_converter(&mut self, info: &StreamInfo) -> Result<StreamFormat, OpenError> {
        let format = StreamFormat::validate(info).map_err(OpenError::Format)?;
        self.converter
            .configure(ConverterConfig {
                input_rate_hz: format.sample_rate.get(),
                output_rate_hz: OUTPUT_SAMPLE_RATE_HZ,
                channels: ChannelMap::STEREO,
            })
            .map_err(OpenError::Converter)?;
        self.converter.start().map_err(OpenError::Converter)?;
        Ok(format)
    }

    fn answer_open(&self, reply: ReplyHandle, result: Result<OpenInfo, OpenError>) {
        match self.replies.get(reply) {
            Some(listener) => listener.open_done(result),
            None => error!("decode: unknown reply handle {}", reply.index()),
        }
    }

    fn close_stream(&mut self, reply: ReplyHandle) {
        self.codec.close();
        self.format = None;
        match self.replies.get(reply) {
            Some(listener) => listener.close_done(),
            None => error!("decode: unknown reply handle {}", reply.index()),
        }
    }

    /// Abort immediately: discard queued converter data, silence output.
    fn stop_now(&mut self) -> DecodeState {
        self.converter.clear_stop();
        self.finish_stop();
        DecodeState::Stopped
    }

    fn finish_stop(&mut self) {
        self.in_flight = [false; DECODE_BUFFER_COUNT];
        if self.audio_out.request_zero_out().is_err() {
            warn!("decode: audio out mailbox full, zero out not requested");
        }
        self.set_status(PlayStatus::Stop);
    }

    /// Run one fill pass; on failure start the flush path.
    fn after_fill(
        &mut self,
        fill: fn(&mut Self, usize, usize) -> bool,
        first: usize,
        count: usize,
    ) -> DecodeState {
        if fill(self, first, count) {
            return self.state;
        }
        if self.converter.flush_and_stop().is_ok() {
            DecodeState::StopPreparing
        } else {
            warn!("decode: converter refused flush");
            self.finish_stop();
            DecodeState::Stopped
        }
    }

    // ── Data pump ───────────────────────────────────────────────────────────

    /// Decode into the free buffers of `first..first + count` until one comes
    /// back empty, then write every filled buffer. Fails if nothing was
    /// decoded or the converter refused a write.
    fn fill_with_audio(&mut self, first: usize, count: usize) -> bool {
        let Some(format) = self.format else {
            return false;
        };
        let in_flight = self.in_flight;
        let mut filled: Vec<(usize, usize), DECODE_BUFFER_COUNT> = Vec::new();
        let mut free = self
            .buffers
            .iter_mut()
            .enumerate()
            .skip(first)
            .take(count)
            .filter(|(index, _)| !is_in_flight(&in_flight, *index))
            .peekable();
        if free.peek().is_none() {
            return true;
        }
        for (index, buffer) in free {
            let samples = decode_into(&mut self.codec, buffer, &format, &mut self.decoded_frames);
            if samples == 0 {
                break;
            }
            if filled.push((index, samples)).is_err() {
                break;
            }
        }
        if filled.is_empty() {
            debug!("decode: end of stream");
            return false;
        }

        for &(index, samples) in &filled {
            let Some(data) = self.buffers.get(index).and_then(|b| b.get(..samples)) else {
                return false;
            };
            let Ok(tag) = u8::try_from(index) else {
                return false;
            };
            if self.converter.write(tag, data).is_err() {
                warn!("decode: converter refused buffer {}", index);
                return false;
            }
            mark_in_flight(&mut self.in_flight, index);
        }

        let secs = audio_types::seconds(self.decoded_frames, format.sample_rate);
        if let Some(report) = self.clock.set_play_secs(secs) {
            self.status.play_status(report);
        }
        true
    }

    /// Write one zeroed pause unit from each free buffer of
    /// `first..first + count`.
    fn fill_with_silence(&mut self, first: usize, count: usize) -> bool {
        let converter = &mut self.converter;
        let in_flight = &mut self.in_flight;
        for (index, buffer) in self.buffers.iter_mut().enumerate().skip(first).take(count) {
            if is_in_flight(in_flight, index) {
                continue;
            }
            let Some(unit) = buffer.get_mut(..PAUSE_UNIT_SAMPLES) else {
                return false;
            };
            unit.fill(0);
            let Ok(tag) = u8::try_from(index) else {
                return false;
            };
            if converter.write(tag, unit).is_err() {
                warn!("decode: converter refused pause unit {}", index);
                return false;
            }
            mark_in_flight(in_flight, index);
        }
        true
    }

    /// Take a converter write completion. Only a buffer the converter holds
    /// may be refilled; anything else is dropped.
    fn complete_write(&mut self, buffer: u8) -> Option<usize> {
        let index = usize::from(buffer);
        match self.in_flight.get_mut(index) {
            Some(busy) if *busy => {
                *busy = false;
                Some(index)
            }
            Some(_) => {
                warn!("decode: completion for buffer {} not at the converter", buffer);
                None
            }
            None => {
                error!("decode: write completion for unknown buffer {}", buffer);
                None
            }
        }
    }

    fn set_status(&mut self, status: PlayStatus) {
        if let Some(report) = self.clock.set_status(status) {
            self.status.play_status(report);
        }
    }
}

fn is_in_flight(in_flight: &[bool; DECODE_BUFFER_COUNT], index: usize) -> bool {
    in_flight.get(index).copied().unwrap_or(false)
}

fn mark_in_flight(in_flight: &mut [bool; DECODE_BUFFER_COUNT], index: usize) {
    if let Some(busy) = in_flight.get_mut(index) {
        *busy = true;
    }
}

/// Fill `buffer` with whole codec blocks while another worst-case block
/// still fits. Returns the number of interleaved samples written.
fn decode_into<C: StreamCodec>(
    codec: &mut C,
    buffer: &mut DecodeBuffer,
    format: &StreamFormat,
    decoded_frames: &mut u64,
) -> usize {
    let mut acc = PcmAccumulator::new(buffer, format, *decoded_frames);
    while acc.room() >= MAX_BLOCK_SAMPLES {
        let before = acc.len();
        match codec.decode_next(&mut acc) {
            Ok(BlockStatus::Decoded) if acc.len() > before => {}
            Ok(_) => break,
            Err(_) => {
                warn!("decode: codec error");
                break;
            }
        }
    }
    *decoded_frames = acc.decoded_frames();
    acc.len()
}
