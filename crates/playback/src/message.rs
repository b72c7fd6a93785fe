//! Messages carried by the decode and audio output mailboxes.
//!
//! Requests and driver completions share one enum per actor, so each actor
//! sees a single FIFO of everything that can change its state.

use platform::{CodecError, DriverError, PlayStatus, SlotId, StreamSpecError};
use thiserror_no_std::Error;

use crate::reply::ReplyHandle;

/// Mail for the audio output actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOutMsg {
    /// Start pulling converted samples; answer through `reply`.
    DataOut {
        /// Listener to receive the accepted/refused answer.
        reply: ReplyHandle,
    },
    /// Stop pulling; drain what is already queued.
    ZeroOut,
    /// A converter read completed.
    ReadFinished {
        /// Driver-level outcome.
        result: Result<(), DriverError>,
        /// Raw slot tag echoed by the driver; validated on receipt.
        slot: usize,
        /// Bytes written into the slot.
        bytes: u32,
    },
    /// A DAC write completed and the slot is free again.
    WriteFinished {
        /// Driver-level outcome.
        result: Result<(), DriverError>,
        /// The slot that was played.
        slot: SlotId,
    },
}

/// Mail for the decode actor. `F` is the media volume's file handle type.
#[derive(Debug)]
pub enum DecodeMsg<F> {
    /// Open `file` and parse its metadata; answer through `reply`.
    Open {
        /// Opened track file. Ownership passes to the codec.
        file: F,
        /// Listener to receive the open result.
        reply: ReplyHandle,
    },
    /// Start playback of the opened stream.
    Play,
    /// Pause playback (silence is fed to the converter).
    PauseOn,
    /// Resume playback.
    PauseOff,
    /// Stop playback immediately.
    Stop,
    /// Release the stream; answer through `reply`.
    Close {
        /// Listener to receive the close acknowledgement.
        reply: ReplyHandle,
    },
    /// The audio output actor answered a data-out request.
    DataOutDone {
        /// Whether audio output accepted the request.
        accepted: bool,
    },
    /// A converter write completed; the buffer may be refilled.
    WriteFinished {
        /// Driver-level outcome.
        result: Result<(), DriverError>,
        /// Decode buffer tag echoed by the driver.
        buffer: u8,
    },
    /// The converter finished flushing and stopped.
    FlushFinished {
        /// Driver-level outcome.
        result: Result<(), DriverError>,
    },
}

impl<F> DecodeMsg<F> {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Play => "play",
            Self::PauseOn => "pause-on",
            Self::PauseOff => "pause-off",
            Self::Stop => "stop",
            Self::Close { .. } => "close",
            Self::DataOutDone { .. } => "data-out-done",
            Self::WriteFinished { .. } => "write-finished",
            Self::FlushFinished { .. } => "flush-finished",
        }
    }
}

/// Stream parameters reported by a successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpenInfo {
    /// Source sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Source channel count.
    pub channels: u8,
}

/// Why an open request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
    /// The codec could not parse the stream.
    #[error("codec error: {0}")]
    Codec(CodecError),
    /// The stream parsed but its shape is not playable.
    #[error("unsupported stream: {0}")]
    Format(StreamSpecError),
    /// The converter refused the configuration or would not start.
    #[error("converter error: {0}")]
    Converter(DriverError),
    /// A stream is already open.
    #[error("decoder busy")]
    Busy,
}

/// Playback status as echoed by the decode actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayReport {
    /// Current status.
    pub status: PlayStatus,
    /// Whole seconds decoded.
    pub play_secs: u32,
    /// Whole seconds in the stream.
    pub total_secs: u32,
}
