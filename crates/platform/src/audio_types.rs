//! Audio domain newtypes for the accepted input stream shape.
//!
//! A stream that reaches the decode pipeline has already been through
//! [`StreamFormat::validate`], so downstream code never re-checks channel
//! counts or bit depths:
//! - `SampleRateHz`: 22 050–96 000 Hz source rates
//! - `ChannelCount`: mono or stereo
//! - `BitDepth`: 16 or 24 bits per sample

use thiserror_no_std::Error;

use crate::codec::StreamInfo;
use crate::config::{
    INPUT_MAX_CHANNELS, INPUT_MAX_SAMPLE_RATE_HZ, INPUT_MIN_SAMPLE_RATE_HZ,
    OUTPUT_BITS_PER_SAMPLE, OUTPUT_PADDING_BITS,
};

// ── Error types ──────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{value} is outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

/// Why a stream was rejected at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamSpecError {
    /// Channel count is zero or above stereo.
    #[error("unsupported channel count")]
    Channels(OutOfRangeError),
    /// Bits per sample is neither 16 nor 24.
    #[error("unsupported bit depth {0}")]
    BitDepth(u8),
    /// Source rate is outside the converter's input range.
    #[error("unsupported sample rate")]
    SampleRate(OutOfRangeError),
}

const CONTAINER_BITS: u32 = OUTPUT_BITS_PER_SAMPLE + OUTPUT_PADDING_BITS;
const SHIFT_16: u32 = CONTAINER_BITS - 16;
const SHIFT_24: u32 = CONTAINER_BITS - 24;

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Source sample rate in Hz, validated to the converter's input range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum accepted source rate.
    pub const MIN_HZ: u32 = INPUT_MIN_SAMPLE_RATE_HZ;

    /// Maximum accepted source rate.
    pub const MAX_HZ: u32 = INPUT_MAX_SAMPLE_RATE_HZ;

    /// Create a `SampleRateHz`, returning an error if out of range.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz` is below [`Self::MIN_HZ`] or above
    /// [`Self::MAX_HZ`].
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_HZ..=Self::MAX_HZ).contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── ChannelCount ─────────────────────────────────────────────────────────────

/// Source channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelCount {
    /// One channel, duplicated to both DAC channels.
    Mono,
    /// Two interleaved channels.
    Stereo,
}

impl ChannelCount {
    /// Map a raw channel count onto the supported layouts.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] for zero or more than two channels.
    pub fn new(channels: u8) -> Result<Self, OutOfRangeError> {
        match channels {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            other => Err(OutOfRangeError {
                value: u32::from(other),
                min: 1,
                max: u32::from(INPUT_MAX_CHANNELS),
            }),
        }
    }

    /// Raw channel count.
    #[must_use]
    pub fn get(self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

// ── BitDepth ─────────────────────────────────────────────────────────────────

/// Source sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitDepth {
    /// 16 bits per sample.
    Bits16,
    /// 24 bits per sample.
    Bits24,
}

impl BitDepth {
    /// Map a raw bits-per-sample value onto the supported widths.
    ///
    /// # Errors
    ///
    /// Returns [`StreamSpecError::BitDepth`] for anything but 16 or 24.
    pub fn new(bits: u8) -> Result<Self, StreamSpecError> {
        match bits {
            16 => Ok(Self::Bits16),
            24 => Ok(Self::Bits24),
            other => Err(StreamSpecError::BitDepth(other)),
        }
    }

    /// Raw bits per sample.
    #[must_use]
    pub fn get(self) -> u8 {
        match self {
            Self::Bits16 => 16,
            Self::Bits24 => 24,
        }
    }

    /// Left shift that places a sample of this width at the top of the
    /// 32-bit output container.
    #[must_use]
    pub fn container_shift(self) -> u32 {
        match self {
            Self::Bits16 => SHIFT_16,
            Self::Bits24 => SHIFT_24,
        }
    }
}

// ── StreamFormat ─────────────────────────────────────────────────────────────

/// A stream shape the pipeline can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamFormat {
    /// Source sample rate.
    pub sample_rate: SampleRateHz,
    /// Source channel layout.
    pub channels: ChannelCount,
    /// Source sample width.
    pub bits: BitDepth,
    /// Frames in the whole stream as declared by its metadata (0 if unknown).
    pub total_frames: u64,
}

impl StreamFormat {
    /// Check codec metadata against the accepted input range.
    ///
    /// Checks run in the order channels, bit depth, sample rate; the first
    /// failure is reported.
    ///
    /// # Errors
    ///
    /// Returns the first [`StreamSpecError`] found.
    pub fn validate(info: &StreamInfo) -> Result<Self, StreamSpecError> {
        let channels = ChannelCount::new(info.channels).map_err(StreamSpecError::Channels)?;
        let bits = BitDepth::new(info.bits_per_sample)?;
        let sample_rate = SampleRateHz::new(info.sample_rate).map_err(StreamSpecError::SampleRate)?;
        Ok(Self {
            sample_rate,
            channels,
            bits,
            total_frames: info.total_frames,
        })
    }

    /// Whole seconds of audio in the stream.
    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        seconds(self.total_frames, self.sample_rate)
    }
}

/// Whole seconds covered by `frames` at `rate`, saturating at `u32::MAX`.
#[must_use]
pub fn seconds(frames: u64, rate: SampleRateHz) -> u32 {
    // rate is never zero: SampleRateHz enforces MIN_HZ > 0.
    let secs = frames.checked_div(u64::from(rate.get())).unwrap_or(0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
