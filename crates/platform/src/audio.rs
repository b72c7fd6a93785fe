//! Sample-rate converter and DAC driver contracts.
//!
//! Every call here only *submits* a request and returns whether the driver
//! accepted it. The outcome arrives later as a completion message, which the
//! driver posts to the mailbox it was wired to at construction time:
//!
//! | Request                          | Completion delivered to | Tag            |
//! |----------------------------------|-------------------------|----------------|
//! | [`ConverterInput::write`]        | decode controller       | buffer index   |
//! | [`ConverterInput::flush_and_stop`] | decode controller     | none           |
//! | [`ConverterOutput::read`]        | audio output controller | [`SlotId`] + byte count |
//! | [`DacOutput::write`]             | audio output controller | [`SlotId`]     |
//!
//! The converter is split into two halves because the write side is driven
//! by the decode actor and the read side by the audio output actor.

use thiserror_no_std::Error;

use crate::slots::SlotId;

/// Driver-level failure: a request was refused or a transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The driver's request queue is full or it is stopped.
    #[error("request rejected")]
    Rejected,
    /// The transfer started but did not complete.
    #[error("transfer failed")]
    Transfer,
    /// Configuration was refused.
    #[error("unsupported configuration")]
    Config,
}

/// Which source channel feeds each converter output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap {
    /// Source channel routed to output channel 0.
    pub out0: u8,
    /// Source channel routed to output channel 1.
    pub out1: u8,
}

impl ChannelMap {
    /// Straight-through stereo: 0 → 0, 1 → 1.
    pub const STEREO: Self = Self { out0: 0, out1: 1 };
}

/// Converter setup for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConverterConfig {
    /// Rate of the samples written in.
    pub input_rate_hz: u32,
    /// Rate of the samples read out.
    pub output_rate_hz: u32,
    /// Output channel routing.
    pub channels: ChannelMap,
}

/// Write side of the sample-rate converter, owned by the decode actor.
pub trait ConverterInput {
    /// Configure rates and channel routing for the next stream.
    fn configure(&mut self, config: ConverterConfig) -> Result<(), DriverError>;

    /// Start conversion with the current configuration.
    fn start(&mut self) -> Result<(), DriverError>;

    /// Queue `samples` (interleaved stereo, 32-bit containers) for conversion.
    ///
    /// `buffer` is an opaque tag echoed back in the completion. The driver
    /// must be done with `samples` before it returns (copy or finish the
    /// transfer); the caller reuses the buffer after the completion arrives.
    fn write(&mut self, buffer: u8, samples: &[i32]) -> Result<(), DriverError>;

    /// Drain everything queued, then stop. Completion carries the result.
    fn flush_and_stop(&mut self) -> Result<(), DriverError>;

    /// Abort conversion immediately and discard queued data.
    fn clear_stop(&mut self);
}

/// Read side of the sample-rate converter, owned by the audio output actor.
pub trait ConverterOutput {
    /// Fill `slot` with the next converted samples.
    ///
    /// The completion reports how many bytes were written; fewer than a
    /// full slot marks the end of the converted stream.
    fn read(&mut self, slot: SlotId) -> Result<(), DriverError>;
}

/// DAC driver, owned by the audio output actor.
pub trait DacOutput {
    /// Play the contents of `slot`. The completion hands the slot back.
    fn write(&mut self, slot: SlotId) -> Result<(), DriverError>;
}
