//! Stream decoder contract.
//!
//! The codec is a black box that turns a byte stream into blocks of planar
//! integer PCM. It does not know about output containers or stereo
//! expansion; the playback core does that in its [`BlockSink`].

use thiserror_no_std::Error;

/// Stream metadata as reported by the codec, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamInfo {
    /// Source sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u8,
    /// Bits per sample.
    pub bits_per_sample: u8,
    /// Total frames in the stream (0 when unknown).
    pub total_frames: u64,
}

/// Position information for one decoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockHeader {
    /// Absolute index of the block's first frame, when the stream carries it.
    pub first_frame: Option<u64>,
    /// Frames per channel in this block.
    pub frames: u32,
}

/// Result of asking the codec for one more block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockStatus {
    /// A block was handed to the sink (the sink may still have refused it).
    Decoded,
    /// No more blocks.
    EndOfStream,
}

/// Errors a [`StreamCodec`] may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// The bitstream is corrupt.
    #[error("invalid stream data")]
    InvalidData,
    /// The underlying file could not be read.
    #[error("read error")]
    Io,
    /// The stream uses a feature the codec does not implement.
    #[error("unsupported stream")]
    Unsupported,
    /// `decode_next` was called with no stream open.
    #[error("no stream open")]
    NotOpen,
}

/// Receives decoded blocks, one plane (channel) slice per source channel.
pub trait BlockSink {
    /// Accept one block. Returns `false` to refuse it (e.g. no room).
    fn write_block(&mut self, header: BlockHeader, planes: &[&[i32]]) -> bool;
}

/// A block-oriented stream decoder.
pub trait StreamCodec {
    /// The byte source a stream is decoded from (a file handle).
    type Stream;

    /// Take ownership of `stream` and decode up to the end of its metadata.
    fn open(&mut self, stream: Self::Stream) -> Result<StreamInfo, CodecError>;

    /// Decode one block and hand it to `sink`.
    fn decode_next(&mut self, sink: &mut dyn BlockSink) -> Result<BlockStatus, CodecError>;

    /// Release the stream and all decoder state. Closing never fails.
    fn close(&mut self);
}
