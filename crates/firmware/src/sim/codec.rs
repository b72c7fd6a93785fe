//! FLAC stream codec backed by symphonia.

use std::boxed::Box;
use std::fs::File;
use std::vec::Vec;

use platform::{BlockHeader, BlockSink, BlockStatus, CodecError, StreamCodec, StreamInfo};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Most channels a FLAC stream can carry.
const MAX_CHANNELS: usize = 8;

struct OpenStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    /// symphonia scales samples to the full `i32` range; undo that.
    shift: u32,
}

/// Decodes FLAC files into planar integer PCM at the stream's own width.
#[derive(Default)]
pub struct FlacCodec {
    stream: Option<OpenStream>,
    planes: [Vec<i32>; MAX_CHANNELS],
}

impl FlacCodec {
    /// A codec with nothing open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stream is open.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

fn codec_error(err: &SymphoniaError) -> CodecError {
    match err {
        SymphoniaError::IoError(_) => CodecError::Io,
        SymphoniaError::Unsupported(_) => CodecError::Unsupported,
        _ => CodecError::InvalidData,
    }
}

fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

impl StreamCodec for FlacCodec {
    type Stream = File;

    fn open(&mut self, stream: File) -> Result<StreamInfo, CodecError> {
        self.close();
        let source = MediaSourceStream::new(Box::new(stream), MediaSourceStreamOptions::default());
        let mut hint = Hint::new();
        hint.with_extension("flac");
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| codec_error(&e))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(CodecError::Unsupported)?;
        let params = track.codec_params.clone();
        let track_id = track.id;

        let sample_rate = params.sample_rate.ok_or(CodecError::InvalidData)?;
        let channels = params
            .channels
            .map(|c| c.count())
            .and_then(|n| u8::try_from(n).ok())
            .ok_or(CodecError::InvalidData)?;
        let bits = params.bits_per_sample.ok_or(CodecError::InvalidData)?;
        let bits_per_sample = u8::try_from(bits).map_err(|_| CodecError::Unsupported)?;
        let shift = 32u32.checked_sub(bits).ok_or(CodecError::Unsupported)?;

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| codec_error(&e))?;

        debug!("flac: {} Hz, {} ch, {} bit", sample_rate, channels, bits);
        self.stream = Some(OpenStream {
            format,
            decoder,
            track_id,
            shift,
        });
        Ok(StreamInfo {
            sample_rate,
            channels,
            bits_per_sample,
            total_frames: params.n_frames.unwrap_or(0),
        })
    }

    fn decode_next(&mut self, sink: &mut dyn BlockSink) -> Result<BlockStatus, CodecError> {
        let stream = self.stream.as_mut().ok_or(CodecError::NotOpen)?;
        let packet = loop {
            match stream.format.next_packet() {
                Ok(packet) if packet.track_id() == stream.track_id => break packet,
                Ok(_) => {}
                Err(e) if is_end_of_stream(&e) => return Ok(BlockStatus::EndOfStream),
                Err(e) => return Err(codec_error(&e)),
            }
        };

        let decoded = stream.decoder.decode(&packet).map_err(|e| codec_error(&e))?;
        let AudioBufferRef::S32(buf) = decoded else {
            return Err(CodecError::Unsupported);
        };
        let channels = buf.spec().channels.count();
        if channels > MAX_CHANNELS {
            return Err(CodecError::Unsupported);
        }
        for (ch, plane) in self.planes.iter_mut().enumerate().take(channels) {
            plane.clear();
            plane.extend(buf.chan(ch).iter().map(|s| s.wrapping_shr(stream.shift)));
        }

        let header = BlockHeader {
            first_frame: Some(packet.ts()),
            frames: u32::try_from(buf.frames()).map_err(|_| CodecError::InvalidData)?,
        };
        let planes: heapless::Vec<&[i32], MAX_CHANNELS> = self
            .planes
            .iter()
            .take(channels)
            .map(Vec::as_slice)
            .collect();
        sink.write_block(header, &planes);
        Ok(BlockStatus::Decoded)
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("flac: closed");
        }
        for plane in &mut self.planes {
            plane.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct NullSink;

    impl BlockSink for NullSink {
        fn write_block(&mut self, _: BlockHeader, _: &[&[i32]]) -> bool {
            true
        }
    }

    #[test]
    fn decoding_before_open_is_refused() {
        let mut codec = FlacCodec::new();
        assert_eq!(codec.decode_next(&mut NullSink), Err(CodecError::NotOpen));
        codec.close();
        assert!(!codec.is_open());
    }

    #[test]
    fn garbage_is_not_a_stream() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[0x5a; 4096]).unwrap();
        let mut codec = FlacCodec::new();
        assert!(codec.open(file).is_err());
        assert!(!codec.is_open());
    }
}
