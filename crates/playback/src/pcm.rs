//! Expansion of decoded blocks into interleaved stereo output containers.
//!
//! Every decoded sample is shifted to the top of a 32-bit container (24-bit
//! data, low byte padding) and mono sources are written to both channels,
//! so the converter always sees the same layout.

use platform::config::{MAX_BLOCK_FRAMES, OUTPUT_CHANNELS};
use platform::{BlockHeader, BlockSink, ChannelCount, StreamFormat};

/// Appends decoded blocks to one decode buffer.
pub struct PcmAccumulator<'b> {
    buffer: &'b mut [i32],
    len: usize,
    shift: u32,
    channels: ChannelCount,
    decoded_frames: u64,
}

impl<'b> PcmAccumulator<'b> {
    /// Start filling `buffer` from its beginning. `decoded_frames` is the
    /// stream position reached so far.
    pub fn new(buffer: &'b mut [i32], format: &StreamFormat, decoded_frames: u64) -> Self {
        Self {
            buffer,
            len: 0,
            shift: format.bits.container_shift(),
            channels: format.channels,
            decoded_frames,
        }
    }

    /// Interleaved samples written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free room in samples.
    pub fn room(&self) -> usize {
        self.buffer.len().saturating_sub(self.len)
    }

    /// Stream position after the last accepted block.
    pub fn decoded_frames(&self) -> u64 {
        self.decoded_frames
    }
}

impl BlockSink for PcmAccumulator<'_> {
    fn write_block(&mut self, header: BlockHeader, planes: &[&[i32]]) -> bool {
        let Ok(frames) = usize::try_from(header.frames) else {
            return false;
        };
        if frames > MAX_BLOCK_FRAMES {
            return false;
        }
        let (left, right) = match (self.channels, planes) {
            (ChannelCount::Mono, [mono, ..]) => (*mono, *mono),
            (ChannelCount::Stereo, [left, right, ..]) => (*left, *right),
            _ => return false,
        };
        let (Some(left), Some(right)) = (left.get(..frames), right.get(..frames)) else {
            return false;
        };
        let needed = frames.saturating_mul(OUTPUT_CHANNELS);
        let end = self.len.saturating_add(needed);
        let Some(out) = self.buffer.get_mut(self.len..end) else {
            return false;
        };

        let shift = self.shift;
        for (frame, (l, r)) in out.chunks_exact_mut(OUTPUT_CHANNELS).zip(left.iter().zip(right)) {
            if let [out_l, out_r] = frame {
                *out_l = l.wrapping_shl(shift);
                *out_r = r.wrapping_shl(shift);
            }
        }
        self.len = end;
        self.decoded_frames = match header.first_frame {
            Some(first) => first.saturating_add(u64::from(header.frames)),
            None => self.decoded_frames.saturating_add(u64::from(header.frames)),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::StreamInfo;

    fn format(channels: u8, bits: u8) -> StreamFormat {
        StreamFormat::validate(&StreamInfo {
            sample_rate: 44_100,
            channels,
            bits_per_sample: bits,
            total_frames: 0,
        })
        .unwrap()
    }

    #[test]
    fn stereo_16_bit_is_left_justified() {
        let mut buf = [0i32; 8];
        let fmt = format(2, 16);
        let mut acc = PcmAccumulator::new(&mut buf, &fmt, 0);
        let header = BlockHeader { first_frame: None, frames: 2 };
        assert!(acc.write_block(header, &[&[1, -1], &[2, -2]]));
        assert_eq!(acc.len(), 4);
        assert_eq!(acc.decoded_frames(), 2);
        assert_eq!(&buf[..4], &[1 << 16, -1 << 16, 2 << 16, -2 << 16]);
    }

    #[test]
    fn mono_24_bit_is_duplicated() {
        let mut buf = [0i32; 4];
        let fmt = format(1, 24);
        let mut acc = PcmAccumulator::new(&mut buf, &fmt, 0);
        let header = BlockHeader { first_frame: None, frames: 2 };
        assert!(acc.write_block(header, &[&[0x7f_ffff, 3]]));
        assert_eq!(buf, [0x7f_ffff << 8, 0x7f_ffff << 8, 3 << 8, 3 << 8]);
    }

    #[test]
    fn header_position_overrides_running_count() {
        let mut buf = [0i32; 16];
        let fmt = format(2, 16);
        let mut acc = PcmAccumulator::new(&mut buf, &fmt, 5);
        let header = BlockHeader { first_frame: Some(1000), frames: 3 };
        assert!(acc.write_block(header, &[&[0; 3], &[0; 3]]));
        assert_eq!(acc.decoded_frames(), 1003);
    }

    #[test]
    fn refuses_block_without_room() {
        let mut buf = [0i32; 6];
        let fmt = format(2, 16);
        let mut acc = PcmAccumulator::new(&mut buf, &fmt, 0);
        let header = BlockHeader { first_frame: None, frames: 4 };
        assert!(!acc.write_block(header, &[&[0; 4], &[0; 4]]));
        assert!(acc.is_empty());
        assert_eq!(acc.decoded_frames(), 0);
    }

    #[test]
    fn refuses_oversized_block() {
        let mut buf = vec![0i32; (MAX_BLOCK_FRAMES + 1) * 2];
        let plane = vec![0i32; MAX_BLOCK_FRAMES + 1];
        let fmt = format(1, 16);
        let mut acc = PcmAccumulator::new(&mut buf, &fmt, 0);
        let frames = u32::try_from(MAX_BLOCK_FRAMES + 1).unwrap();
        let header = BlockHeader { first_frame: None, frames };
        assert!(!acc.write_block(header, &[&plane]));
    }

    #[test]
    fn stereo_stream_needs_two_planes() {
        let mut buf = [0i32; 8];
        let fmt = format(2, 16);
        let mut acc = PcmAccumulator::new(&mut buf, &fmt, 0);
        let header = BlockHeader { first_frame: None, frames: 1 };
        assert!(!acc.write_block(header, &[&[1]]));
    }
}
