//! Property-based tests for stream validation and play-time math.
//! Verifies invariants hold for ALL inputs, not just fixed examples.
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use platform::audio_types::{
    seconds, BitDepth, ChannelCount, SampleRateHz, StreamFormat, StreamSpecError,
};
use platform::config::{OUTPUT_BITS_PER_SAMPLE, OUTPUT_PADDING_BITS};
use platform::StreamInfo;
use proptest::prelude::*;

fn info(sample_rate: u32, channels: u8, bits_per_sample: u8) -> StreamInfo {
    StreamInfo {
        sample_rate,
        channels,
        bits_per_sample,
        total_frames: 0,
    }
}

proptest! {
    /// A rate is accepted exactly when it lies in the converter's input range.
    #[test]
    fn sample_rate_accepts_only_its_range(hz in any::<u32>()) {
        let in_range = (SampleRateHz::MIN_HZ..=SampleRateHz::MAX_HZ).contains(&hz);
        match SampleRateHz::new(hz) {
            Ok(rate) => {
                prop_assert!(in_range);
                prop_assert_eq!(rate.get(), hz);
            }
            Err(err) => {
                prop_assert!(!in_range);
                prop_assert_eq!(err.value, hz);
            }
        }
    }

    /// Only mono and stereo survive, and the count round-trips.
    #[test]
    fn channel_count_is_mono_or_stereo(n in any::<u8>()) {
        match ChannelCount::new(n) {
            Ok(c) => prop_assert_eq!(c.get(), n),
            Err(_) => prop_assert!(n == 0 || n > 2),
        }
    }

    /// A sample shifted into the container never loses its top bit.
    #[test]
    fn container_shift_fills_the_output_word(bits in prop_oneof![Just(16u8), Just(24u8)]) {
        let depth = BitDepth::new(bits).unwrap();
        let used = u32::from(depth.get()) + depth.container_shift();
        prop_assert_eq!(used, OUTPUT_BITS_PER_SAMPLE + OUTPUT_PADDING_BITS);
    }

    /// Channels are checked before the bit depth, the bit depth before the rate.
    #[test]
    fn validation_reports_the_first_failure(
        hz in any::<u32>(),
        channels in any::<u8>(),
        bits in any::<u8>(),
    ) {
        let result = StreamFormat::validate(&info(hz, channels, bits));
        if ChannelCount::new(channels).is_err() {
            prop_assert!(matches!(result, Err(StreamSpecError::Channels(_))));
        } else if BitDepth::new(bits).is_err() {
            prop_assert_eq!(result, Err(StreamSpecError::BitDepth(bits)));
        } else if SampleRateHz::new(hz).is_err() {
            prop_assert!(matches!(result, Err(StreamSpecError::SampleRate(_))));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// Seconds never decrease as frames accumulate.
    #[test]
    fn seconds_are_monotonic(
        hz in SampleRateHz::MIN_HZ..=SampleRateHz::MAX_HZ,
        a in any::<u64>(),
        b in any::<u64>(),
    ) {
        let rate = SampleRateHz::new(hz).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(seconds(lo, rate) <= seconds(hi, rate));
    }

    /// One second of frames at any rate is exactly one second.
    #[test]
    fn one_second_of_frames(hz in SampleRateHz::MIN_HZ..=SampleRateHz::MAX_HZ, extra in 0u64..1000) {
        let rate = SampleRateHz::new(hz).unwrap();
        prop_assert_eq!(seconds(u64::from(hz) + extra, rate), 1);
    }
}

#[test]
fn absurd_frame_counts_saturate() {
    let rate = SampleRateHz::new(SampleRateHz::MIN_HZ).unwrap();
    assert_eq!(seconds(u64::MAX, rate), u32::MAX);
}
