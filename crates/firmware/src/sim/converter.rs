//! Sample-rate converter backed by rubato.
//!
//! Both halves share one core. Writes are converted as soon as they
//! arrive and the result is queued for the read side; a write is only
//! reported finished once the queue has drained below
//! [`HIGH_WATER_SAMPLES`], which paces the decoder to the DAC.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::config::{BYTES_PER_SAMPLE, OUTPUT_PADDING_BITS, PCM_SLOT_COUNT, SLOT_SAMPLES};
use platform::{
    ChannelMap, ConverterConfig, ConverterInput, ConverterOutput, DriverError, SlotBank, SlotId,
};
use playback::{AudioOutMsg, DecodeMsg};
use rubato::{FftFixedIn, Resampler};

use super::Relay;

/// Input frames per rubato chunk.
pub const CHUNK_FRAMES: usize = 1024;

/// Converted samples held before writes stop completing.
pub const HIGH_WATER_SAMPLES: usize = SLOT_SAMPLES * PCM_SLOT_COUNT;

const FULL_SCALE: f32 = 2_147_483_648.0;

#[allow(clippy::cast_precision_loss)]
fn to_f32(sample: i32) -> f32 {
    sample as f32 / FULL_SCALE
}

#[allow(clippy::cast_possible_truncation)]
fn to_container(value: f32) -> i32 {
    let scaled = (value * FULL_SCALE).clamp(-FULL_SCALE, FULL_SCALE - 256.0);
    pad(scaled as i32)
}

/// Clear the padding bits below the DAC's sample width.
fn pad(sample: i32) -> i32 {
    sample & !(1i32.wrapping_shl(OUTPUT_PADDING_BITS).wrapping_sub(1))
}

struct Core<'a, M: RawMutex, F> {
    decode: &'a Relay<M, DecodeMsg<F>>,
    audio_out: &'a Relay<M, AudioOutMsg>,
    bank: &'a SlotBank<M>,
    resampler: Option<FftFixedIn<f32>>,
    map: ChannelMap,
    staged: [Vec<f32>; 2],
    converted: VecDeque<i32>,
    held_writes: VecDeque<u8>,
    pending_reads: VecDeque<SlotId>,
    running: bool,
    flushing: bool,
}

impl<M: RawMutex, F> Core<'_, M, F> {
    fn discard(&mut self) {
        for plane in &mut self.staged {
            plane.clear();
        }
        self.converted.clear();
        self.held_writes.clear();
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
    }

    fn stage(&mut self, samples: &[i32]) {
        for frame in samples.chunks_exact(2) {
            let left = frame.get(usize::from(self.map.out0)).copied().unwrap_or(0);
            let right = frame.get(usize::from(self.map.out1)).copied().unwrap_or(0);
            if self.resampler.is_some() {
                let [l, r] = &mut self.staged;
                l.push(to_f32(left));
                r.push(to_f32(right));
            } else {
                self.converted.push_back(pad(left));
                self.converted.push_back(pad(right));
            }
        }
    }

    /// Run every full chunk through the resampler; with `flush`, also the
    /// partial tail and the resampler's delay line.
    fn resample(&mut self, flush: bool) -> Result<(), DriverError> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(());
        };
        loop {
            let needed = resampler.input_frames_next();
            let [l, r] = &mut self.staged;
            let out = if l.len() >= needed {
                let input = [
                    l.get(..needed).unwrap_or_default(),
                    r.get(..needed).unwrap_or_default(),
                ];
                let out = resampler.process(&input, None).map_err(|_| DriverError::Transfer)?;
                l.drain(..needed);
                r.drain(..needed);
                out
            } else if flush && !l.is_empty() {
                let input = [l.as_slice(), r.as_slice()];
                let out = resampler
                    .process_partial(Some(input.as_slice()), None)
                    .map_err(|_| DriverError::Transfer)?;
                l.clear();
                r.clear();
                out
            } else if flush {
                let out = resampler
                    .process_partial::<&[f32]>(None, None)
                    .map_err(|_| DriverError::Transfer)?;
                interleave(&out, &mut self.converted);
                return Ok(());
            } else {
                return Ok(());
            };
            interleave(&out, &mut self.converted);
        }
    }

    fn serve(&mut self) {
        while let Some(&slot) = self.pending_reads.front() {
            let take = if self.converted.len() >= SLOT_SAMPLES {
                SLOT_SAMPLES
            } else if !self.running {
                self.converted.len()
            } else {
                break;
            };
            self.pending_reads.pop_front();
            let converted = &mut self.converted;
            let _ = self.bank.with_slot_mut(slot, |samples| {
                for (dst, src) in samples.iter_mut().zip(converted.drain(..take)) {
                    *dst = src;
                }
            });
            let bytes = take.saturating_mul(BYTES_PER_SAMPLE);
            self.audio_out.push(AudioOutMsg::ReadFinished {
                result: Ok(()),
                slot: slot.index(),
                bytes: u32::try_from(bytes).unwrap_or(u32::MAX),
            });
        }

        while self.converted.len() < HIGH_WATER_SAMPLES {
            let Some(buffer) = self.held_writes.pop_front() else {
                break;
            };
            self.decode.push(DecodeMsg::WriteFinished {
                result: Ok(()),
                buffer,
            });
        }

        if self.flushing && self.converted.is_empty() {
            self.flushing = false;
            self.decode.push(DecodeMsg::FlushFinished { result: Ok(()) });
        }
    }
}

fn interleave(planes: &[Vec<f32>], into: &mut VecDeque<i32>) {
    let [l, r, ..] = planes else {
        return;
    };
    for (&left, &right) in l.iter().zip(r) {
        into.push_back(to_container(left));
        into.push_back(to_container(right));
    }
}

/// Shared handle to a simulated converter.
pub struct RateConverter<'a, M: RawMutex, F> {
    core: Rc<RefCell<Core<'a, M, F>>>,
}

/// Write half, owned by the decode actor.
pub struct RateConverterInput<'a, M: RawMutex, F> {
    core: Rc<RefCell<Core<'a, M, F>>>,
}

/// Read half, owned by the audio output actor.
pub struct RateConverterOutput<'a, M: RawMutex, F> {
    core: Rc<RefCell<Core<'a, M, F>>>,
}

impl<'a, M: RawMutex, F> RateConverter<'a, M, F> {
    /// A stopped converter filling slots of `bank`.
    ///
    /// Write and flush completions go to `decode`, read completions to
    /// `audio_out`.
    pub fn new(
        decode: &'a Relay<M, DecodeMsg<F>>,
        audio_out: &'a Relay<M, AudioOutMsg>,
        bank: &'a SlotBank<M>,
    ) -> Self {
        Self {
            core: Rc::new(RefCell::new(Core {
                decode,
                audio_out,
                bank,
                resampler: None,
                map: ChannelMap::STEREO,
                staged: [Vec::new(), Vec::new()],
                converted: VecDeque::new(),
                held_writes: VecDeque::new(),
                pending_reads: VecDeque::new(),
                running: false,
                flushing: false,
            })),
        }
    }

    /// The write half.
    pub fn input(&self) -> RateConverterInput<'a, M, F> {
        RateConverterInput {
            core: Rc::clone(&self.core),
        }
    }

    /// The read half.
    pub fn output(&self) -> RateConverterOutput<'a, M, F> {
        RateConverterOutput {
            core: Rc::clone(&self.core),
        }
    }

    /// Converted samples not yet read out.
    pub fn queued_samples(&self) -> usize {
        self.core.borrow().converted.len()
    }
}

impl<M: RawMutex, F> ConverterInput for RateConverterInput<'_, M, F> {
    fn configure(&mut self, config: ConverterConfig) -> Result<(), DriverError> {
        let mut core = self.core.borrow_mut();
        core.resampler = if config.input_rate_hz == config.output_rate_hz {
            None
        } else {
            let input = usize::try_from(config.input_rate_hz).map_err(|_| DriverError::Config)?;
            let output = usize::try_from(config.output_rate_hz).map_err(|_| DriverError::Config)?;
            Some(FftFixedIn::new(input, output, CHUNK_FRAMES, 2, 2).map_err(|_| DriverError::Config)?)
        };
        core.map = config.channels;
        core.discard();
        debug!(
            "converter: {} Hz -> {} Hz",
            config.input_rate_hz, config.output_rate_hz
        );
        Ok(())
    }

    fn start(&mut self) -> Result<(), DriverError> {
        let mut core = self.core.borrow_mut();
        core.discard();
        core.running = true;
        core.flushing = false;
        Ok(())
    }

    fn write(&mut self, buffer: u8, samples: &[i32]) -> Result<(), DriverError> {
        let mut core = self.core.borrow_mut();
        if !core.running {
            return Err(DriverError::Rejected);
        }
        core.stage(samples);
        core.resample(false)?;
        core.held_writes.push_back(buffer);
        core.serve();
        Ok(())
    }

    fn flush_and_stop(&mut self) -> Result<(), DriverError> {
        let mut core = self.core.borrow_mut();
        if !core.running {
            return Err(DriverError::Rejected);
        }
        core.resample(true)?;
        core.running = false;
        core.flushing = true;
        core.held_writes.clear();
        core.serve();
        Ok(())
    }

    fn clear_stop(&mut self) {
        let mut core = self.core.borrow_mut();
        core.discard();
        core.running = false;
        core.flushing = false;
        core.serve();
    }
}

impl<M: RawMutex, F> ConverterOutput for RateConverterOutput<'_, M, F> {
    fn read(&mut self, slot: SlotId) -> Result<(), DriverError> {
        let mut core = self.core.borrow_mut();
        if core.pending_reads.len() >= PCM_SLOT_COUNT {
            return Err(DriverError::Rejected);
        }
        core.pending_reads.push_back(slot);
        core.serve();
        Ok(())
    }
}
