//! DAC that records the played slots into a WAV file.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::rc::Rc;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};
use hound::{SampleFormat, WavSpec, WavWriter};
use platform::config::{
    OUTPUT_BITS_PER_SAMPLE, OUTPUT_CHANNELS, OUTPUT_PADDING_BITS, OUTPUT_SAMPLE_RATE_HZ,
    PCM_SLOT_COUNT,
};
use platform::{DacOutput, DriverError, SlotBank, SlotId};
use playback::AudioOutMsg;

use super::Relay;

/// Format of the recorded file: the DAC's own output format.
#[allow(clippy::cast_possible_truncation)]
pub fn wav_spec() -> WavSpec {
    WavSpec {
        channels: OUTPUT_CHANNELS as u16,
        sample_rate: OUTPUT_SAMPLE_RATE_HZ,
        bits_per_sample: OUTPUT_BITS_PER_SAMPLE as u16,
        sample_format: SampleFormat::Int,
    }
}

struct DacCore<'a, M: RawMutex, W: Write + Seek> {
    bank: &'a SlotBank<M>,
    audio_out: &'a Relay<M, AudioOutMsg>,
    queue: VecDeque<SlotId>,
    writer: Option<WavWriter<W>>,
    slots_played: u64,
}

/// Plays one queued slot per period by appending it to a WAV writer.
///
/// Cloning gives another handle to the same DAC: one is owned by the audio
/// output actor, another drives [`WavDac::run`].
pub struct WavDac<'a, M: RawMutex, W: Write + Seek> {
    core: Rc<RefCell<DacCore<'a, M, W>>>,
}

impl<M: RawMutex, W: Write + Seek> Clone for WavDac<'_, M, W> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<'a, M: RawMutex> WavDac<'a, M, BufWriter<File>> {
    /// Record into a new file at `path`.
    pub fn create(
        path: &Path,
        bank: &'a SlotBank<M>,
        audio_out: &'a Relay<M, AudioOutMsg>,
    ) -> Result<Self, hound::Error> {
        Ok(Self::new(WavWriter::create(path, wav_spec())?, bank, audio_out))
    }
}

impl<'a, M: RawMutex, W: Write + Seek> WavDac<'a, M, W> {
    /// Record through `writer`; completions go to `audio_out`.
    pub fn new(writer: WavWriter<W>, bank: &'a SlotBank<M>, audio_out: &'a Relay<M, AudioOutMsg>) -> Self {
        Self {
            core: Rc::new(RefCell::new(DacCore {
                bank,
                audio_out,
                queue: VecDeque::new(),
                writer: Some(writer),
                slots_played: 0,
            })),
        }
    }

    /// Slots played so far.
    pub fn slots_played(&self) -> u64 {
        self.core.borrow().slots_played
    }

    /// Slots queued and not yet played.
    pub fn queued(&self) -> usize {
        self.core.borrow().queue.len()
    }

    /// Play the oldest queued slot. Returns `false` if nothing was queued.
    pub fn play_next(&self) -> bool {
        let mut core = self.core.borrow_mut();
        let Some(slot) = core.queue.pop_front() else {
            return false;
        };
        let core = &mut *core;
        let result = match core.writer.as_mut() {
            Some(writer) => core
                .bank
                .with_slot(slot, |samples| {
                    samples
                        .iter()
                        .try_for_each(|&s| writer.write_sample(s.wrapping_shr(OUTPUT_PADDING_BITS)))
                })
                .unwrap_or(Ok(()))
                .map_err(|e| {
                    error!("dac: wav write failed: {}", e.to_string().as_str());
                    DriverError::Transfer
                }),
            None => Err(DriverError::Transfer),
        };
        core.slots_played = core.slots_played.saturating_add(1);
        core.audio_out
            .push(AudioOutMsg::WriteFinished { result, slot });
        true
    }

    /// Play one slot per `period`, forever. Without a period, play as
    /// fast as slots arrive.
    pub async fn run(&self, period: Option<Duration>) -> ! {
        match period {
            Some(period) => {
                let mut ticker = Ticker::every(period);
                loop {
                    ticker.next().await;
                    self.play_next();
                }
            }
            None => loop {
                self.play_next();
                yield_now().await;
            },
        }
    }

    /// Close the recording and write its header. Later slots still
    /// complete, with a transfer error.
    pub fn finish(&self) -> Result<(), hound::Error> {
        match self.core.borrow_mut().writer.take() {
            Some(writer) => writer.finalize(),
            None => Ok(()),
        }
    }
}

impl<M: RawMutex, W: Write + Seek> DacOutput for WavDac<'_, M, W> {
    fn write(&mut self, slot: SlotId) -> Result<(), DriverError> {
        let mut core = self.core.borrow_mut();
        if core.queue.len() >= PCM_SLOT_COUNT {
            return Err(DriverError::Rejected);
        }
        core.queue.push_back(slot);
        Ok(())
    }
}
