//! Property tests for PCM slot ownership in the audio output controller.
//!
//! Completions are delivered in random interleavings of the two driver
//! queues (converter reads, DAC writes), mixed with activation, stop and
//! driver refusals. After every step the controller's ledger must agree
//! with what each driver actually holds, and the ring counters must add up.

use std::collections::HashSet;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use platform::config::{PCM_SLOT_COUNT, SLOT_BYTES};
use platform::mocks::{MockConverter, MockDac, RecordingDisplay};
use platform::{SlotBank, SlotId};
use playback::{AudioOutController, AudioOutMsg, DecodeMsg, Mailbox, SlotOwner};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    DataOut,
    ZeroOut,
    ReadDone { bytes: u32 },
    DacDone { ok: bool },
    RejectDac(bool),
    RejectReads(bool),
}

fn step() -> impl Strategy<Value = Step> {
    let full = u32::try_from(SLOT_BYTES).unwrap();
    prop_oneof![
        1 => Just(Step::DataOut),
        1 => Just(Step::ZeroOut),
        6 => prop_oneof![Just(full), (0..full / 4).prop_map(|n| n * 4)]
            .prop_map(|bytes| Step::ReadDone { bytes }),
        6 => Just(Step::DacDone { ok: true }),
        1 => any::<bool>().prop_map(|ok| Step::DacDone { ok }),
        1 => any::<bool>().prop_map(Step::RejectDac),
        1 => any::<bool>().prop_map(Step::RejectReads),
    ]
}

proptest! {
    #[test]
    fn slot_has_exactly_one_owner(steps in prop::collection::vec(step(), 1..200)) {
        let converter = MockConverter::new();
        let dac = MockDac::new();
        let bank: Box<SlotBank<NoopRawMutex>> = Box::new(SlotBank::new());
        let display = RecordingDisplay::new();
        let decode: Mailbox<NoopRawMutex, DecodeMsg<()>> = Channel::new();
        let mut ctl = AudioOutController::new(converter.output(), dac.clone(), &bank, &display);
        let reply = ctl.register_listener(&decode).unwrap();

        for step in steps {
            match step {
                Step::DataOut => ctl.handle(AudioOutMsg::DataOut { reply }),
                Step::ZeroOut => ctl.handle(AudioOutMsg::ZeroOut),
                Step::ReadDone { bytes } => {
                    let next = converter.with_log(|log| log.pending_reads.pop_front());
                    if let Some(slot) = next {
                        ctl.handle(AudioOutMsg::ReadFinished { result: Ok(()), slot: slot.index(), bytes });
                    }
                }
                Step::DacDone { ok } => {
                    if let Some(slot) = dac.complete_write() {
                        let result = if ok { Ok(()) } else { Err(platform::DriverError::Transfer) };
                        ctl.handle(AudioOutMsg::WriteFinished { result, slot });
                    }
                }
                Step::RejectDac(on) => dac.set_reject_writes(on),
                Step::RejectReads(on) => converter.with_log(|log| log.reject_reads = on),
            }
            while decode.try_receive().is_ok() {}

            let snapshot = ctl.snapshot();
            prop_assert!(snapshot.is_balanced(), "{:?}", snapshot);

            let owners = ctl.owners();
            let count = |want: SlotOwner| owners.iter().filter(|&&o| o == want).count();
            prop_assert_eq!(count(SlotOwner::Ready), snapshot.stock);
            prop_assert_eq!(count(SlotOwner::Dac), snapshot.in_flight);
            prop_assert_eq!(
                count(SlotOwner::Free) + count(SlotOwner::Converter),
                snapshot.remaining
            );

            let reading: Vec<SlotId> = converter.log().pending_reads.iter().copied().collect();
            let playing: Vec<SlotId> = dac.log().pending.iter().copied().collect();
            let reading_set: HashSet<SlotId> = reading.iter().copied().collect();
            let playing_set: HashSet<SlotId> = playing.iter().copied().collect();
            prop_assert_eq!(reading.len(), reading_set.len(), "slot queued twice for read");
            prop_assert_eq!(playing.len(), playing_set.len(), "slot queued twice to DAC");
            prop_assert!(reading_set.is_disjoint(&playing_set));

            for slot in SlotId::all() {
                let owner = owners[slot.index()];
                prop_assert_eq!(reading_set.contains(&slot), owner == SlotOwner::Converter);
                prop_assert_eq!(playing_set.contains(&slot), owner == SlotOwner::Dac);
            }
        }
    }

    #[test]
    fn steady_stream_keeps_every_slot_cycling(rounds in 1usize..50) {
        let converter = MockConverter::new();
        let dac = MockDac::new();
        let bank: Box<SlotBank<NoopRawMutex>> = Box::new(SlotBank::new());
        let display = RecordingDisplay::new();
        let decode: Mailbox<NoopRawMutex, DecodeMsg<()>> = Channel::new();
        let mut ctl = AudioOutController::new(converter.output(), dac.clone(), &bank, &display);
        let reply = ctl.register_listener(&decode).unwrap();
        let full = u32::try_from(SLOT_BYTES).unwrap();

        ctl.handle(AudioOutMsg::DataOut { reply });
        for _ in 0..rounds {
            while let Some(slot) = converter.with_log(|log| log.pending_reads.pop_front()) {
                ctl.handle(AudioOutMsg::ReadFinished { result: Ok(()), slot: slot.index(), bytes: full });
            }
            if let Some(slot) = dac.complete_write() {
                ctl.handle(AudioOutMsg::WriteFinished { result: Ok(()), slot });
            }
        }
        prop_assert_eq!(ctl.snapshot().in_flight + converter.log().pending_reads.len(), PCM_SLOT_COUNT);
        prop_assert!(display.printed().is_empty());
    }
}
