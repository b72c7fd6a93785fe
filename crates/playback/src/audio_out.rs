//! Audio output actor: keeps the DAC fed from the PCM slot ring.
//!
//! Slots circulate converter → ready → DAC → converter. The controller
//! only ever moves a slot on a completion message that names it, and it
//! keeps an ownership ledger so a completion for a slot the sender does not
//! own is caught instead of trusted.
//!
//! On activation every free slot is queued for a converter read and output
//! waits until [`OUTPUT_START_THRESHOLD`] slots are ready. After that each
//! ready slot goes out as soon as it arrives ([`OUTPUT_UPDATE_THRESHOLD`]),
//! and each slot the DAC hands back is immediately read into again.

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::config::{
    BYTES_PER_SAMPLE, OUTPUT_START_THRESHOLD, OUTPUT_UPDATE_THRESHOLD, PCM_SLOT_COUNT, SLOT_BYTES,
};
use platform::{ConverterOutput, DacOutput, DisplayNotifier, DriverError, SlotBank, SlotId};

use crate::mailbox::Mailbox;
use crate::message::AudioOutMsg;
use crate::reply::{DataOutListener, RegistryFull, ReplyHandle, ReplyRegistry};

/// Listeners that may request data out (the decode actor, plus one spare).
pub const DATA_OUT_LISTENERS: usize = 2;

const DAC_WRITE_ERROR: &str = "Error: DAC write failed.";

/// Who currently owns a PCM slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotOwner {
    /// Idle, may be queued for a read.
    Free,
    /// Being filled by the converter.
    Converter,
    /// Filled, waiting for the DAC.
    Ready,
    /// Queued to or playing on the DAC.
    Dac,
}

/// Ring counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingSnapshot {
    /// Next slot due for output.
    pub head: SlotId,
    /// Slots on the converter side (free or being filled).
    pub remaining: usize,
    /// Filled slots not yet written to the DAC.
    pub stock: usize,
    /// Slots owned by the DAC.
    pub in_flight: usize,
    /// Ready slots needed before the next DAC write.
    pub threshold: usize,
    /// Whether completed DAC writes are refilled.
    pub enabled: bool,
}

impl RingSnapshot {
    /// `remaining + stock + in_flight` covers every slot exactly once.
    pub fn is_balanced(&self) -> bool {
        self.remaining
            .checked_add(self.stock)
            .and_then(|n| n.checked_add(self.in_flight))
            == Some(PCM_SLOT_COUNT)
    }
}

/// The audio output state machine.
pub struct AudioOutController<'a, M: RawMutex, C, D> {
    converter: C,
    dac: D,
    bank: &'a SlotBank<M>,
    display: &'a dyn DisplayNotifier,
    replies: ReplyRegistry<'a, dyn DataOutListener + 'a, DATA_OUT_LISTENERS>,
    owners: [SlotOwner; PCM_SLOT_COUNT],
    head: SlotId,
    remaining: usize,
    stock: usize,
    in_flight: usize,
    threshold: usize,
    enabled: bool,
}

impl<'a, M, C, D> AudioOutController<'a, M, C, D>
where
    M: RawMutex,
    C: ConverterOutput,
    D: DacOutput,
{
    /// A stopped controller with every slot free.
    pub fn new(converter: C, dac: D, bank: &'a SlotBank<M>, display: &'a dyn DisplayNotifier) -> Self {
        Self {
            converter,
            dac,
            bank,
            display,
            replies: ReplyRegistry::new(),
            owners: [SlotOwner::Free; PCM_SLOT_COUNT],
            head: SlotId::FIRST,
            remaining: PCM_SLOT_COUNT,
            stock: 0,
            in_flight: 0,
            threshold: OUTPUT_START_THRESHOLD,
            enabled: false,
        }
    }

    /// Register a listener for data-out answers.
    pub fn register_listener(
        &mut self,
        listener: &'a (dyn DataOutListener + 'a),
    ) -> Result<ReplyHandle, RegistryFull> {
        self.replies.register(listener)
    }

    /// Current ring counters.
    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot {
            head: self.head,
            remaining: self.remaining,
            stock: self.stock,
            in_flight: self.in_flight,
            threshold: self.threshold,
            enabled: self.enabled,
        }
    }

    /// Current owner of every slot, in ring order.
    pub fn owners(&self) -> &[SlotOwner; PCM_SLOT_COUNT] {
        &self.owners
    }

    /// Process mail forever.
    pub async fn run<MM: RawMutex>(&mut self, mailbox: &Mailbox<MM, AudioOutMsg>) -> ! {
        loop {
            let msg = mailbox.receive().await;
            self.handle(msg);
        }
    }

    /// Process one message.
    pub fn handle(&mut self, msg: AudioOutMsg) {
        match msg {
            AudioOutMsg::DataOut { reply } => self.on_data_out(reply),
            AudioOutMsg::ZeroOut => {
                debug!("audio out: zero out");
                self.enabled = false;
            }
            AudioOutMsg::ReadFinished {
                result,
                slot,
                bytes,
            } => self.on_read_finished(result, slot, bytes),
            AudioOutMsg::WriteFinished { result, slot } => self.on_write_finished(result, slot),
        }
    }

    fn on_data_out(&mut self, reply: ReplyHandle) {
        let accepted = if self.enabled {
            false
        } else {
            self.enabled = true;
            let primed = self.prime();
            if primed {
                self.threshold = OUTPUT_START_THRESHOLD;
            }
            primed
        };
        debug!("audio out: data out, accepted {}", accepted);
        match self.replies.get(reply) {
            Some(listener) => listener.data_out_done(accepted),
            None => error!("audio out: unknown reply handle {}", reply.index()),
        }
    }

    /// Queue a read for every free slot, in ring order from the head.
    fn prime(&mut self) -> bool {
        for offset in 0..PCM_SLOT_COUNT {
            let slot = self.head.advance(offset);
            if self.owner(slot) == SlotOwner::Free && !self.start_read(slot) {
                return false;
            }
        }
        true
    }

    fn on_read_finished(&mut self, result: Result<(), DriverError>, raw_slot: usize, bytes: u32) {
        let bytes = usize::try_from(bytes).unwrap_or(usize::MAX);
        let Some(slot) = SlotId::new(raw_slot).filter(|_| bytes <= SLOT_BYTES) else {
            error!("audio out: read completion out of range, slot {} bytes {}", raw_slot, bytes);
            self.enabled = false;
            return;
        };
        if self.owner(slot) != SlotOwner::Converter {
            error!("audio out: read completion for slot {} not being read", slot.index());
            self.enabled = false;
            return;
        }
        if result.is_err() {
            debug!("audio out: read of slot {} failed, {} bytes", slot.index(), bytes);
        }
        if bytes < SLOT_BYTES {
            // End of the converted stream: silence the rest of the slot.
            self.bank.zero_tail(slot, bytes.checked_div(BYTES_PER_SAMPLE).unwrap_or(0));
            self.threshold = OUTPUT_UPDATE_THRESHOLD;
        }
        self.set_owner(slot, SlotOwner::Ready);
        self.remaining = self.remaining.saturating_sub(1);
        self.stock = self.stock.saturating_add(1);

        if self.stock >= self.threshold {
            self.output();
        }
    }

    /// Write every ready slot to the DAC in ring order from the head.
    fn output(&mut self) {
        let target = self.stock;
        let mut cursor = self.head;
        let mut written = 0usize;
        for _ in 0..PCM_SLOT_COUNT {
            if written >= target {
                break;
            }
            if self.owner(cursor) == SlotOwner::Ready {
                written = written.saturating_add(1);
                self.stock = self.stock.saturating_sub(1);
                if self.dac.write(cursor).is_ok() {
                    self.set_owner(cursor, SlotOwner::Dac);
                    self.in_flight = self.in_flight.saturating_add(1);
                } else {
                    warn!("audio out: DAC refused slot {}", cursor.index());
                    self.set_owner(cursor, SlotOwner::Free);
                    self.remaining = self.remaining.saturating_add(1);
                    self.display.print_string(DAC_WRITE_ERROR);
                    if self.enabled && !self.start_read(cursor) {
                        warn!("audio out: refill of slot {} refused", cursor.index());
                    }
                    cursor = cursor.advance(1);
                    break;
                }
            }
            cursor = cursor.advance(1);
        }
        self.head = cursor;
        self.threshold = OUTPUT_UPDATE_THRESHOLD;
    }

    fn on_write_finished(&mut self, result: Result<(), DriverError>, slot: SlotId) {
        if self.owner(slot) != SlotOwner::Dac {
            error!("audio out: DAC completion for slot {} not queued", slot.index());
            return;
        }
        self.set_owner(slot, SlotOwner::Free);
        self.in_flight = self.in_flight.saturating_sub(1);
        self.remaining = self.remaining.saturating_add(1);
        match result {
            Ok(()) => {
                if self.enabled && !self.start_read(slot) {
                    warn!("audio out: refill of slot {} refused", slot.index());
                }
            }
            Err(_) => self.display.print_string(DAC_WRITE_ERROR),
        }
    }

    fn start_read(&mut self, slot: SlotId) -> bool {
        match self.converter.read(slot) {
            Ok(()) => {
                self.set_owner(slot, SlotOwner::Converter);
                true
            }
            Err(_) => {
                warn!("audio out: converter refused read into slot {}", slot.index());
                false
            }
        }
    }

    fn owner(&self, slot: SlotId) -> SlotOwner {
        self.owners
            .get(slot.index())
            .copied()
            .unwrap_or(SlotOwner::Free)
    }

    fn set_owner(&mut self, slot: SlotId, owner: SlotOwner) {
        if let Some(entry) = self.owners.get_mut(slot.index()) {
            *entry = owner;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::DecodeMsg;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::Channel;
    use platform::mocks::{MockConverter, MockConverterOutput, MockDac, RecordingDisplay};

    type Bank = SlotBank<NoopRawMutex>;
    type Controller<'a> = AudioOutController<'a, NoopRawMutex, MockConverterOutput, MockDac>;

    struct Rig {
        converter: MockConverter,
        dac: MockDac,
        bank: Box<Bank>,
        display: RecordingDisplay,
        decode: Mailbox<NoopRawMutex, DecodeMsg<()>>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                converter: MockConverter::new(),
                dac: MockDac::new(),
                bank: Box::new(SlotBank::new()),
                display: RecordingDisplay::new(),
                decode: Channel::new(),
            }
        }

        fn controller(&self) -> (Controller<'_>, ReplyHandle) {
            let mut ctl = AudioOutController::new(
                self.converter.output(),
                self.dac.clone(),
                &self.bank,
                &self.display,
            );
            let reply = ctl.register_listener(&self.decode).unwrap();
            (ctl, reply)
        }

        fn answer(&self) -> Option<bool> {
            match self.decode.try_receive().ok()? {
                DecodeMsg::DataOutDone { accepted } => Some(accepted),
                _ => None,
            }
        }

        fn read_done(&self, ctl: &mut Controller<'_>, slot: SlotId, bytes: u32) {
            self.converter.with_log(|log| {
                assert_eq!(log.pending_reads.pop_front(), Some(slot));
            });
            ctl.handle(AudioOutMsg::ReadFinished {
                result: Ok(()),
                slot: slot.index(),
                bytes,
            });
        }
    }

    fn slot(i: usize) -> SlotId {
        SlotId::new(i).unwrap()
    }

    const FULL: u32 = SLOT_BYTES as u32;

    #[test]
    fn data_out_primes_every_slot() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        assert_eq!(rig.answer(), Some(true));
        assert_eq!(rig.converter.log().reads, PCM_SLOT_COUNT as u32);
        assert!(ctl.owners().iter().all(|&o| o == SlotOwner::Converter));
        assert!(ctl.snapshot().is_balanced());
    }

    #[test]
    fn second_data_out_is_refused() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        ctl.handle(AudioOutMsg::DataOut { reply });
        assert_eq!(rig.answer(), Some(true));
        assert_eq!(rig.answer(), Some(false));
        assert_eq!(rig.converter.log().reads, PCM_SLOT_COUNT as u32);
    }

    #[test]
    fn output_waits_for_start_threshold_then_streams() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });

        rig.read_done(&mut ctl, slot(0), FULL);
        rig.read_done(&mut ctl, slot(1), FULL);
        assert_eq!(rig.dac.log().writes, 0);
        rig.read_done(&mut ctl, slot(2), FULL);
        assert_eq!(
            rig.dac.log().pending.iter().copied().collect::<Vec<_>>(),
            vec![slot(0), slot(1), slot(2)]
        );
        assert_eq!(ctl.snapshot().head, slot(3));

        rig.read_done(&mut ctl, slot(3), FULL);
        assert_eq!(rig.dac.log().writes, 4, "threshold drops to one after start");
        assert!(ctl.snapshot().is_balanced());
    }

    #[test]
    fn dac_completion_refills_the_same_slot() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        for i in 0..3 {
            rig.read_done(&mut ctl, slot(i), FULL);
        }
        let played = rig.dac.complete_write().unwrap();
        ctl.handle(AudioOutMsg::WriteFinished {
            result: Ok(()),
            slot: played,
        });
        assert_eq!(rig.converter.log().pending_reads.back(), Some(&slot(0)));
        assert_eq!(ctl.owners()[0], SlotOwner::Converter);
    }

    #[test]
    fn short_read_zero_fills_and_flushes_at_once() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        rig.bank.with_slot_mut(slot(0), |s| s.fill(9)).unwrap();
        rig.read_done(&mut ctl, slot(0), 16);
        assert_eq!(rig.dac.log().writes, 1, "short read lowers threshold to one");
        rig.bank
            .with_slot(slot(0), |s| {
                assert!(s[..4].iter().all(|&x| x == 9));
                assert!(s[4..].iter().all(|&x| x == 0));
            })
            .unwrap();
    }

    #[test]
    fn out_of_range_completion_disables_refill() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        ctl.handle(AudioOutMsg::ReadFinished {
            result: Ok(()),
            slot: PCM_SLOT_COUNT,
            bytes: FULL,
        });
        assert!(!ctl.snapshot().enabled);
        ctl.handle(AudioOutMsg::ReadFinished {
            result: Ok(()),
            slot: 0,
            bytes: FULL + 4,
        });
        assert_eq!(ctl.snapshot().stock, 0);
        assert!(ctl.snapshot().is_balanced());
    }

    #[test]
    fn completion_for_unowned_slot_is_rejected() {
        let rig = Rig::new();
        let (mut ctl, _reply) = rig.controller();
        ctl.handle(AudioOutMsg::ReadFinished {
            result: Ok(()),
            slot: 4,
            bytes: FULL,
        });
        assert_eq!(ctl.owners()[4], SlotOwner::Free);
        ctl.handle(AudioOutMsg::WriteFinished {
            result: Ok(()),
            slot: slot(4),
        });
        assert_eq!(ctl.snapshot().remaining, PCM_SLOT_COUNT);
    }

    #[test]
    fn rejected_dac_write_frees_slot_and_reports() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        rig.dac.set_reject_writes(true);
        for i in 0..3 {
            rig.read_done(&mut ctl, slot(i), FULL);
        }
        assert_eq!(ctl.owners()[1], SlotOwner::Ready);
        assert_eq!(rig.display.printed(), vec![DAC_WRITE_ERROR.to_string()]);
        assert!(ctl.snapshot().is_balanced());
    }

    #[test]
    fn refused_slot_is_read_again_while_enabled() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        rig.dac.set_reject_writes(true);
        for i in 0..3 {
            rig.read_done(&mut ctl, slot(i), FULL);
        }
        assert_eq!(ctl.owners()[0], SlotOwner::Converter);
        assert_eq!(rig.converter.log().pending_reads.back(), Some(&slot(0)));
        assert_eq!(rig.converter.log().reads, PCM_SLOT_COUNT as u32 + 1);

        // Once the DAC takes writes again, the ring runs on all slots.
        rig.dac.set_reject_writes(false);
        for i in 3..PCM_SLOT_COUNT {
            rig.read_done(&mut ctl, slot(i), FULL);
        }
        rig.read_done(&mut ctl, slot(0), FULL);
        assert_eq!(rig.dac.log().writes, PCM_SLOT_COUNT as u32);
        assert!(ctl.snapshot().is_balanced());
    }

    #[test]
    fn refused_slot_stays_free_after_zero_out() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        rig.read_done(&mut ctl, slot(0), FULL);
        rig.read_done(&mut ctl, slot(1), FULL);
        ctl.handle(AudioOutMsg::ZeroOut);
        rig.dac.set_reject_writes(true);
        let reads = rig.converter.log().reads;
        rig.read_done(&mut ctl, slot(2), FULL);
        assert_eq!(ctl.owners()[0], SlotOwner::Free);
        assert_eq!(rig.converter.log().reads, reads);
    }

    #[test]
    fn zero_out_stops_refilling() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        ctl.handle(AudioOutMsg::DataOut { reply });
        for i in 0..3 {
            rig.read_done(&mut ctl, slot(i), FULL);
        }
        ctl.handle(AudioOutMsg::ZeroOut);
        let reads_before = rig.converter.log().reads;
        let played = rig.dac.complete_write().unwrap();
        ctl.handle(AudioOutMsg::WriteFinished {
            result: Ok(()),
            slot: played,
        });
        assert_eq!(rig.converter.log().reads, reads_before);
        assert_eq!(ctl.owners()[0], SlotOwner::Free);
    }

    #[test]
    fn unknown_reply_handle_is_not_answered() {
        let rig = Rig::new();
        let (mut ctl, _reply) = rig.controller();
        let other = Rig::new();
        let (mut other_ctl, _) = other.controller();
        let stray = other_ctl.register_listener(&other.decode).unwrap();
        ctl.handle(AudioOutMsg::DataOut { reply: stray });
        assert_eq!(rig.answer(), None);
        assert!(ctl.snapshot().enabled);
    }

    #[tokio::test]
    async fn run_loop_drains_mailbox() {
        let rig = Rig::new();
        let (mut ctl, reply) = rig.controller();
        let mailbox: Mailbox<NoopRawMutex, AudioOutMsg> = Channel::new();
        mailbox.try_send(AudioOutMsg::DataOut { reply }).unwrap();
        mailbox.try_send(AudioOutMsg::ZeroOut).unwrap();
        embassy_futures::select::select(ctl.run(&mailbox), core::future::ready(())).await;
        assert_eq!(rig.answer(), Some(true));
        assert!(mailbox.is_empty());
        assert!(!ctl.snapshot().enabled);
    }
}
