//! PCM output slots shared between the converter read side, the audio
//! output controller and the DAC.
//!
//! Slots are referred to by [`SlotId`] everywhere; nobody holds a pointer
//! into the bank across a message boundary. Exclusive use of a slot is a
//! protocol property (whoever last received a completion naming the slot
//! owns it). The per-slot mutex only makes the bank `Sync`; it is never
//! contended while the protocol is followed.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{PCM_SLOT_COUNT, SLOT_SAMPLES};

/// One PCM output slot: interleaved stereo, 24-bit data in 32-bit containers.
pub type PcmSlot = [i32; SLOT_SAMPLES];

/// Index of a slot in the output ring. Always `< PCM_SLOT_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(u8);

impl SlotId {
    /// The first slot in the ring.
    pub const FIRST: Self = Self(0);

    /// Validate a raw index, e.g. one carried in a driver completion.
    #[must_use]
    pub fn new(index: usize) -> Option<Self> {
        if index < PCM_SLOT_COUNT {
            u8::try_from(index).ok().map(Self)
        } else {
            None
        }
    }

    /// Position of this slot in the ring.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The slot `n` places after this one, wrapping around the ring.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    pub fn advance(self, n: usize) -> Self {
        // Safety: PCM_SLOT_COUNT is a non-zero constant and both operands are
        // reduced modulo it first, so the add cannot overflow and the result
        // fits in a u8.
        let next = (self.index() + n % PCM_SLOT_COUNT) % PCM_SLOT_COUNT;
        Self(next as u8)
    }

    /// Every slot in ring order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PCM_SLOT_COUNT).filter_map(Self::new)
    }
}

/// Storage for every PCM output slot.
pub struct SlotBank<M: RawMutex> {
    slots: [Mutex<M, RefCell<PcmSlot>>; PCM_SLOT_COUNT],
}

impl<M: RawMutex> SlotBank<M> {
    /// A bank of silent slots.
    ///
    /// The bank is large (tens of kilobytes); place it in a `StaticCell` or
    /// on the heap rather than in a task's stack frame.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Mutex::new(RefCell::new([0; SLOT_SAMPLES]))),
        }
    }

    /// Run `f` with shared access to a slot's samples.
    pub fn with_slot<R>(&self, id: SlotId, f: impl FnOnce(&PcmSlot) -> R) -> Option<R> {
        self.slots
            .get(id.index())
            .map(|slot| slot.lock(|cell| f(&cell.borrow())))
    }

    /// Run `f` with exclusive access to a slot's samples.
    pub fn with_slot_mut<R>(&self, id: SlotId, f: impl FnOnce(&mut PcmSlot) -> R) -> Option<R> {
        self.slots
            .get(id.index())
            .map(|slot| slot.lock(|cell| f(&mut cell.borrow_mut())))
    }

    /// Zero a slot from `from_sample` to its end.
    ///
    /// Used when a converter read completes short: the tail must not replay
    /// whatever the slot held last time round.
    pub fn zero_tail(&self, id: SlotId, from_sample: usize) {
        let _ = self.with_slot_mut(id, |samples| {
            if let Some(tail) = samples.get_mut(from_sample..) {
                tail.fill(0);
            }
        });
    }
}

impl<M: RawMutex> Default for SlotBank<M> {
    fn default() -> Self {
        Self::new()
    }
}
