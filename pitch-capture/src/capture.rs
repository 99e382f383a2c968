//! Ping-pong capture buffers shared with the sampling engine.
//!
//! Two raw blocks alternate between the sampler and the core. At any instant
//! one is the sampler's write target and the other is readable by the core;
//! the roles flip every time a transfer completes.
//!
//! ```text
//!            cycle k                      cycle k+1
//! Sampler ──► slot A (armed)       Sampler ──► slot B (armed)
//! Core    ◄── slot B (ready)       Core    ◄── slot A (ready)
//! ```
//!
//! ## Slack
//!
//! When a transfer finishes the sampler keeps converting into its internal
//! FIFO. The next transfer must be armed before that FIFO overflows, which
//! gives the core roughly one sample period per FIFO entry. For this reason
//! [`swap_and_rearm()`](CaptureBufferPair::swap_and_rearm) arms the sampler
//! *before* handing the completed block to the caller, and the caller does
//! all its conversion work afterwards.
//!
//! ## Ownership
//!
//! The blocks live in a [`CaptureStorage`] that is only ever reached through
//! a shared reference, so the pointers handed to the sampler stay valid for
//! as long as the storage does. [`CaptureBufferPair`] borrows the storage and
//! owns nothing but the swap state.
//!
//! ## Usage
//!
//! ```ignore
//! static CAPTURE: CaptureStorage<CAPTURE_DEPTH> = CaptureStorage::new();
//!
//! let mut capture = CaptureBufferPair::new(&CAPTURE);
//! capture.prime(&mut adc);
//! loop {
//!     let done = capture.await_block_ready(&mut adc);
//!     let block = capture.swap_and_rearm(&mut adc, done);
//!     // read `block` until the next iteration
//! }
//! ```

use core::cell::UnsafeCell;
use core::ops::Deref;
use core::ptr::NonNull;
use core::sync::atomic::{fence, Ordering};

use crate::sampler::{SamplerEngine, Slot, Trigger, TransferDescriptor};

/// Raw sampler output: `N` unsigned samples, 4-byte aligned for DMA.
#[repr(C, align(4))]
pub struct RawBlock<const N: usize> {
    pub samples: [u16; N],
}

impl<const N: usize> RawBlock<N> {
    const fn zeroed() -> Self {
        RawBlock { samples: [0; N] }
    }
}

/// Backing memory for the two capture slots.
///
/// Suitable for a `static`. Access goes through `&self` only; which slot may
/// be read and which may be written is decided by [`CaptureBufferPair`].
pub struct CaptureStorage<const N: usize> {
    blocks: [UnsafeCell<RawBlock<N>>; 2],
}

// SAFETY: the sampler writes one slot through a raw pointer while the core
// reads the other. `CaptureBufferPair` holds the only swap state and never
// hands out a view of the armed slot, so no slot is read and written at once.
unsafe impl<const N: usize> Sync for CaptureStorage<N> {}

impl<const N: usize> CaptureStorage<N> {
    /// Create two zeroed blocks.
    pub const fn new() -> Self {
        const { assert!(N > 0, "capture depth must be non-zero") };

        CaptureStorage {
            blocks: [
                UnsafeCell::new(RawBlock::zeroed()),
                UnsafeCell::new(RawBlock::zeroed()),
            ],
        }
    }

    /// Pointer to the first sample of `slot`.
    fn data_ptr(&self, slot: Slot) -> NonNull<u16> {
        let ptr = self.blocks[slot.index()].get().cast::<u16>();
        // SAFETY: UnsafeCell::get never returns null.
        unsafe { NonNull::new_unchecked(ptr) }
    }

    /// Read `slot`.
    ///
    /// # Safety
    ///
    /// No sampler may be armed on `slot` for the lifetime of the returned
    /// reference.
    pub unsafe fn read(&self, slot: Slot) -> &[u16; N] {
        // SAFETY: guaranteed by the caller.
        unsafe { &(*self.blocks[slot.index()].get()).samples }
    }
}

impl<const N: usize> Default for CaptureStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The swap protocol over a [`CaptureStorage`].
pub struct CaptureBufferPair<'a, const N: usize> {
    storage: &'a CaptureStorage<N>,
    /// Slot the sampler is writing into, or will be once primed.
    next_target: Slot,
    primed: bool,
}

impl<'a, const N: usize> CaptureBufferPair<'a, N> {
    /// Start with slot A as the first target.
    pub const fn new(storage: &'a CaptureStorage<N>) -> Self {
        CaptureBufferPair {
            storage,
            next_target: Slot::A,
            primed: false,
        }
    }

    fn descriptor(&self, slot: Slot, trigger: Trigger) -> TransferDescriptor {
        TransferDescriptor {
            slot,
            destination: self.storage.data_ptr(slot),
            count: N,
            trigger,
        }
    }

    /// Arm the first transfer. Call once during setup.
    pub fn prime<S: SamplerEngine>(&mut self, sampler: &mut S) {
        debug_assert!(!self.primed, "capture buffers primed twice");
        sampler.arm(self.descriptor(self.next_target, Trigger::Immediate));
        self.primed = true;
    }

    /// Block until the sampler has completely written the current target.
    ///
    /// Returns the slot that just completed.
    pub fn await_block_ready<S: SamplerEngine>(&mut self, sampler: &mut S) -> Slot {
        debug_assert!(self.primed, "awaiting a block before the sampler was armed");
        sampler.wait_for_completion();
        // Sampler writes must be visible before we read the block.
        fence(Ordering::Acquire);
        self.next_target
    }

    /// Rearm the sampler on the other slot and hand out the completed one.
    ///
    /// The returned view borrows the pair, so the next swap cannot happen
    /// while the core is still reading.
    pub fn swap_and_rearm<S: SamplerEngine>(
        &mut self,
        sampler: &mut S,
        completed: Slot,
    ) -> ReadyBlock<'_, N> {
        debug_assert_eq!(completed, self.next_target, "swapping a slot that was not armed");

        let rearm = completed.other();
        sampler.arm(self.descriptor(rearm, Trigger::Immediate));
        self.next_target = rearm;

        // SAFETY: `completed` is no longer a transfer target; the sampler now
        // only writes through the descriptor for `rearm`. The view borrows
        // `self`, so `completed` cannot be rearmed while it is alive.
        let samples = unsafe { self.storage.read(completed) };
        ReadyBlock {
            slot: completed,
            samples,
        }
    }

    /// Slot the sampler is currently writing, if it has been primed.
    pub fn armed(&self) -> Option<Slot> {
        self.primed.then_some(self.next_target)
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }
}

/// Core-owned view of a completed capture block.
pub struct ReadyBlock<'a, const N: usize> {
    slot: Slot,
    samples: &'a [u16; N],
}

impl<'a, const N: usize> ReadyBlock<'a, N> {
    /// Slot this block was captured into.
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

impl<'a, const N: usize> Deref for ReadyBlock<'a, N> {
    type Target = [u16; N];

    fn deref(&self) -> &Self::Target {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimSampler;
    use std::vec::Vec;

    fn ramp(block: u32, i: usize) -> u16 {
        ((block as usize * 100 + i) % 4096) as u16
    }

    #[test]
    fn new_is_unprimed() {
        let storage: CaptureStorage<8> = CaptureStorage::new();
        let pair = CaptureBufferPair::new(&storage);
        assert!(!pair.is_primed());
        assert_eq!(pair.armed(), None);
    }

    #[test]
    fn prime_arms_slot_a_immediately() {
        let storage: CaptureStorage<8> = CaptureStorage::new();
        let mut pair = CaptureBufferPair::new(&storage);
        let mut adc = SimSampler::new(ramp);
        pair.prime(&mut adc);

        assert_eq!(pair.armed(), Some(Slot::A));
        assert_eq!(adc.armed_slot(), Some(Slot::A));
        assert_eq!(adc.arm_log(), &[(Slot::A, Trigger::Immediate, 8)]);
    }

    #[test]
    fn ready_block_holds_completed_data() {
        let storage: CaptureStorage<8> = CaptureStorage::new();
        let mut pair = CaptureBufferPair::new(&storage);
        let mut adc = SimSampler::new(ramp);
        pair.prime(&mut adc);

        let done = pair.await_block_ready(&mut adc);
        assert_eq!(done, Slot::A);

        let block = pair.swap_and_rearm(&mut adc, done);
        assert_eq!(block.slot(), Slot::A);
        let expected: [u16; 8] = core::array::from_fn(|i| ramp(0, i));
        assert_eq!(*block, expected);
    }

    #[test]
    fn swap_rearms_before_handing_out() {
        let storage: CaptureStorage<4> = CaptureStorage::new();
        let mut pair = CaptureBufferPair::new(&storage);
        let mut adc = SimSampler::new(ramp);
        pair.prime(&mut adc);

        let done = pair.await_block_ready(&mut adc);
        let block = pair.swap_and_rearm(&mut adc, done);

        // The sampler is already running on the other slot.
        assert_eq!(adc.armed_slot(), Some(Slot::B));
        assert_ne!(adc.armed_slot(), Some(block.slot()));
        drop(block);
        assert_eq!(pair.armed(), Some(Slot::B));
    }

    #[test]
    fn slots_alternate_and_never_overlap() {
        let storage: CaptureStorage<16> = CaptureStorage::new();
        let mut pair = CaptureBufferPair::new(&storage);
        let mut adc = SimSampler::new(ramp);
        pair.prime(&mut adc);

        let mut seen = Vec::new();
        for _ in 0..50 {
            let done = pair.await_block_ready(&mut adc);
            let block = pair.swap_and_rearm(&mut adc, done);
            assert_ne!(Some(block.slot()), adc.armed_slot());
            seen.push(block.slot());
        }

        for (cycle, slot) in seen.iter().enumerate() {
            let expected = if cycle % 2 == 0 { Slot::A } else { Slot::B };
            assert_eq!(*slot, expected, "cycle {cycle}");
        }
    }

    #[test]
    fn every_block_delivered_once_in_order() {
        let storage: CaptureStorage<16> = CaptureStorage::new();
        let mut pair = CaptureBufferPair::new(&storage);
        let mut adc = SimSampler::new(|block, i| ((block * 7 + i as u32) % 4096) as u16);
        pair.prime(&mut adc);

        for cycle in 0..200u32 {
            let done = pair.await_block_ready(&mut adc);
            let block = pair.swap_and_rearm(&mut adc, done);
            for (i, &s) in block.iter().enumerate() {
                assert_eq!(s as u32, (cycle * 7 + i as u32) % 4096, "cycle {cycle} sample {i}");
            }
        }
        assert_eq!(adc.blocks_completed(), 200);
    }

    #[test]
    fn sampler_writes_into_armed_slot_do_not_reach_ready_block() {
        // The simulator lands the first sample of the new transfer as soon as
        // it is armed; the ready block must still be the old generation.
        let storage: CaptureStorage<4> = CaptureStorage::new();
        let mut pair = CaptureBufferPair::new(&storage);
        let mut adc = SimSampler::new(|block, _| block as u16 + 1);
        pair.prime(&mut adc);

        for cycle in 0..10u16 {
            let done = pair.await_block_ready(&mut adc);
            let block = pair.swap_and_rearm(&mut adc, done);
            assert!(block.iter().all(|&s| s == cycle + 1), "cycle {cycle}: {:?}", *block);
        }
    }

    #[test]
    fn armed_pointer_survives_mutable_use_of_the_pair() {
        // The sampler holds its descriptor across every `&mut` call on the
        // pair and across moves of the pair itself; its writes must still
        // land in storage the ready view can read.
        let storage: CaptureStorage<8> = CaptureStorage::new();
        let mut adc = SimSampler::new(|block, i| (block as usize * 10 + i) as u16);
        let mut pair = CaptureBufferPair::new(&storage);
        pair.prime(&mut adc);
        assert!(pair.is_primed());

        let mut moved = pair;
        for cycle in 0..4u16 {
            let done = moved.await_block_ready(&mut adc);
            assert_eq!(moved.armed(), Some(done));
            let block = moved.swap_and_rearm(&mut adc, done);
            let expected: [u16; 8] = core::array::from_fn(|i| cycle * 10 + i as u16);
            assert_eq!(*block, expected, "cycle {cycle}");
        }
    }

    #[test]
    fn released_slot_readable_from_storage() {
        let storage: CaptureStorage<4> = CaptureStorage::new();
        let mut adc = SimSampler::new(|_, i| i as u16 + 1);
        let mut pair = CaptureBufferPair::new(&storage);
        pair.prime(&mut adc);
        let done = pair.await_block_ready(&mut adc);
        drop(pair.swap_and_rearm(&mut adc, done));

        // SAFETY: the sampler is armed on slot B only.
        let a = unsafe { storage.read(Slot::A) };
        assert_eq!(*a, [1, 2, 3, 4]);
    }
}
