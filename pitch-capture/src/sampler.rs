//! Control surface of the free-running sampling engine.
//!
//! On the target this is an ADC feeding a DMA channel; the core only needs
//! the four operations of [`SamplerEngine`]. Register-level setup of the
//! peripherals lives in the firmware crate.

use core::ptr::NonNull;

/// One of the two capture buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// The other slot.
    #[inline(always)]
    pub const fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// When an armed transfer begins moving samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Start as soon as the descriptor is written.
    Immediate,
    /// Wait for an explicit start from the firmware.
    Deferred,
}

/// Everything the sampler needs to fill the next block.
///
/// Built fresh for every arm and never read back.
#[derive(Debug, Clone, Copy)]
pub struct TransferDescriptor {
    /// Slot the transfer writes into.
    pub slot: Slot,
    /// First element of the destination block.
    pub destination: NonNull<u16>,
    /// Number of 16-bit samples to transfer.
    pub count: usize,
    pub trigger: Trigger,
}

/// Sampler input clock divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDivider(pub u32);

impl ClockDivider {
    /// Resulting sample rate given the sampler base clock.
    ///
    /// One conversion takes `1 + divider` clock cycles.
    pub const fn sample_rate_hz(self, clock_hz: u32) -> u32 {
        clock_hz / (self.0 + 1)
    }
}

/// Control surface of the sampling engine.
///
/// # Contract
///
/// - After [`arm()`](Self::arm), the engine writes at most `count` samples
///   starting at `destination` and nowhere else.
/// - [`wait_for_completion()`](Self::wait_for_completion) returns only once
///   every sample of the armed transfer has landed in memory.
/// - The engine buffers at least one sample internally, so the core has one
///   block period after completion to arm the next transfer.
pub trait SamplerEngine {
    /// Arm the next transfer.
    fn arm(&mut self, descriptor: TransferDescriptor);

    /// Block until the armed transfer has written its last sample.
    ///
    /// There is no timeout: a silent sampler is a wiring or setup bug.
    fn wait_for_completion(&mut self);

    /// Select the analog input channel.
    fn select_channel(&mut self, channel: u8);

    /// Set the conversion clock divider.
    fn set_rate(&mut self, divider: ClockDivider);

    /// Report and clear a FIFO overrun since the last call.
    ///
    /// Engines that cannot detect overruns keep the default.
    fn take_overrun(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_alternate() {
        assert_eq!(Slot::A.other(), Slot::B);
        assert_eq!(Slot::B.other(), Slot::A);
        assert_eq!(Slot::A.other().other(), Slot::A);
        assert_eq!(Slot::A.index(), 0);
        assert_eq!(Slot::B.index(), 1);
    }

    #[test]
    fn divider_sample_rate() {
        // 48 MHz / 4801 conversions per second
        assert_eq!(ClockDivider(4800).sample_rate_hz(48_000_000), 9997);
        assert_eq!(ClockDivider(0).sample_rate_hz(500_000), 500_000);
    }
}
