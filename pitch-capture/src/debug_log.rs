//! Double-buffered capture of converted samples for offline inspection.
//!
//! The primary loop appends every converted block to a [`LogWriter`]; a
//! background context drains completed log blocks through a [`LogObserver`]
//! as one integer per line. Only instrumentation builds carry this module
//! (feature `debug-capture`).
//!
//! ## Protocol
//!
//! Two blocks of `M` samples alternate between the writer and the observer.
//! A single atomic state word holds:
//!
//! | Bits | Meaning |
//! |------|---------|
//! | 0 | index of the readable block |
//! | 1 | the observer holds the readable block |
//! | 2.. | generation: number of blocks handed to the observer |
//!
//! - The writer fills the other block. When its cursor reaches `M` it
//!   publishes the filled block as readable, bumps the generation and takes
//!   the old readable block as its next target.
//! - The observer polls the generation. When it changes, it sets the claim
//!   bit and reads the readable block until the snapshot is dropped.
//! - While the claim bit is set the writer cannot give the readable block
//!   away, so instead of flipping it discards the block it just filled and
//!   starts over. The observer never sees a block that is being written; a
//!   slow observer just misses generations.
//!
//! Neither side blocks or locks.
//!
//! ## Usage
//!
//! ```ignore
//! static mut LOG: DebugCaptureLog<LOG_DEPTH> = DebugCaptureLog::new();
//! let (writer, mut observer) = LOG.split();
//!
//! // second core
//! observer.run(&mut uart);
//! ```

use core::cell::UnsafeCell;
use core::fmt;
use core::ops::Deref;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::dsp::Q16;

const READ_BIT: u32 = 1 << 0;
const CLAIM_BIT: u32 = 1 << 1;
const GEN_SHIFT: u32 = 2;
const GEN_MASK: u32 = u32::MAX >> GEN_SHIFT;

#[inline(always)]
const fn readable(state: u32) -> usize {
    (state & READ_BIT) as usize
}

#[inline(always)]
const fn generation(state: u32) -> u32 {
    state >> GEN_SHIFT
}

/// Two `M`-sample log blocks and the state word arbitrating them.
pub struct DebugCaptureLog<const M: usize> {
    blocks: [UnsafeCell<[Q16; M]>; 2],
    state: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: block access is arbitrated by `state`. The writer only touches the
// non-readable block; the observer only reads the readable block while the
// claim bit is set, and the writer never changes the readable index while it
// is set.
unsafe impl<const M: usize> Sync for DebugCaptureLog<M> {}

impl<const M: usize> DebugCaptureLog<M> {
    /// Create an empty log. Block 0 starts readable, block 1 is written first.
    ///
    /// # Panics
    ///
    /// `M` must be non-zero; this is checked when the type is instantiated.
    pub const fn new() -> Self {
        const { assert!(M > 0, "log depth must be non-zero") };

        DebugCaptureLog {
            blocks: [UnsafeCell::new([Q16::ZERO; M]), UnsafeCell::new([Q16::ZERO; M])],
            state: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Split into the writer and observer halves.
    pub fn split(&mut self) -> (LogWriter<'_, M>, LogObserver<'_, M>) {
        let this: &Self = self;
        let state = this.state.load(Ordering::Relaxed);
        (
            LogWriter {
                log: this,
                write: 1 - readable(state),
                cursor: 0,
            },
            LogObserver {
                log: this,
                last_generation: generation(state),
                missed: 0,
            },
        )
    }

    /// Index of the block currently readable by the observer.
    pub fn readable_index(&self) -> usize {
        readable(self.state.load(Ordering::Acquire))
    }

    /// Number of blocks handed to the observer so far (wraps at 2^30).
    pub fn generation(&self) -> u32 {
        generation(self.state.load(Ordering::Acquire))
    }

    /// Number of filled blocks discarded because the observer was busy.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Whether the observer currently holds the readable block.
    pub fn is_claimed(&self) -> bool {
        self.state.load(Ordering::Acquire) & CLAIM_BIT != 0
    }
}

impl<const M: usize> Default for DebugCaptureLog<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Primary-loop half: appends converted samples.
pub struct LogWriter<'a, const M: usize> {
    log: &'a DebugCaptureLog<M>,
    write: usize,
    cursor: usize,
}

impl<'a, const M: usize> LogWriter<'a, M> {
    /// Append samples at the cursor, publishing each block as it fills.
    pub fn append(&mut self, samples: &[Q16]) {
        let mut rest = samples;
        while !rest.is_empty() {
            let n = rest.len().min(M - self.cursor);
            // SAFETY: `write` is never the readable block, so the observer
            // holds no reference into it.
            let block = unsafe { &mut *self.log.blocks[self.write].get() };
            block[self.cursor..self.cursor + n].copy_from_slice(&rest[..n]);
            self.cursor += n;
            rest = &rest[n..];

            if self.cursor == M {
                self.publish();
            }
        }
    }

    fn publish(&mut self) {
        self.cursor = 0;

        let current = self.log.state.load(Ordering::Relaxed);
        if current & CLAIM_BIT == 0 {
            let next_gen = generation(current).wrapping_add(1) & GEN_MASK;
            let next = (next_gen << GEN_SHIFT) | self.write as u32;
            // Release publishes the block; Acquire orders our next writes
            // after the observer's release of the old readable block.
            if self
                .log
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                tracing::debug!(generation = next_gen, block = self.write, "debug log block published");
                self.write = 1 - self.write;
                return;
            }
        }

        // The observer holds the readable block; reuse our own.
        self.log.dropped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(block = self.write, "debug log block dropped, observer busy");
    }

    /// Samples written into the current block.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Index of the block being written.
    pub fn write_index(&self) -> usize {
        self.write
    }

    pub fn log(&self) -> &'a DebugCaptureLog<M> {
        self.log
    }
}

/// Background half: detects and drains completed blocks.
pub struct LogObserver<'a, const M: usize> {
    log: &'a DebugCaptureLog<M>,
    last_generation: u32,
    missed: u32,
}

impl<'a, const M: usize> LogObserver<'a, M> {
    /// Claim the readable block if a new generation has been published.
    pub fn try_claim(&mut self) -> Option<LogSnapshot<'a, M>> {
        let mut state = self.log.state.load(Ordering::Acquire);
        loop {
            let published = generation(state);
            if published == self.last_generation {
                return None;
            }
            match self.log.state.compare_exchange_weak(
                state,
                state | CLAIM_BIT,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let skipped = published.wrapping_sub(self.last_generation).wrapping_sub(1) & GEN_MASK;
                    self.missed = self.missed.wrapping_add(skipped);
                    self.last_generation = published;
                    return Some(LogSnapshot {
                        log: self.log,
                        index: readable(state),
                        generation: published,
                    });
                }
                // The writer published again (or a spurious failure); look again.
                Err(actual) => state = actual,
            }
        }
    }

    /// Write every sample of a newly completed block to `sink`, one per line.
    ///
    /// Returns `Ok(false)` when nothing new was published.
    pub fn drain_to<W: fmt::Write>(&mut self, sink: &mut W) -> Result<bool, fmt::Error> {
        let Some(snapshot) = self.try_claim() else {
            return Ok(false);
        };
        for sample in snapshot.iter() {
            writeln!(sink, "{}", sample.to_bits())?;
        }
        Ok(true)
    }

    /// Busy-poll forever, draining every block that shows up.
    pub fn run<W: fmt::Write>(&mut self, sink: &mut W) -> ! {
        loop {
            if self.drain_to(sink).is_err() {
                tracing::warn!("debug sink write failed");
            }
            core::hint::spin_loop();
        }
    }

    /// Generations published while the observer was not looking.
    pub fn missed(&self) -> u32 {
        self.missed
    }

    /// Generation of the last block claimed.
    pub fn last_generation(&self) -> u32 {
        self.last_generation
    }

    pub fn log(&self) -> &'a DebugCaptureLog<M> {
        self.log
    }
}

/// A claimed, read-only log block. Dropping it releases the block.
pub struct LogSnapshot<'a, const M: usize> {
    log: &'a DebugCaptureLog<M>,
    index: usize,
    generation: u32,
}

impl<'a, const M: usize> LogSnapshot<'a, M> {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Which of the two log blocks this is.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<'a, const M: usize> Deref for LogSnapshot<'a, M> {
    type Target = [Q16; M];

    fn deref(&self) -> &Self::Target {
        // SAFETY: the claim bit is set, so the writer will not target this block.
        unsafe { &*self.log.blocks[self.index].get() }
    }
}

impl<'a, const M: usize> Drop for LogSnapshot<'a, M> {
    fn drop(&mut self) {
        self.log.state.fetch_and(!CLAIM_BIT, Ordering::Release);
    }
}
