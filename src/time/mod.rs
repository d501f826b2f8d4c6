//! Tick source for the scheduling core.
//!
//! The run-queue only ever sees microsecond timestamps. This module turns
//! timer interrupts into those timestamps.

pub mod tick;

pub use tick::TickCounter;

/// Frequency in Hz for timer interrupts.
pub const TIMER_FREQUENCY_HZ: u32 = 1000; // 1 kHz = 1ms ticks

/// Microseconds in one tick at [`TIMER_FREQUENCY_HZ`].
pub const TICK_US: u64 = 1_000_000 / TIMER_FREQUENCY_HZ as u64;
