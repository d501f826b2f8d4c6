//! Tick counting.

use portable_atomic::{AtomicU64, Ordering};

/// Global tick counter for scheduler time.
///
/// This counter is incremented on every timer interrupt and provides the
/// monotonic microsecond clock that `check_tick` expects.
pub struct TickCounter {
    /// Number of ticks since system start
    ticks: AtomicU64,
    /// Tick frequency in Hz
    frequency: u32,
    /// Microseconds per tick
    us_per_tick: u64,
}

impl TickCounter {
    /// Create a new tick counter with the given frequency.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Timer frequency in Hz, at most 1 MHz
    pub const fn new(frequency: u32) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            frequency,
            us_per_tick: 1_000_000 / frequency as u64,
        }
    }

    /// Increment the tick counter and return the new time in microseconds.
    ///
    /// This should only be called from the timer interrupt handler.
    pub fn increment(&self) -> u64 {
        let ticks = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        self.ticks_to_us(ticks)
    }

    /// Get the current tick count.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Get the tick frequency in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Convert ticks to microseconds.
    pub fn ticks_to_us(&self, ticks: u64) -> u64 {
        ticks * self.us_per_tick
    }

    /// Convert microseconds to whole ticks.
    pub fn us_to_ticks(&self, us: u64) -> u64 {
        us / self.us_per_tick
    }

    /// Current time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.ticks_to_us(self.ticks())
    }
}

/// Global tick counter instance.
pub static GLOBAL_TICK_COUNTER: TickCounter = TickCounter::new(super::TIMER_FREQUENCY_HZ);
