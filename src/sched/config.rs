//! Scheduler tuning constants.
//!
//! One timer tick is 1 ms and all slice arithmetic is done in
//! microseconds, so every tick advances the clock by 1000 us.

/// Target period in which every runnable entity runs at least once.
pub const SCHED_LATENCY_US: u64 = 18_000;

/// Shortest run an entity gets before it can be asked to yield.
pub const SCHED_MIN_GRANULARITY: u64 = 3_000;

/// Runnable count above which the period stretches past the latency.
pub const SCHED_NR_LATENCY: u64 = SCHED_LATENCY_US / SCHED_MIN_GRANULARITY;

/// Weight of a nice 0 entity.
pub const NICE_0_WEIGHT: u32 = 1024;

/// Inverse-weight numerator, also the saturated inverse of a zero weight.
pub const WMULT_CONST: u32 = 0xFFFF_FFFF;

/// Fixed-point shift of the inverse weights.
pub const WMULT_SHIFT: u32 = 32;
