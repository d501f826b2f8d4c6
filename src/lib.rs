#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![forbid(unreachable_pub)]
#![forbid(unsafe_code)]

//! Completely Fair Scheduler core for `no_std` kernels.
//!
//! This library implements the CPU-time accounting and selection logic of a
//! completely fair scheduler: every runnable entity accrues *virtual runtime*
//! inversely proportional to its weight, and the entity with the least
//! virtual runtime runs next.
//!
//! # Features
//!
//! - `trace-slices`: emit a `log::trace!` record for every slice computation
//!
//! # Quick Start
//!
//! ```
//! use fair_sched::{CfsScheduler, Scheduler, TickCounter};
//!
//! let scheduler = CfsScheduler::new(1);
//! let ticks = TickCounter::new(1000);
//!
//! let a = scheduler.spawn(0, 0).unwrap();
//! let b = scheduler.spawn(0, 5).unwrap();
//! scheduler.enqueue(0, a);
//! scheduler.enqueue(0, b);
//! scheduler.pick_next(0, ticks.now_us());
//!
//! // From the timer interrupt:
//! let now = ticks.increment();
//! scheduler.on_tick(0, now);
//!
//! // Later, from the context-switch path:
//! if scheduler.take_preempt(0) {
//!     scheduler.on_yield(0, now);
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized around a few key pieces:
//! - An index-based red-black tree ([`rbtree`]) ordering entities by key
//! - Nice level weights with fixed-point inverses ([`sched::weight`])
//! - The single-CPU run-queue ([`CfsRunQueue`]) with tick accounting and
//!   the yield decision
//! - A per-CPU scheduler ([`CfsScheduler`]) behind the [`Scheduler`] trait
//! - Interrupt-safe yield signalling ([`PreemptFlag`]) and tick counting
//!   ([`TickCounter`])

// Core modules
pub mod errors;
pub mod preempt;
pub mod rbtree;
pub mod sched;
pub mod time;

#[cfg(test)]
extern crate std;

extern crate alloc;

#[cfg(test)]
mod tests;

// ============================================================================
// Public API
// ============================================================================

// Scheduler
pub use sched::{
    CfsRunQueue, CfsScheduler, CpuId, DefaultScheduler, EntityId, LoadWeight, SchedEntity,
    Scheduler,
};

// Yield signalling
pub use preempt::{PreemptFlag, YieldSignal};

// Time
pub use time::TickCounter;

// Errors
pub use errors::{SchedError, SchedResult};
