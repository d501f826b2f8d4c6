//! Yield signalling between the tick path and the context-switch code.
//!
//! The scheduling core never switches context itself. When a tick decides
//! the running entity must give up the CPU it raises a [`YieldSignal`];
//! whoever owns context switching acts on it outside the tick path.

use portable_atomic::{AtomicBool, AtomicU64, Ordering};

/// Receiver of "the running entity should yield now" requests.
pub trait YieldSignal {
    fn request_yield(&self);
}

impl<F: Fn()> YieldSignal for F {
    fn request_yield(&self) {
        self()
    }
}

/// Pending-yield flag suitable for interrupt context.
///
/// Raising only touches atomics; the actual reschedule happens when the
/// owner calls [`take`](Self::take) from normal context.
#[derive(Debug, Default)]
pub struct PreemptFlag {
    pending: AtomicBool,
    count: AtomicU64,
}

impl PreemptFlag {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            count: AtomicU64::new(0),
        }
    }

    /// Check if a yield is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consume the pending request, returning whether there was one.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Drop any pending request.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Total number of requests raised, for statistics.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl YieldSignal for PreemptFlag {
    fn request_yield(&self) {
        self.pending.store(true, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}
