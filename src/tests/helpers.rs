//! Test helper utilities and common functionality.

use crate::preempt::PreemptFlag;
use crate::sched::{CfsRunQueue, EntityId};
use alloc::vec::Vec;

/// Simple linear congruential generator for property testing.
pub(crate) struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    pub(crate) fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        min + (self.next_u64() % (max - min))
    }

    pub(crate) fn gen_bool(&mut self) -> bool {
        self.next_u64() & 1 == 0
    }
}

/// Spawn `count` nice 0 entities on `rq` and queue them.
pub(crate) fn spawn_queued(rq: &mut CfsRunQueue, count: usize) -> Vec<EntityId> {
    (0..count)
        .map(|_| {
            let id = rq.spawn_entity();
            rq.enqueue(id);
            id
        })
        .collect()
}

/// Drive `rq` for `ticks` timer ticks of `tick_us` each, starting at
/// `start_us`, switching entities whenever a tick asks for a yield.
///
/// Returns the timestamp of the last tick.
pub(crate) fn run_ticks(rq: &mut CfsRunQueue, start_us: u64, ticks: u64, tick_us: u64) -> u64 {
    let flag = PreemptFlag::new();
    let mut now = start_us;
    if rq.curr().is_none() {
        rq.schedule(now);
    }

    for _ in 0..ticks {
        now += tick_us;
        rq.check_tick(now, &flag);
        if flag.take() {
            rq.schedule(now);
        }
    }
    now
}

/// Lifetime runtime of an entity, or 0 if it no longer exists.
pub(crate) fn runtime_of(rq: &CfsRunQueue, id: EntityId) -> u64 {
    rq.entity(id).map_or(0, |se| se.tot_exec_runtime())
}

/// Smallest and largest virtual runtime among `ids`.
pub(crate) fn vruntime_bounds(rq: &CfsRunQueue, ids: &[EntityId]) -> (u64, u64) {
    ids.iter()
        .filter_map(|id| rq.entity(*id))
        .map(|se| se.vruntime())
        .fold((u64::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
