//! Per-CPU completely fair scheduler.

use super::cfs::CfsRunQueue;
use super::entity::EntityId;
use super::trait_def::{CpuId, Scheduler};
use crate::errors::{SchedError, SchedResult};
use crate::preempt::PreemptFlag;
use alloc::{boxed::Box, vec::Vec};
use log::debug;
use portable_atomic::{AtomicUsize, Ordering};

/// Completely fair scheduler with one run-queue per CPU.
///
/// Each queue is guarded by its own spinlock so the tick path of one CPU
/// never contends with another. Entities stay on the CPU they were spawned
/// on; there is no load balancing between queues.
pub struct CfsScheduler {
    /// Number of CPUs in the system
    num_cpus: usize,
    /// Per-CPU run queues
    run_queues: Box<[spin::Mutex<CfsRunQueue>]>,
    /// Per-CPU pending yield requests raised by `on_tick`
    preempt: Box<[PreemptFlag]>,
    /// Global statistics
    total_entities: AtomicUsize,
}

impl CfsScheduler {
    /// Create a new fair scheduler for the given number of CPUs.
    pub fn new(num_cpus: usize) -> Self {
        let mut run_queues = Vec::with_capacity(num_cpus);
        let mut preempt = Vec::with_capacity(num_cpus);
        for cpu in 0..num_cpus {
            run_queues.push(spin::Mutex::new(CfsRunQueue::new(cpu)));
            preempt.push(PreemptFlag::new());
        }

        Self {
            num_cpus,
            run_queues: run_queues.into_boxed_slice(),
            preempt: preempt.into_boxed_slice(),
            total_entities: AtomicUsize::new(0),
        }
    }

    pub fn num_cpus(&self) -> usize {
        self.num_cpus
    }

    fn queue(&self, cpu: CpuId) -> SchedResult<&spin::Mutex<CfsRunQueue>> {
        self.run_queues.get(cpu).ok_or(SchedError::InvalidCpu(cpu))
    }

    /// Lock the run-queue of `cpu` for direct inspection or manipulation.
    pub fn lock(&self, cpu: CpuId) -> SchedResult<spin::MutexGuard<'_, CfsRunQueue>> {
        Ok(self.queue(cpu)?.lock())
    }

    /// Preempt flag of `cpu`.
    pub fn preempt_flag(&self, cpu: CpuId) -> Option<&PreemptFlag> {
        self.preempt.get(cpu)
    }

    /// Consume the pending yield request of `cpu`.
    ///
    /// Called by the context-switch code outside the tick path.
    pub fn take_preempt(&self, cpu: CpuId) -> bool {
        self.preempt.get(cpu).map_or(false, PreemptFlag::take)
    }

    /// Entity currently running on `cpu`.
    pub fn current(&self, cpu: CpuId) -> Option<EntityId> {
        self.queue(cpu).ok()?.lock().curr()
    }
}

impl Scheduler for CfsScheduler {
    fn spawn(&self, cpu: CpuId, nice: i32) -> SchedResult<EntityId> {
        let id = self.queue(cpu)?.lock().spawn_entity_with_nice(nice)?;
        self.total_entities.fetch_add(1, Ordering::AcqRel);
        Ok(id)
    }

    fn fork(&self, cpu: CpuId, parent: EntityId) -> SchedResult<EntityId> {
        let id = self.queue(cpu)?.lock().fork_entity(parent)?;
        self.total_entities.fetch_add(1, Ordering::AcqRel);
        Ok(id)
    }

    fn exit(&self, cpu: CpuId, id: EntityId) -> SchedResult<()> {
        self.queue(cpu)?
            .lock()
            .remove_entity(id)
            .ok_or(SchedError::UnknownEntity(id))?;
        self.total_entities.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }

    fn enqueue(&self, cpu: CpuId, id: EntityId) {
        if let Ok(queue) = self.queue(cpu) {
            queue.lock().enqueue(id);
        }
    }

    fn dequeue(&self, cpu: CpuId, id: EntityId) {
        if let Ok(queue) = self.queue(cpu) {
            queue.lock().dequeue(id);
        }
    }

    fn pick_next(&self, cpu: CpuId, now_us: u64) -> Option<EntityId> {
        let next = self.queue(cpu).ok()?.lock().schedule(now_us);
        // A fresh dispatch supersedes any request raised for the old entity.
        self.preempt[cpu].clear();
        next
    }

    fn on_tick(&self, cpu: CpuId, now_us: u64) -> bool {
        let Ok(queue) = self.queue(cpu) else {
            return false;
        };
        let yielded = queue.lock().check_tick(now_us, &self.preempt[cpu]);
        if yielded {
            debug!("cpu{}: yield requested at {}us", cpu, now_us);
        }
        yielded
    }

    fn set_nice(&self, cpu: CpuId, id: EntityId, nice: i32) -> SchedResult<()> {
        self.queue(cpu)?.lock().set_nice(id, nice)
    }

    fn on_block(&self, cpu: CpuId, now_us: u64) -> Option<EntityId> {
        let blocked = self.queue(cpu).ok()?.lock().block_curr(now_us);
        self.preempt[cpu].clear();
        blocked
    }

    fn stats(&self) -> (usize, usize, usize) {
        let total = self.total_entities.load(Ordering::Acquire);
        let runnable = self
            .run_queues
            .iter()
            .map(|queue| queue.lock().nr_runnable())
            .sum();
        let blocked = total.saturating_sub(runnable);
        (total, runnable, blocked)
    }
}
