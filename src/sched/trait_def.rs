//! Scheduler trait definition for per-CPU fair scheduling.

use super::entity::EntityId;
use crate::errors::SchedResult;

/// CPU identifier type.
pub type CpuId = usize;

/// Scheduler trait for per-CPU implementations.
///
/// Entities live on the run-queue of the CPU they were spawned on and
/// handles are only meaningful together with that CPU. Time is passed in as
/// monotonic microseconds; the scheduler never reads a clock itself.
pub trait Scheduler: Send + Sync {
    /// Create a new entity on `cpu` at the given nice level.
    ///
    /// The entity is not runnable until it is enqueued.
    fn spawn(&self, cpu: CpuId, nice: i32) -> SchedResult<EntityId>;

    /// Create a child of `parent` on the same CPU.
    ///
    /// The child inherits the parent's nice level and starts at the queue's
    /// minimum virtual runtime.
    fn fork(&self, cpu: CpuId, parent: EntityId) -> SchedResult<EntityId>;

    /// Destroy an entity, removing it from every scheduler structure.
    fn exit(&self, cpu: CpuId, id: EntityId) -> SchedResult<()>;

    /// Make an entity runnable.
    ///
    /// Enqueueing an entity that is already queued does nothing.
    fn enqueue(&self, cpu: CpuId, id: EntityId);

    /// Make an entity not runnable, keeping its fairness state.
    fn dequeue(&self, cpu: CpuId, id: EntityId);

    /// Switch `cpu` to the entity that should run next.
    ///
    /// The entity running so far is accounted up to `now_us` and queued
    /// again. Returns the entity now running, or `None` if the CPU is idle.
    fn pick_next(&self, cpu: CpuId, now_us: u64) -> Option<EntityId>;

    /// Handle a timer tick on `cpu`.
    ///
    /// Charges the running entity and returns `true` if it should give up
    /// the CPU. The request is also left pending on the CPU's preempt flag.
    fn on_tick(&self, cpu: CpuId, now_us: u64) -> bool;

    /// Change the nice level of an entity.
    ///
    /// # Arguments
    ///
    /// * `cpu` - CPU the entity lives on
    /// * `id` - Entity to modify
    /// * `nice` - New nice level (-20..=19, lower = more CPU)
    fn set_nice(&self, cpu: CpuId, id: EntityId, nice: i32) -> SchedResult<()>;

    /// Handle the running entity yielding the CPU voluntarily.
    fn on_yield(&self, cpu: CpuId, now_us: u64) -> Option<EntityId> {
        // Default implementation: treat yield like normal preemption
        self.pick_next(cpu, now_us)
    }

    /// Handle the running entity blocking.
    ///
    /// The entity is accounted and left out of the timeline until it is
    /// woken up. Returns the entity that blocked.
    fn on_block(&self, cpu: CpuId, now_us: u64) -> Option<EntityId>;

    /// Wake up a blocked entity.
    fn wake_up(&self, cpu: CpuId, id: EntityId) {
        self.enqueue(cpu, id);
    }

    /// Get scheduler statistics.
    ///
    /// A tuple of (total_entities, runnable_entities, blocked_entities).
    fn stats(&self) -> (usize, usize, usize) {
        // Default implementation returns zeros
        (0, 0, 0)
    }
}
