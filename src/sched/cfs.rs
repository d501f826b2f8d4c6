//! Completely fair run-queue.
//!
//! Runnable entities are ordered by virtual runtime in a red-black tree;
//! the leftmost entity is the one that has received the least weighted CPU
//! time and runs next. Each tick the running entity's virtual runtime
//! advances inversely to its weight and the queue decides whether it should
//! give up the CPU.
//!
//! # Dispatch handshake
//!
//! The running entity (`curr`) is normally *not* in the timeline: the
//! caller dequeues it when it is dispatched and enqueues it again when it
//! is preempted. [`CfsRunQueue::schedule`], [`CfsRunQueue::put_prev`],
//! [`CfsRunQueue::set_next`] and [`CfsRunQueue::block_curr`] implement that
//! protocol. [`CfsRunQueue::set_curr`] is the raw form and leaves the
//! protocol to the caller.

use super::arena::EntityArena;
use super::config::{
    NICE_0_WEIGHT, SCHED_LATENCY_US, SCHED_MIN_GRANULARITY, SCHED_NR_LATENCY, WMULT_SHIFT,
};
use super::entity::{EntityId, SchedEntity};
use super::trait_def::CpuId;
use super::weight::{inverse_weight, LoadWeight};
use crate::errors::{SchedError, SchedResult};
use crate::preempt::YieldSignal;
use crate::rbtree::{NodeId, RbRoot, RbViolation};
use log::debug;

/// Period in which each of `nr_running` entities should run once.
pub fn calc_period(nr_running: usize) -> u64 {
    let nr = nr_running as u64;
    if nr > SCHED_NR_LATENCY {
        nr * SCHED_MIN_GRANULARITY
    } else {
        SCHED_LATENCY_US
    }
}

/// `delta_exec * weight * inv_weight >> 32`, without intermediate overflow.
pub fn calc_delta(delta_exec: u64, weight: u32, inv_weight: u32) -> u64 {
    let scaled = u128::from(delta_exec) * u128::from(weight) * u128::from(inv_weight);
    u64::try_from(scaled >> WMULT_SHIFT).unwrap_or(u64::MAX)
}

/// Convert wall-clock runtime into virtual runtime for `load`.
///
/// A nice 0 entity advances one to one; heavier entities advance slower.
pub fn calc_delta_vslice(delta_exec: u64, load: &LoadWeight) -> u64 {
    if load.weight == NICE_0_WEIGHT {
        return delta_exec;
    }
    calc_delta(delta_exec, NICE_0_WEIGHT, load.inv_weight)
}

/// Run-queue of one CPU.
#[derive(Debug)]
pub struct CfsRunQueue {
    cpu: CpuId,
    load: LoadWeight,
    nr_running: usize,
    min_vruntime: u64,
    proc_timeline: RbRoot,
    leftmost: Option<NodeId>,
    curr: Option<EntityId>,
    entities: EntityArena,
}

impl CfsRunQueue {
    /// Create an empty run-queue for `cpu`.
    pub const fn new(cpu: CpuId) -> Self {
        Self {
            cpu,
            load: LoadWeight::empty(),
            nr_running: 0,
            min_vruntime: 0,
            proc_timeline: RbRoot::new(),
            leftmost: None,
            curr: None,
            entities: EntityArena::new(),
        }
    }

    pub fn cpu(&self) -> CpuId {
        self.cpu
    }

    /// Aggregate weight of the queued entities.
    pub fn load(&self) -> &LoadWeight {
        &self.load
    }

    /// Number of entities in the timeline.
    pub fn nr_running(&self) -> usize {
        self.nr_running
    }

    /// Entities competing for this CPU: the queued ones plus a running
    /// entity that was taken off the timeline.
    pub fn nr_runnable(&self) -> usize {
        let running_off_queue = self.curr_entity().map_or(false, |se| !se.on_rq);
        self.nr_running + usize::from(running_off_queue)
    }

    pub fn min_vruntime(&self) -> u64 {
        self.min_vruntime
    }

    /// Currently running entity.
    pub fn curr(&self) -> Option<EntityId> {
        self.curr
    }

    /// Entity with the smallest virtual runtime in the timeline.
    pub fn leftmost(&self) -> Option<EntityId> {
        self.leftmost.and_then(|idx| self.entities.id_at(idx))
    }

    pub fn entity(&self, id: EntityId) -> Option<&SchedEntity> {
        self.entities.get(id)
    }

    /// All entities owned by this queue, queued or not.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &SchedEntity)> + '_ {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Queued entities in virtual runtime order.
    pub fn timeline(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.proc_timeline
            .iter(&self.entities)
            .filter_map(move |idx| self.entities.id_at(idx))
    }

    /// Verify the timeline's tree invariants. Walks the whole tree.
    pub fn check_timeline(&self) -> Result<usize, RbViolation> {
        self.proc_timeline.check_invariants(&self.entities)
    }

    fn curr_entity(&self) -> Option<&SchedEntity> {
        self.curr.and_then(|id| self.entities.get(id))
    }

    fn leftmost_entity(&self) -> Option<&SchedEntity> {
        self.leftmost
            .and_then(|idx| self.entities.id_at(idx))
            .and_then(|id| self.entities.get(id))
    }

    fn refresh_leftmost(&mut self) {
        self.leftmost = self.proc_timeline.leftmost(&self.entities);
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    /// Create a nice 0 entity owned by this queue. It is not queued.
    pub fn spawn_entity(&mut self) -> EntityId {
        let id = self.entities.insert(SchedEntity::new());
        debug!("cfs[{}]: spawn {}", self.cpu, id);
        id
    }

    /// Create an entity at `nice`. It is not queued.
    pub fn spawn_entity_with_nice(&mut self, nice: i32) -> SchedResult<EntityId> {
        let mut se = SchedEntity::new();
        se.set_nice(nice)?;
        let id = self.entities.insert(se);
        debug!("cfs[{}]: spawn {} nice={}", self.cpu, id, nice);
        Ok(id)
    }

    /// Create a child of `parent` seeded at the current `min_vruntime`.
    pub fn fork_entity(&mut self, parent: EntityId) -> SchedResult<EntityId> {
        let parent_se = self
            .entities
            .get(parent)
            .ok_or(SchedError::UnknownEntity(parent))?;
        let mut child = SchedEntity::fork_from(parent_se, self.min_vruntime);
        child.cfs_rq = Some(self.cpu);

        let id = self.entities.insert(child);
        debug!(
            "cfs[{}]: fork {} -> {} vruntime={}",
            self.cpu, parent, id, self.min_vruntime
        );
        Ok(id)
    }

    /// Destroy an entity, taking it off the timeline and out of `curr`.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<SchedEntity> {
        self.entities.get(id)?;
        self.dequeue(id);
        if self.curr == Some(id) {
            self.curr = None;
        }
        debug!("cfs[{}]: remove {}", self.cpu, id);
        self.entities.remove(id)
    }

    /// Nice level of an entity.
    pub fn nice(&self, id: EntityId) -> Option<i32> {
        self.entities.get(id).map(SchedEntity::nice)
    }

    /// Change an entity's nice level, reweighting the queue if it is queued.
    pub fn set_nice(&mut self, id: EntityId, nice: i32) -> SchedResult<()> {
        let load = LoadWeight::from_nice(nice)?;
        let se = self
            .entities
            .get_mut(id)
            .ok_or(SchedError::UnknownEntity(id))?;

        let old_weight = se.load.weight;
        se.load = load;
        if se.on_rq {
            self.load.sub(old_weight);
            self.load.add(load.weight);
        }
        debug!(
            "cfs[{}]: {} nice={} weight={} queue weight={}",
            self.cpu, id, nice, load.weight, self.load.weight
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Enqueue / dequeue / pick
    // ------------------------------------------------------------------

    /// Insert an entity into the timeline at its current virtual runtime.
    ///
    /// Unknown handles and entities that are already queued are ignored.
    pub fn enqueue(&mut self, id: EntityId) {
        let Some(se) = self.entities.get_mut(id) else {
            return;
        };
        if se.on_rq {
            return;
        }

        se.sync_key();
        se.on_rq = true;
        se.cfs_rq = Some(self.cpu);
        let weight = se.load.weight;
        let vruntime = se.vruntime;

        self.proc_timeline.insert(&mut self.entities, id.index());
        self.nr_running += 1;
        self.load.add(weight);
        self.refresh_leftmost();

        debug!(
            "cfs[{}]: enqueue {} weight={} vruntime={} nr_running={}",
            self.cpu, id, weight, vruntime, self.nr_running
        );
    }

    /// Take an entity out of the timeline, keeping its fairness state.
    ///
    /// Unknown handles and entities that are not queued are ignored.
    pub fn dequeue(&mut self, id: EntityId) {
        let Some(se) = self.entities.get_mut(id) else {
            return;
        };
        if !se.on_rq {
            return;
        }

        se.on_rq = false;
        let weight = se.load.weight;

        self.proc_timeline.delete(&mut self.entities, id.index());
        self.nr_running -= 1;
        self.load.sub(weight);
        self.refresh_leftmost();

        debug!(
            "cfs[{}]: dequeue {} nr_running={}",
            self.cpu, id, self.nr_running
        );
    }

    /// Entity that should run next. Does not modify the queue.
    pub fn pick_next(&self) -> Option<EntityId> {
        if self.nr_running == 0 {
            return None;
        }
        self.leftmost()
    }

    // ------------------------------------------------------------------
    // Dispatch handshake
    // ------------------------------------------------------------------

    /// Set the running entity without touching the timeline.
    ///
    /// The caller must have dequeued the entity and must enqueue it again
    /// when it stops running. Unknown handles clear `curr`.
    pub fn set_curr(&mut self, id: Option<EntityId>) {
        self.curr = id.filter(|&id| self.entities.get(id).is_some());
    }

    /// Account the running entity up to `now_us` and queue it again.
    pub fn put_prev(&mut self, now_us: u64) -> Option<EntityId> {
        let prev = self.curr?;
        self.update_entity_stat(now_us);
        self.curr = None;
        self.enqueue(prev);
        Some(prev)
    }

    /// Dispatch `id`: take it off the timeline and start a new run episode.
    ///
    /// Any previous `curr` is replaced without being requeued; call
    /// [`put_prev`](Self::put_prev) first to keep it runnable.
    pub fn set_next(&mut self, id: EntityId, now_us: u64) -> SchedResult<()> {
        if self.entities.get(id).is_none() {
            return Err(SchedError::UnknownEntity(id));
        }

        self.dequeue(id);
        if let Some(se) = self.entities.get_mut(id) {
            se.reset(now_us);
        }
        self.curr = Some(id);
        self.update_min_vruntime();

        debug!("cfs[{}]: dispatch {} at {}us", self.cpu, id, now_us);
        Ok(())
    }

    /// Requeue the running entity and dispatch the leftmost one.
    ///
    /// Returns the new running entity, or `None` if nothing is runnable.
    pub fn schedule(&mut self, now_us: u64) -> Option<EntityId> {
        self.put_prev(now_us);
        let next = self.pick_next()?;
        self.set_next(next, now_us).ok()?;
        Some(next)
    }

    /// Account the running entity and drop it from `curr` without
    /// requeueing it, as when it blocks or exits.
    pub fn block_curr(&mut self, now_us: u64) -> Option<EntityId> {
        let prev = self.curr?;
        self.update_entity_stat(now_us);
        self.curr = None;
        self.dequeue(prev);
        debug!("cfs[{}]: block {}", self.cpu, prev);
        Some(prev)
    }

    // ------------------------------------------------------------------
    // Time accounting
    // ------------------------------------------------------------------

    /// Charge the running entity for the time since its last update.
    pub fn update_entity_stat(&mut self, now_us: u64) {
        let Some(curr) = self.curr else {
            return;
        };
        let Some(se) = self.entities.get_mut(curr) else {
            self.curr = None;
            return;
        };

        let delta_exec = now_us.saturating_sub(se.exec_start);
        se.exec_start = now_us;
        se.sum_exec_runtime += delta_exec;
        se.tot_exec_runtime += delta_exec;
        se.vruntime += calc_delta_vslice(delta_exec, &se.load);
        let on_rq = se.on_rq;

        if on_rq {
            // Left in the timeline by the caller: move it to its new key.
            self.proc_timeline.delete(&mut self.entities, curr.index());
        }
        if let Some(se) = self.entities.get_mut(curr) {
            se.sync_key();
        }
        if on_rq {
            self.proc_timeline.insert(&mut self.entities, curr.index());
            self.refresh_leftmost();
        }

        self.update_min_vruntime();
    }

    /// Advance the `min_vruntime` watermark. It never moves backwards.
    pub fn update_min_vruntime(&mut self) {
        let mut candidate = self.min_vruntime;
        if let Some(curr) = self.curr_entity() {
            candidate = curr.vruntime;
        }
        if let Some(leftmost) = self.leftmost_entity() {
            candidate = candidate.min(leftmost.vruntime);
        }
        self.min_vruntime = self.min_vruntime.max(candidate);
    }

    // ------------------------------------------------------------------
    // Slice and yield decision
    // ------------------------------------------------------------------

    /// Ideal time slice of an entity on this queue.
    pub fn calc_slice(&self, id: EntityId) -> Option<u64> {
        self.entities.get(id).map(|se| self.slice_of(se))
    }

    fn slice_of(&self, se: &SchedEntity) -> u64 {
        let nr_running = self.nr_running + usize::from(!se.on_rq);
        // An entity outside the timeline still competes with its own weight.
        let q_inv_weight = if se.on_rq {
            self.load.inv_weight
        } else {
            inverse_weight(self.load.weight.saturating_add(se.load.weight))
        };

        let slice = calc_delta(calc_period(nr_running), se.load.weight, q_inv_weight);

        #[cfg(feature = "trace-slices")]
        log::trace!(
            "cfs[{}]: w={} qinv={} => slice={}",
            self.cpu,
            se.load.weight,
            q_inv_weight,
            slice
        );
        slice
    }

    /// Whether the running entity should give up the CPU now.
    pub fn check_yield(&self) -> bool {
        let Some(curr) = self.curr_entity() else {
            return false;
        };

        let runtime = curr.sum_exec_runtime;
        if runtime < SCHED_MIN_GRANULARITY {
            return false;
        }

        let ideal_runtime = self.slice_of(curr);
        if runtime >= ideal_runtime {
            debug!(
                "cfs[{}]: over ideal runtime: runtime={} ideal={} nr_running={}",
                self.cpu, runtime, ideal_runtime, self.nr_running
            );
            return true;
        }

        match self.leftmost_entity() {
            Some(leftmost) if leftmost.vruntime < curr.vruntime => {
                debug!(
                    "cfs[{}]: smaller vruntime waiting: {} < {}",
                    self.cpu, leftmost.vruntime, curr.vruntime
                );
                true
            }
            _ => false,
        }
    }

    /// Per-tick entry point.
    ///
    /// Charges the running entity up to `now_us` and raises `signal` if it
    /// should yield. Returns whether the signal was raised.
    pub fn check_tick<Y: YieldSignal + ?Sized>(&mut self, now_us: u64, signal: &Y) -> bool {
        self.update_entity_stat(now_us);

        if self.nr_runnable() > 1 && self.check_yield() {
            signal.request_yield();
            return true;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut SchedEntity> {
        self.entities.get_mut(id)
    }
}
