//! Per-task scheduling state.

use super::trait_def::CpuId;
use super::weight::LoadWeight;
use crate::errors::SchedResult;
use crate::rbtree::RbNode;
use core::fmt;

/// Handle of a [`SchedEntity`] owned by a run-queue.
///
/// Slots are reused after an entity is removed; the generation makes a
/// handle to the old occupant stale instead of aliasing the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    index: usize,
    generation: u32,
}

impl EntityId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot of this entity. Also the id of its tree node.
    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

/// Fairness state of one schedulable unit of work.
///
/// The embedded `run_node` orders the entity in its run-queue's timeline;
/// its key always mirrors `vruntime` once the run-queue has touched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedEntity {
    pub(crate) load: LoadWeight,
    pub(crate) run_node: RbNode,

    /// Start of the current on-CPU burst, in microseconds.
    pub(crate) exec_start: u64,
    /// Runtime since the entity was last dispatched.
    pub(crate) sum_exec_runtime: u64,
    /// Lifetime runtime. Never reset.
    pub(crate) tot_exec_runtime: u64,
    pub(crate) vruntime: u64,

    pub(crate) on_rq: bool,
    pub(crate) cfs_rq: Option<CpuId>,
}

impl SchedEntity {
    /// Fresh entity: nice 0, zero vruntime, not queued anywhere.
    pub fn new() -> Self {
        Self {
            load: LoadWeight::NICE_0,
            run_node: RbNode::new(0),
            exec_start: 0,
            sum_exec_runtime: 0,
            tot_exec_runtime: 0,
            vruntime: 0,
            on_rq: false,
            cfs_rq: None,
        }
    }

    /// Reset to the freshly created state, keeping the queue link.
    pub fn init(&mut self) {
        let cfs_rq = self.cfs_rq;
        *self = Self::new();
        self.cfs_rq = cfs_rq;
    }

    /// Derive a forked child from `parent`.
    ///
    /// The child inherits the parent's weight and queue, starts at
    /// `min_vruntime` so it neither jumps ahead of nor lags behind the
    /// tasks already running, and has no runtime history.
    pub fn fork_from(parent: &SchedEntity, min_vruntime: u64) -> Self {
        Self {
            load: parent.load,
            run_node: RbNode::new(min_vruntime),
            exec_start: 0,
            sum_exec_runtime: 0,
            tot_exec_runtime: 0,
            vruntime: min_vruntime,
            on_rq: false,
            cfs_rq: parent.cfs_rq,
        }
    }

    /// Start a new run episode at `now_us`.
    pub fn reset(&mut self, now_us: u64) {
        self.exec_start = now_us;
        self.sum_exec_runtime = 0;
    }

    pub fn nice(&self) -> i32 {
        self.load.nice
    }

    /// Change the nice level, updating weight and inverse together.
    ///
    /// This only touches the entity. Use
    /// [`CfsRunQueue::set_nice`](super::CfsRunQueue::set_nice) for an entity
    /// that is queued so the queue's aggregate follows.
    pub fn set_nice(&mut self, nice: i32) -> SchedResult<()> {
        self.load = LoadWeight::from_nice(nice)?;
        Ok(())
    }

    pub fn load(&self) -> &LoadWeight {
        &self.load
    }

    pub fn vruntime(&self) -> u64 {
        self.vruntime
    }

    pub fn exec_start(&self) -> u64 {
        self.exec_start
    }

    pub fn sum_exec_runtime(&self) -> u64 {
        self.sum_exec_runtime
    }

    pub fn tot_exec_runtime(&self) -> u64 {
        self.tot_exec_runtime
    }

    /// Whether the entity is linked into its run-queue's timeline.
    pub fn on_rq(&self) -> bool {
        self.on_rq
    }

    /// CPU of the run-queue this entity last joined.
    pub fn cfs_rq(&self) -> Option<CpuId> {
        self.cfs_rq
    }

    /// Current timeline key.
    pub fn key(&self) -> u64 {
        self.run_node.key
    }

    pub(crate) fn sync_key(&mut self) {
        self.run_node.key = self.vruntime;
    }
}

impl Default for SchedEntity {
    fn default() -> Self {
        Self::new()
    }
}
