//! Completely fair scheduling.
//!
//! [`CfsRunQueue`] is the single-CPU core: entities, their weights and the
//! virtual runtime timeline. [`CfsScheduler`] puts one run-queue per CPU
//! behind the [`Scheduler`] trait.

mod arena;
pub mod cfs;
pub mod config;
pub mod entity;
pub mod fair;
pub mod trait_def;
pub mod weight;

pub use cfs::{calc_delta, calc_delta_vslice, calc_period, CfsRunQueue};
pub use entity::{EntityId, SchedEntity};
pub use fair::CfsScheduler;
pub use trait_def::{CpuId, Scheduler};
pub use weight::{LoadWeight, NICE_MAX, NICE_MIN};

/// Default scheduler type.
pub type DefaultScheduler = CfsScheduler;
