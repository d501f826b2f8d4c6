//! Nice level to load weight mapping.
//!
//! Each nice step changes the weight by roughly 1.25x, so two entities one
//! nice level apart split the CPU about 55/45. The inverse table holds
//! `2^32 / weight` so slice arithmetic can multiply instead of divide.

use super::config::{NICE_0_WEIGHT, WMULT_CONST};
use crate::errors::{SchedError, SchedResult};

/// Lowest (most favoured) nice level.
pub const NICE_MIN: i32 = -20;

/// Highest (least favoured) nice level.
pub const NICE_MAX: i32 = 19;

/// Number of nice levels.
pub const NICE_WIDTH: usize = 40;

/// Weight for each nice level, indexed by `nice + 20`.
pub static PRIO_TO_WEIGHT: [u32; NICE_WIDTH] = [
    /* -20 */ 88761, 71755, 56483, 46273, 36291,
    /* -15 */ 29154, 23254, 18705, 14949, 11916,
    /* -10 */ 9548, 7620, 6100, 4904, 3906,
    /*  -5 */ 3121, 2501, 1991, 1586, 1277,
    /*   0 */ 1024, 820, 655, 526, 423,
    /*   5 */ 335, 272, 215, 172, 137,
    /*  10 */ 110, 87, 70, 56, 45,
    /*  15 */ 36, 29, 23, 18, 15,
];

/// `2^32 / weight` for each nice level, indexed by `nice + 20`.
pub static PRIO_TO_WMULT: [u32; NICE_WIDTH] = [
    /* -20 */ 48388, 59856, 76040, 92818, 118348,
    /* -15 */ 147320, 184698, 229616, 287308, 360437,
    /* -10 */ 449829, 563644, 704093, 875809, 1099582,
    /*  -5 */ 1376151, 1717300, 2157191, 2708050, 3363326,
    /*   0 */ 4194304, 5237765, 6557202, 8165337, 10153587,
    /*   5 */ 12820798, 15790321, 19976592, 24970740, 31350126,
    /*  10 */ 39045157, 49367440, 61356676, 76695844, 95443717,
    /*  15 */ 119304647, 148102320, 186737708, 238609294, 286331153,
];

/// Table index for a nice level.
pub fn nice_to_index(nice: i32) -> SchedResult<usize> {
    if (NICE_MIN..=NICE_MAX).contains(&nice) {
        Ok((nice - NICE_MIN) as usize)
    } else {
        Err(SchedError::InvalidNice(nice))
    }
}

/// Inverse of an arbitrary weight, saturating for a zero weight.
pub fn inverse_weight(weight: u32) -> u32 {
    if weight == 0 {
        WMULT_CONST
    } else {
        WMULT_CONST / weight
    }
}

/// Scheduling weight with its fixed-point inverse.
///
/// For an entity all three fields always come from the tables above. For a
/// run-queue `weight` is the sum over queued entities and `inv_weight` is
/// recomputed from that sum after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadWeight {
    pub(crate) nice: i32,
    pub(crate) weight: u32,
    pub(crate) inv_weight: u32,
}

impl LoadWeight {
    /// Weight of a nice 0 entity.
    pub const NICE_0: LoadWeight = LoadWeight {
        nice: 0,
        weight: NICE_0_WEIGHT,
        inv_weight: 4_194_304,
    };

    /// Table weight for a nice level.
    pub fn from_nice(nice: i32) -> SchedResult<Self> {
        let idx = nice_to_index(nice)?;
        Ok(Self {
            nice,
            weight: PRIO_TO_WEIGHT[idx],
            inv_weight: PRIO_TO_WMULT[idx],
        })
    }

    /// Empty aggregate, as held by an idle run-queue.
    pub const fn empty() -> Self {
        Self {
            nice: 0,
            weight: 0,
            inv_weight: WMULT_CONST,
        }
    }

    pub fn nice(&self) -> i32 {
        self.nice
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn inv_weight(&self) -> u32 {
        self.inv_weight
    }

    /// Add a queued entity's weight to this aggregate.
    pub(crate) fn add(&mut self, weight: u32) {
        self.weight = self.weight.saturating_add(weight);
        self.update_inv_weight();
    }

    /// Remove a dequeued entity's weight from this aggregate.
    pub(crate) fn sub(&mut self, weight: u32) {
        self.weight = self.weight.saturating_sub(weight);
        self.update_inv_weight();
    }

    fn update_inv_weight(&mut self) {
        self.inv_weight = inverse_weight(self.weight);
    }
}

impl Default for LoadWeight {
    fn default() -> Self {
        Self::NICE_0
    }
}
