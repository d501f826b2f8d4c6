//! Error handling for the scheduling core.
//!
//! Most run-queue operations are infallible by contract: absent entities,
//! double enqueues and empty queues are silent no-ops. The errors below
//! cover the inputs that can't be turned into a no-op safely.

#![allow(clippy::uninlined_format_args)]

use crate::sched::{CpuId, EntityId};
use core::fmt;

/// Result type for scheduling operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Error type for all fallible scheduling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Nice level outside `-20..=19`
    InvalidNice(i32),
    /// Entity handle is stale or was never issued by this run-queue
    UnknownEntity(EntityId),
    /// CPU does not exist
    InvalidCpu(CpuId),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::InvalidNice(nice) => {
                write!(f, "Invalid nice level: {} (expected -20..=19)", nice)
            }
            SchedError::UnknownEntity(id) => write!(f, "Unknown scheduling entity: {}", id),
            SchedError::InvalidCpu(cpu) => write!(f, "Invalid CPU ID: {}", cpu),
        }
    }
}

impl SchedError {
    /// Whether the error was caused by an argument outside its domain.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SchedError::InvalidNice(_) | SchedError::InvalidCpu(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SchedError::InvalidNice(25).to_string(),
            "Invalid nice level: 25 (expected -20..=19)"
        );
        assert_eq!(SchedError::InvalidCpu(3).to_string(), "Invalid CPU ID: 3");
    }

    #[test]
    fn test_invalid_argument_class() {
        assert!(SchedError::InvalidNice(-21).is_invalid_argument());
        assert!(SchedError::InvalidCpu(9).is_invalid_argument());
        assert!(!SchedError::UnknownEntity(EntityId::new(0, 0)).is_invalid_argument());
    }
}
