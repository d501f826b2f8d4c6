//! Integration tests for complete entity lifecycles on the per-CPU scheduler.

#[cfg(test)]
mod lifecycle_tests {
    use crate::sched::{CfsScheduler, EntityId, Scheduler};
    use crate::time::{TickCounter, TIMER_FREQUENCY_HZ};
    use alloc::vec::Vec;

    const WORKERS: usize = 10;
    /// CPU time each worker needs before it exits.
    const WORK_US: u64 = 60_000;

    /// A parent forks ten busy workers and waits for all of them.
    #[test]
    fn test_forked_workers_complete() {
        let scheduler = CfsScheduler::new(1);
        let ticks = TickCounter::new(TIMER_FREQUENCY_HZ);

        let parent = scheduler.spawn(0, 0).expect("Failed to spawn parent");
        scheduler.enqueue(0, parent);
        assert_eq!(scheduler.pick_next(0, ticks.now_us()), Some(parent));

        let mut workers = Vec::new();
        for _ in 0..WORKERS {
            let child = scheduler.fork(0, parent).expect("Failed to fork worker");
            scheduler.enqueue(0, child);
            workers.push(child);
        }

        // Parent waits
        assert_eq!(scheduler.on_block(0, ticks.now_us()), Some(parent));
        assert!(scheduler.pick_next(0, ticks.now_us()).is_some());

        let mut finished: Vec<(EntityId, u64)> = Vec::new();
        while finished.len() < WORKERS {
            let now = ticks.increment();
            assert!(now <= 2 * WORK_US * WORKERS as u64, "workers starved");

            scheduler.on_tick(0, now);
            let current = scheduler.current(0).expect("runnable worker");
            let runtime = scheduler
                .lock(0)
                .unwrap()
                .entity(current)
                .map_or(0, |se| se.tot_exec_runtime());

            if runtime >= WORK_US {
                scheduler.on_block(0, now);
                scheduler.exit(0, current).expect("Failed to exit worker");
                finished.push((current, now));
                scheduler.pick_next(0, now);
            } else if scheduler.take_preempt(0) {
                scheduler.on_yield(0, now);
            }
        }

        // Every worker ran to completion exactly once
        let mut done: Vec<EntityId> = finished.iter().map(|(id, _)| *id).collect();
        done.sort();
        let mut expected = workers.clone();
        expected.sort();
        assert_eq!(done, expected);

        // Time was shared: nobody finished before the others made progress
        let first_finish = finished[0].1;
        assert!(first_finish > WORK_US * (WORKERS as u64) / 2, "first at {}", first_finish);

        // Nothing runnable until the parent is woken
        assert_eq!(scheduler.current(0), None);
        assert_eq!(scheduler.stats(), (1, 0, 1));

        scheduler.wake_up(0, parent);
        assert_eq!(scheduler.pick_next(0, ticks.now_us()), Some(parent));
        assert_eq!(scheduler.stats(), (1, 1, 0));
    }

    #[test]
    fn test_reweighted_entity_gets_more_cpu() {
        let scheduler = CfsScheduler::new(1);
        let a = scheduler.spawn(0, 0).unwrap();
        let b = scheduler.spawn(0, 0).unwrap();
        scheduler.enqueue(0, a);
        scheduler.enqueue(0, b);

        scheduler.set_nice(0, a, -5).unwrap();
        {
            let rq = scheduler.lock(0).unwrap();
            assert_eq!(rq.load().weight(), 3121 + 1024);
            assert!(rq.check_timeline().is_ok());
        }

        let ticks = TickCounter::new(TIMER_FREQUENCY_HZ);
        scheduler.pick_next(0, ticks.now_us());
        for _ in 0..20_000 {
            let now = ticks.increment();
            if scheduler.on_tick(0, now) && scheduler.take_preempt(0) {
                scheduler.on_yield(0, now);
            }
        }

        let rq = scheduler.lock(0).unwrap();
        let a_rt = rq.entity(a).unwrap().tot_exec_runtime();
        let b_rt = rq.entity(b).unwrap().tot_exec_runtime();
        assert!(a_rt > 2 * b_rt, "a {} b {}", a_rt, b_rt);
    }
}

#[cfg(test)]
mod error_handling_tests {
    use crate::errors::SchedError;
    use crate::sched::{CfsScheduler, Scheduler};

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let scheduler = CfsScheduler::new(1);
        let old = scheduler.spawn(0, 0).unwrap();
        scheduler.exit(0, old).unwrap();

        let new = scheduler.spawn(0, 3).unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);

        scheduler.enqueue(0, old);
        assert_eq!(scheduler.stats(), (1, 0, 1));
        assert_eq!(scheduler.set_nice(0, old, 1), Err(SchedError::UnknownEntity(old)));
        assert_eq!(scheduler.fork(0, old), Err(SchedError::UnknownEntity(old)));
        assert_eq!(scheduler.exit(0, old), Err(SchedError::UnknownEntity(old)));

        let rq = scheduler.lock(0).unwrap();
        assert_eq!(rq.nice(new), Some(3));
        assert!(!rq.entity(new).unwrap().on_rq());
    }

    #[test]
    fn test_invalid_nice_rejected() {
        let scheduler = CfsScheduler::new(1);
        let err = scheduler.spawn(0, 20).unwrap_err();
        assert_eq!(err, SchedError::InvalidNice(20));
        assert!(err.is_invalid_argument());
        assert_eq!(scheduler.stats(), (0, 0, 0));
    }

    #[test]
    fn test_queues_are_isolated() {
        let scheduler = CfsScheduler::new(2);
        let a = scheduler.spawn(0, 0).unwrap();
        let b = scheduler.spawn(0, 0).unwrap();
        let c = scheduler.spawn(1, 0).unwrap();
        for id in [a, b] {
            scheduler.enqueue(0, id);
        }
        scheduler.enqueue(1, c);
        scheduler.pick_next(0, 0);
        scheduler.pick_next(1, 0);

        for tick in 1..=50u64 {
            scheduler.on_tick(0, tick * 1000);
        }

        assert_eq!(scheduler.lock(1).unwrap().entity(c).unwrap().tot_exec_runtime(), 0);
        assert!(!scheduler.take_preempt(1));
        assert!(scheduler.take_preempt(0));
        assert_eq!(scheduler.stats(), (3, 3, 0));
    }

    #[test]
    fn test_invalid_cpu_rejected() {
        let scheduler = CfsScheduler::new(2);
        let a = scheduler.spawn(0, 0).unwrap();

        assert_eq!(scheduler.spawn(2, 0), Err(SchedError::InvalidCpu(2)));
        assert_eq!(scheduler.fork(2, a), Err(SchedError::InvalidCpu(2)));
        assert_eq!(scheduler.set_nice(7, a, 0), Err(SchedError::InvalidCpu(7)));
        assert_eq!(scheduler.on_block(2, 0), None);

        // Infallible operations ignore the bad CPU
        scheduler.enqueue(2, a);
        scheduler.dequeue(2, a);
        assert_eq!(scheduler.stats(), (1, 0, 1));
    }
}
