//! Deferred destruction of reclaimed handles.
//!
//! Handles are moved out of their pools into a `Batch` while the pool locks
//! are held, then stopped and destroyed on a scheduler worker without any
//! pool lock. Failures are isolated per handle: a handle that cannot be
//! destroyed is leaked and counted in the report.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use polyclip::sched::prelude::{Promise, SchedulerSystem};
use polyclip::sched::unwind;
use smallvec::SmallVec;

use crate::clip::ClipHandle;

pub(crate) type Batch = SmallVec<[Arc<ClipHandle>; 16]>;

/// The outcome of one eviction run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictionReport {
    /// Handles taken out of their pools.
    pub collected: usize,
    /// Handles whose native sound has been released.
    pub destroyed: usize,
    /// Handles abandoned after a failed destroy.
    pub leaked: usize,
}

/// A ticket to an eviction that runs in the background.
#[derive(Clone)]
pub struct Eviction {
    collected: usize,
    promise: Arc<Promise<EvictionReport>>,
}

impl Eviction {
    /// The number of handles handed to this eviction.
    #[inline]
    pub fn collected(&self) -> usize {
        self.collected
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.promise.is_set()
    }

    /// Blocks until every handle of the batch has been processed.
    pub fn wait(&self) -> EvictionReport {
        self.promise.wait()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<EvictionReport> {
        self.promise.wait_timeout(timeout)
    }
}

/// Publishes the report once the run ends, even if the job got dropped or
/// unwound. The in-flight counter drops before waiters wake up.
struct Completion {
    active: Arc<AtomicUsize>,
    promise: Arc<Promise<EvictionReport>>,
    report: EvictionReport,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.promise.set(self.report);
    }
}

pub(crate) fn dispatch(
    scheduler: &SchedulerSystem,
    active: &Arc<AtomicUsize>,
    batch: Batch,
) -> Eviction {
    let collected = batch.len();
    let promise = Arc::new(Promise::new());

    active.fetch_add(1, Ordering::SeqCst);
    let completion = Completion {
        active: active.clone(),
        promise: promise.clone(),
        report: EvictionReport {
            collected,
            ..Default::default()
        },
    };

    debug!("Dispatches eviction of {} clip(s).", collected);
    scheduler.spawn(move || run(batch, completion));

    Eviction { collected, promise }
}

fn run(batch: Batch, mut completion: Completion) {
    for clip in batch {
        match unwind::halt_unwinding(|| clip.destroy()) {
            Ok(Ok(_)) => completion.report.destroyed += 1,
            Ok(Err(err)) => {
                warn!(
                    "Failed to destroy evicted clip {} of {}, leaks it. {}",
                    clip.id(),
                    clip.pool(),
                    err
                );
                completion.report.leaked += 1;
            }
            Err(payload) => {
                error!(
                    "Destroying evicted clip {} of {} panicked, leaks it. {}",
                    clip.id(),
                    clip.pool(),
                    unwind::describe(&*payload)
                );
                completion.report.leaked += 1;
            }
        }
    }

    info!(
        "Evicted {} clip(s), {} leaked.",
        completion.report.destroyed, completion.report.leaked
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assets::prelude::*;
    use crate::mixer::headless::HeadlessMixer;

    fn batch(mixer: &HeadlessMixer, n: usize) -> Batch {
        let format = StreamFormat::new(Encoding::UnsignedInt, 8, 1, 1000);
        let buffer = Arc::new(SampleBuffer::new(vec![128; 10_000], format).unwrap());
        (0..n)
            .map(|_| Arc::new(ClipHandle::new("evict", mixer, &buffer).unwrap()))
            .collect()
    }

    #[test]
    fn inline() {
        let mixer = HeadlessMixer::new();
        let active = Arc::new(AtomicUsize::new(0));
        let scheduler = SchedulerSystem::headless();

        let clips = batch(&mixer, 3);
        clips[0].play(1.0, None).unwrap();

        let eviction = dispatch(&scheduler, &active, clips.clone());
        assert!(eviction.is_finished());
        assert_eq!(eviction.collected(), 3);
        assert_eq!(
            eviction.wait(),
            EvictionReport {
                collected: 3,
                destroyed: 3,
                leaked: 0
            }
        );

        assert_eq!(active.load(Ordering::SeqCst), 0);
        assert!(clips.iter().all(|v| v.is_destroyed()));
        assert_eq!(mixer.alive(), 0);
    }

    #[test]
    fn background() {
        let mixer = HeadlessMixer::new();
        let active = Arc::new(AtomicUsize::new(0));
        let scheduler = SchedulerSystem::new("evict-test", 2, None, None).unwrap();

        let tickets: Vec<_> = (0..4)
            .map(|_| dispatch(&scheduler, &active, batch(&mixer, 2)))
            .collect();

        for v in &tickets {
            assert_eq!(v.wait().destroyed, 2);
        }

        assert_eq!(active.load(Ordering::SeqCst), 0);
        assert_eq!(mixer.destroyed(), 8);
    }

    #[test]
    fn failures_leak() {
        let mixer = HeadlessMixer::new();
        let active = Arc::new(AtomicUsize::new(0));
        let scheduler = SchedulerSystem::headless();

        let clips = batch(&mixer, 2);
        mixer.set_fail_destroy(true);
        let report = dispatch(&scheduler, &active, clips).wait();
        assert_eq!(report.destroyed, 0);
        assert_eq!(report.leaked, 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }
}
