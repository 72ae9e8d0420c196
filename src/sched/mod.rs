//! Background job scheduling.
//!
//! `SchedulerSystem` runs jobs on a small pool of worker threads so that slow
//! or blocking work never stalls the thread that requested it. A headless
//! system runs every job inline instead, which keeps tests deterministic.

pub mod latch;
pub mod promise;
pub mod scheduler;
pub mod unwind;

pub mod prelude {
    pub use super::latch::{CountLatch, Latch, LockLatch};
    pub use super::promise::Promise;
    pub use super::scheduler::PanicHandler;
    pub use super::SchedulerSystem;
}

use self::scheduler::{PanicHandler, Scheduler};
use crate::errors::Result;

pub struct SchedulerSystem {
    scheduler: Option<Scheduler>,
}

impl SchedulerSystem {
    /// Creates a system backed by `num` worker threads named after `name`.
    pub fn new(
        name: &str,
        num: u32,
        stack_size: Option<usize>,
        panic_handler: Option<Box<PanicHandler>>,
    ) -> Result<Self> {
        Ok(SchedulerSystem {
            scheduler: Some(Scheduler::new(name, num, stack_size, panic_handler)?),
        })
    }

    /// Creates a system that executes jobs on the calling thread.
    pub fn headless() -> Self {
        SchedulerSystem { scheduler: None }
    }

    #[inline]
    pub fn is_headless(&self) -> bool {
        self.scheduler.is_none()
    }

    /// Spawns an asynchronous job.
    pub fn spawn<F>(&self, func: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(ref scheduler) = self.scheduler {
            scheduler.spawn(func);
        } else if let Err(err) = unwind::halt_unwinding(func) {
            error!("A scheduled job panicked: {}", unwind::describe(&*err));
        }
    }

    /// Blocks until all the spawned jobs are finished, then stops the workers.
    pub fn terminate(&self) {
        if let Some(ref scheduler) = self.scheduler {
            scheduler.terminate();
        }
    }
}
