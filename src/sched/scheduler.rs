use std::any::Any;
use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::iter;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_deque as deque;

use super::latch::{CountLatch, Latch, LockLatch};
use super::unwind::{self, AbortIfPanic};
use crate::errors::Result;

/// The type for a panic handling closure. Note that this same closure
/// may be invoked multiple times in parallel.
pub type PanicHandler = dyn Fn(Box<dyn Any + Send>) + Send + Sync;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads that execute jobs pushed from any thread.
///
/// Jobs are injected into a global queue and pulled in batches into the
/// per-thread deques, idle workers steal from their siblings. The scheduler
/// only terminates after every spawned job has been executed.
pub struct Scheduler {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    terminator: CountLatch,
    terminated: AtomicBool,
    watcher: Watcher,
    threads: Vec<ThreadInfo>,
    injector: deque::Injector<Job>,
    panic_handler: Option<Box<PanicHandler>>,
}

struct ThreadInfo {
    stealer: deque::Stealer<Job>,
    primed: LockLatch,
}

impl Scheduler {
    pub fn new(
        name: &str,
        num: u32,
        stack_size: Option<usize>,
        panic_handler: Option<Box<PanicHandler>>,
    ) -> Result<Self> {
        let workers: Vec<_> = (0..num.max(1)).map(|_| deque::Worker::new_fifo()).collect();
        let threads = workers
            .iter()
            .map(|w| ThreadInfo {
                stealer: w.stealer(),
                primed: LockLatch::new(),
            })
            .collect();

        let scheduler = Scheduler {
            shared: Arc::new(Shared {
                terminator: CountLatch::new(),
                terminated: AtomicBool::new(false),
                watcher: Watcher(Mutex::new(()), Condvar::new()),
                threads,
                injector: deque::Injector::new(),
                panic_handler,
            }),
            handles: Mutex::new(Vec::new()),
        };

        for (i, w) in workers.into_iter().enumerate() {
            let shared = scheduler.shared.clone();
            let mut b = thread::Builder::new().name(format!("{}-{}", name, i));

            if let Some(stack_size) = stack_size {
                b = b.stack_size(stack_size);
            }

            match b.spawn(move || Shared::main_loop(shared, i, w)) {
                Ok(handle) => scheduler.handles.lock().unwrap().push(handle),
                Err(err) => {
                    scheduler.terminate();
                    return Err(err.into());
                }
            }
        }

        for v in &scheduler.shared.threads {
            v.primed.wait();
        }

        info!(
            "Creates scheduler {} with {} worker thread(s).",
            name,
            scheduler.shared.threads.len()
        );

        Ok(scheduler)
    }

    /// Returns the number of worker threads.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.threads.len()
    }

    /// Spawns an asynchronous job. Panics inside `func` are caught and handed
    /// to the panic handler.
    pub fn spawn<F>(&self, func: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_terminated() {
            warn!("Spawns a job on a terminated scheduler, runs it inline.");
            if let Err(err) = unwind::halt_unwinding(func) {
                self.shared.handle_panic(err);
            }
            return;
        }

        // Ensure that scheduler cannot terminate until this job has executed. This
        // ref is decremented at the (*) below.
        self.shared.terminator.increment();

        let shared = self.shared.clone();
        let job: Job = Box::new(move || {
            if let Err(err) = unwind::halt_unwinding(func) {
                shared.handle_panic(err);
            }

            shared.terminator.set(); // (*) permit scheduler to terminate now
        });

        self.shared.injector.push(job);
        self.shared.watcher.notify_one();
    }

    /// Returns true once `terminate` has been called.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::SeqCst)
    }

    /// Signals that the owner has been dropped. Blocks the current thread until
    /// all the workers finished their pending jobs gracefully.
    pub fn terminate(&self) {
        if self.shared.terminated.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shared.terminator.set();
        self.shared.watcher.notify_all();

        let current = thread::current().id();
        let handles = mem::replace(&mut *self.handles.lock().unwrap(), Vec::new());
        for handle in handles {
            // A job that drops the last owner runs on one of our own workers.
            if handle.thread().id() == current {
                continue;
            }

            if handle.join().is_err() {
                error!("A scheduler worker exited abnormally.");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl Shared {
    fn handle_panic(&self, err: Box<dyn Any + Send>) {
        match self.panic_handler {
            Some(ref handler) => {
                // If the customizable panic handler itself panics, then we abort.
                let abort_guard = AbortIfPanic;
                handler(err);
                mem::forget(abort_guard);
            }
            None => {
                error!("A scheduled job panicked: {}", unwind::describe(&*err));
            }
        }
    }

    fn main_loop(shared: Arc<Shared>, index: usize, worker: deque::Worker<Job>) {
        let rand = XorShift64Star::new();
        shared.threads[index].primed.set();

        let mut ms = 1;
        while !shared.terminator.is_set() {
            if let Some(job) = shared.find_job(index, &worker, &rand) {
                job();
                ms = 1;
            } else {
                shared.watcher.wait_timeout(ms);
                ms = (ms * 2).min(48);
            }
        }
    }

    fn find_job(
        &self,
        index: usize,
        worker: &deque::Worker<Job>,
        rand: &XorShift64Star,
    ) -> Option<Job> {
        worker.pop().or_else(|| {
            iter::repeat_with(|| {
                self.injector
                    .steal_batch_and_pop(worker)
                    .or_else(|| self.steal(index, rand))
            })
            .find(|s| !s.is_retry())
            .and_then(|s| s.success())
        })
    }

    fn steal(&self, index: usize, rand: &XorShift64Star) -> deque::Steal<Job> {
        let num_threads = self.threads.len();
        if num_threads <= 1 {
            return deque::Steal::Empty;
        }

        let start = rand.next_usize(num_threads);
        (start..num_threads)
            .chain(0..start)
            .filter(|&i| i != index)
            .map(|i| self.threads[i].stealer.steal())
            .collect()
    }
}

struct Watcher(Mutex<()>, Condvar);

impl Watcher {
    #[inline]
    fn wait_timeout(&self, ms: u64) {
        let duration = Duration::from_millis(ms);
        let v = self.0.lock().unwrap();
        let _ = self.1.wait_timeout(v, duration);
    }

    #[inline]
    fn notify_one(&self) {
        self.1.notify_one()
    }

    #[inline]
    fn notify_all(&self) {
        self.1.notify_all()
    }
}

/// [xorshift*] is a fast pseudorandom number generator which will even tolerate
/// weak seeding, as long as it's not zero.
///
/// [xorshift*]: https://en.wikipedia.org/wiki/Xorshift#xorshift*
struct XorShift64Star {
    state: Cell<u64>,
}

impl XorShift64Star {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        // Any non-zero seed will do -- this uses the hash of a global counter.
        let mut seed = 0;
        while seed == 0 {
            let mut hasher = DefaultHasher::new();
            COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
            seed = hasher.finish();
        }

        XorShift64Star {
            state: Cell::new(seed),
        }
    }

    fn next(&self) -> u64 {
        let mut x = self.state.get();
        debug_assert_ne!(x, 0);
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state.set(x);
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Return a value from `0..n`.
    fn next_usize(&self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}
