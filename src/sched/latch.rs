use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// A latch is a primitive signaling mechanism. It starts as false, and
/// eventually someone calls `set()` and it becomes true.
pub trait Latch {
    /// Sets the latch, signalling others.
    fn set(&self);
    /// Tests if the latch is set.
    fn is_set(&self) -> bool;
}

/// A latch you can block on until it becomes true.
#[derive(Default)]
pub struct LockLatch {
    m: Mutex<bool>,
    v: Condvar,
}

impl LockLatch {
    #[inline]
    pub fn new() -> LockLatch {
        LockLatch::default()
    }

    /// Blocks until the latch is set.
    pub fn wait(&self) {
        let mut guard = self.m.lock().unwrap();
        while !*guard {
            guard = self.v.wait(guard).unwrap();
        }
    }
}

impl Latch for LockLatch {
    #[inline]
    fn set(&self) {
        let mut guard = self.m.lock().unwrap();
        *guard = true;
        self.v.notify_all();
    }

    #[inline]
    fn is_set(&self) -> bool {
        *self.m.lock().unwrap()
    }
}

/// Counting latches track a counter which starts at one. Calling `set()`
/// decrements it, and the latch is only considered set once the counter
/// reaches zero.
#[derive(Debug)]
pub struct CountLatch {
    counter: AtomicUsize,
}

impl Default for CountLatch {
    fn default() -> Self {
        CountLatch::new()
    }
}

impl CountLatch {
    #[inline]
    pub fn new() -> CountLatch {
        CountLatch {
            counter: AtomicUsize::new(1),
        }
    }

    #[inline]
    pub fn increment(&self) {
        debug_assert!(!self.is_set());
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

impl Latch for CountLatch {
    #[inline]
    fn set(&self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }

    #[inline]
    fn is_set(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == 0
    }
}
