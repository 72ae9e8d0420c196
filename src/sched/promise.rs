use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A write-once cell that lets one thread wait for a value produced by
/// another, usually a job running on a `Scheduler`.
pub struct Promise<T> {
    m: Mutex<Option<T>>,
    v: Condvar,
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Promise::new()
    }
}

impl<T> Promise<T> {
    #[inline]
    pub fn new() -> Self {
        Promise {
            m: Mutex::new(None),
            v: Condvar::new(),
        }
    }

    /// Fulfills the promise and wakes up all waiters. Only the first value
    /// is kept.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.m.lock().unwrap();
            if guard.is_some() {
                return;
            }

            *guard = Some(value);
        }

        self.v.notify_all();
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.m.lock().unwrap().is_some()
    }
}

impl<T: Clone> Promise<T> {
    /// Returns the value if the promise has been fulfilled.
    #[inline]
    pub fn try_get(&self) -> Option<T> {
        self.m.lock().unwrap().clone()
    }

    /// Blocks until the promise is fulfilled.
    pub fn wait(&self) -> T {
        let mut guard = self.m.lock().unwrap();
        loop {
            if let Some(ref v) = *guard {
                return v.clone();
            }

            guard = self.v.wait(guard).unwrap();
        }
    }

    /// Blocks until the promise is fulfilled or `timeout` elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.m.lock().unwrap();

        loop {
            if let Some(ref v) = *guard {
                return Some(v.clone());
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            guard = self.v.wait_timeout(guard, deadline - now).unwrap().0;
        }
    }
}
