extern crate env_logger;
extern crate polyclip;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use polyclip::sched::prelude::*;

#[test]
fn spawn_and_terminate() {
    let _ = env_logger::try_init();

    let sched = SchedulerSystem::new("test", 3, None, None).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        let counter = counter.clone();
        sched.spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    // Pending jobs are drained before the workers exit.
    sched.terminate();
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn runs_off_the_calling_thread() {
    let sched = SchedulerSystem::new("test", 1, None, None).unwrap();
    let caller = thread::current().id();
    let promise = Arc::new(Promise::new());

    let p2 = promise.clone();
    sched.spawn(move || p2.set(thread::current().id()));

    assert_ne!(promise.wait(), caller);
}

#[test]
fn headless_runs_inline() {
    let sched = SchedulerSystem::headless();
    assert!(sched.is_headless());

    let caller = thread::current().id();
    let promise = Arc::new(Promise::new());

    let p2 = promise.clone();
    sched.spawn(move || p2.set(thread::current().id()));

    assert_eq!(promise.try_get(), Some(caller));
}

#[test]
fn panics_are_isolated() {
    let _ = env_logger::try_init();

    let panics = Arc::new(AtomicUsize::new(0));
    let p2 = panics.clone();
    let handler: Box<PanicHandler> = Box::new(move |_| {
        p2.fetch_add(1, Ordering::SeqCst);
    });

    let sched = SchedulerSystem::new("test", 2, None, Some(handler)).unwrap();
    let latch = Arc::new(LockLatch::new());

    sched.spawn(|| panic!("boom"));

    let l2 = latch.clone();
    sched.spawn(move || l2.set());
    latch.wait();

    sched.terminate();
    assert_eq!(panics.load(Ordering::SeqCst), 1);

    // Jobs still run after a terminate, on the calling thread.
    let promise = Arc::new(Promise::new());
    let p3 = promise.clone();
    sched.spawn(move || p3.set(1));
    assert_eq!(promise.try_get(), Some(1));
}
