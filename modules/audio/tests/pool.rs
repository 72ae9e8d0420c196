extern crate env_logger;
extern crate polyclip_audio;
extern crate rand;

use std::sync::{Arc, Mutex};

use polyclip_audio::prelude::*;
use rand::Rng;

fn buffer() -> SampleBuffer {
    // Ten seconds of silence, long enough to keep playing for a whole test.
    let format = StreamFormat::new(Encoding::UnsignedInt, 8, 1, 1000);
    SampleBuffer::new(vec![128; 10_000], format).unwrap()
}

fn registry(max_extra_handles: usize) -> (Arc<ClipRegistry>, HeadlessMixer) {
    let _ = env_logger::try_init();

    let mixer = HeadlessMixer::new();
    let settings = AudioSettings {
        max_extra_handles,
        eviction_threads: 0,
        ..Default::default()
    };

    let registry = ClipRegistry::new(settings, Arc::new(mixer.clone())).unwrap();
    (registry, mixer)
}

fn recorder() -> (Arc<dyn PlaybackListener>, Arc<Mutex<Vec<PlaybackEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener: Arc<dyn PlaybackListener> =
        Arc::new(move |e: PlaybackEvent| sink.lock().unwrap().push(e));
    (listener, events)
}

#[test]
fn repeated_triggers_reuse_once_capped() {
    let (registry, mixer) = registry(1);
    let pool = ClipPool::new(&registry, "hit", Some(buffer())).unwrap();
    let base = pool.get_clip().unwrap().unwrap();

    let (listener, events) = recorder();
    pool.start(1.0, Some(listener)).unwrap();
    assert!(base.is_playing());

    pool.start(1.0, None).unwrap();
    assert_eq!(pool.len(), 2);
    assert_eq!(registry.extra_handles(), 1);

    // The budget is exhausted, the oldest handle gets cut off and reused.
    pool.start(0.5, None).unwrap();
    assert_eq!(pool.len(), 2);
    assert_eq!(mixer.created(), 2);
    assert_eq!(registry.extra_handles(), 1);
    assert!(base.is_playing());
    assert_eq!(base.volume(), 0.5);

    assert_eq!(
        *events.lock().unwrap(),
        vec![PlaybackEvent::Started, PlaybackEvent::Interrupted]
    );
}

#[test]
fn budget_caps_across_pools() {
    let (registry, mixer) = registry(MAX_EXTRA_HANDLES);
    let pools: Vec<_> = (0..25)
        .map(|i| ClipPool::new(&registry, &format!("pool-{}", i), Some(buffer())).unwrap())
        .collect();

    for pool in &pools {
        pool.start(1.0, None).unwrap();
        pool.start(1.0, None).unwrap();
    }

    assert_eq!(registry.extra_handles(), 20);
    assert_eq!(mixer.created(), 25 + 20);

    for pool in &pools[..20] {
        assert_eq!(pool.len(), 2);
    }

    for pool in &pools[20..] {
        assert_eq!(pool.len(), 1);
    }
}

#[test]
fn reuse_oldest_when_exhausted() {
    let (registry, _) = registry(2);
    let pool = ClipPool::new(&registry, "hit", Some(buffer())).unwrap();

    let mut played = Vec::new();
    for _ in 0..3 {
        let clip = pool.get_clip().unwrap().unwrap();
        clip.start().unwrap();
        played.push(clip);
    }

    for i in 0..6 {
        let clip = pool.get_clip().unwrap().unwrap();
        assert!(Arc::ptr_eq(&clip, &played[i % 3]));
        assert!(!clip.is_playing());
        clip.start().unwrap();
    }

    assert_eq!(pool.len(), 3);
}

#[test]
fn idle_handles_come_first() {
    let (registry, mixer) = registry(4);
    let pool = ClipPool::new(&registry, "hit", Some(buffer())).unwrap();

    for _ in 0..3 {
        pool.start(1.0, None).unwrap();
    }

    assert_eq!(pool.len(), 3);
    mixer.finish_all();

    // Every handle is idle now, none gets minted or cut off.
    let (listener, events) = recorder();
    for _ in 0..3 {
        pool.start(1.0, Some(listener.clone())).unwrap();
    }

    assert_eq!(pool.len(), 3);
    assert_eq!(mixer.created(), 3);
    assert_eq!(registry.extra_handles(), 2);
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .all(|&v| v == PlaybackEvent::Started));
}

#[test]
fn destroy_releases_extra_handles() {
    let (registry, mixer) = registry(MAX_EXTRA_HANDLES);
    let other = ClipPool::new(&registry, "other", Some(buffer())).unwrap();
    other.start(1.0, None).unwrap();
    other.start(1.0, None).unwrap();

    let pool = ClipPool::new(&registry, "hit", Some(buffer())).unwrap();
    for _ in 0..3 {
        pool.start(1.0, None).unwrap();
    }

    assert_eq!(pool.len(), 3);
    assert_eq!(registry.extra_handles(), 3);

    pool.destroy().unwrap();
    assert_eq!(registry.extra_handles(), 1);
    assert!(pool.is_empty());
    assert!(pool.get_clip().unwrap().is_none());
    assert!(pool.start(1.0, None).is_ok());
    assert_eq!(mixer.alive(), 2);
}

#[test]
fn every_handle_destroyed_once() {
    let (registry, mixer) = registry(6);

    {
        let pools: Vec<_> = (0..4)
            .map(|i| ClipPool::new(&registry, &format!("pool-{}", i), Some(buffer())).unwrap())
            .collect();

        for _ in 0..3 {
            for pool in &pools {
                pool.start(1.0, None).unwrap();
            }
        }

        let eviction = registry.request_eviction().unwrap();
        assert_eq!(eviction.wait().destroyed, 6);

        for pool in &pools {
            pool.start(1.0, None).unwrap();
            pool.start(1.0, None).unwrap();
        }

        pools[0].destroy().unwrap();
    }

    assert_eq!(mixer.destroyed(), mixer.created());
    assert_eq!(registry.extra_handles(), 0);
    assert!(registry.is_empty());
}

#[test]
fn budget_is_never_exceeded() {
    let (registry, mixer) = registry(5);
    let pools: Vec<_> = (0..6)
        .map(|i| ClipPool::new(&registry, &format!("pool-{}", i), Some(buffer())).unwrap())
        .collect();

    let mut rng = rand::thread_rng();
    for _ in 0..2_000 {
        let pool = &pools[rng.gen_range(0..pools.len())];
        match rng.gen_range(0..10) {
            0 => mixer.finish_all(),
            1 => pool.stop().unwrap(),
            2 => {
                if let Some(eviction) = registry.request_eviction() {
                    eviction.wait();
                }
            }
            _ => pool.start(1.0, None).unwrap(),
        }

        let extra: usize = pools.iter().map(|v| v.len() - 1).sum();
        assert!(registry.extra_handles() <= 5);
        assert_eq!(registry.extra_handles(), extra);
    }
}

#[test]
fn failed_create_surfaces() {
    let (registry, mixer) = registry(4);
    let pool = ClipPool::new(&registry, "hit", Some(buffer())).unwrap();
    pool.start(1.0, None).unwrap();

    mixer.set_fail_create(true);
    match pool.start(1.0, None) {
        Err(Error::Native(err)) => assert_eq!(err, NativeError::OUT_OF_MEMORY),
        _ => panic!("minting should fail"),
    }

    assert_eq!(registry.extra_handles(), 0);

    match ClipPool::new(&registry, "broken", Some(buffer())) {
        Err(Error::Native(_)) => {}
        _ => panic!("construction should fail"),
    }
}
