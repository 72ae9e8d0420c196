use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use polyclip::sched::prelude::SchedulerSystem;
use polyclip::utils::prelude::ObjectPool;

use crate::errors::{Error, Result};
use crate::eviction::{self, Batch, Eviction};
use crate::mixer::Mixer;
use crate::pool::PoolShared;
use crate::report::{ErrorReporter, LogReporter};
use crate::settings::AudioSettings;

impl_handle!(ClipPoolHandle);

/// The process-wide bookkeeping shared by every `ClipPool`.
///
/// It tracks the live pools without owning them, bounds the number of extra
/// handles minted across all of them, and reclaims those extras on request.
pub struct ClipRegistry {
    settings: AudioSettings,
    mixer: Arc<dyn Mixer>,
    reporter: Arc<dyn ErrorReporter>,
    pools: Mutex<ObjectPool<ClipPoolHandle, Weak<PoolShared>>>,
    budget: Budget,
    evictions: Arc<AtomicUsize>,
    scheduler: SchedulerSystem,
}

impl ClipRegistry {
    pub fn new(settings: AudioSettings, mixer: Arc<dyn Mixer>) -> Result<Arc<Self>> {
        ClipRegistry::with_reporter(settings, mixer, Arc::new(LogReporter))
    }

    pub fn with_reporter(
        settings: AudioSettings,
        mixer: Arc<dyn Mixer>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Arc<Self>> {
        let scheduler = if settings.eviction_threads == 0 {
            SchedulerSystem::headless()
        } else {
            SchedulerSystem::new("polyclip-eviction", settings.eviction_threads, None, None)
                .map_err(|err| Error::Scheduler(err.to_string()))?
        };

        info!(
            "Creates clip registry with {} extra handle(s) and {} eviction thread(s).",
            settings.max_extra_handles, settings.eviction_threads
        );

        Ok(Arc::new(ClipRegistry {
            settings,
            mixer,
            reporter,
            pools: Mutex::new(ObjectPool::new()),
            budget: Budget::new(settings.max_extra_handles),
            evictions: Arc::new(AtomicUsize::new(0)),
            scheduler,
        }))
    }

    #[inline]
    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    #[inline]
    pub fn mixer(&self) -> &dyn Mixer {
        &*self.mixer
    }

    #[inline]
    pub fn reporter(&self) -> &dyn ErrorReporter {
        &*self.reporter
    }

    /// The number of handles minted beyond the first one of every pool.
    #[inline]
    pub fn extra_handles(&self) -> usize {
        self.budget.extra.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn max_extra_handles(&self) -> usize {
        self.budget.max
    }

    /// The number of evictions that are still destroying handles.
    #[inline]
    pub fn active_evictions(&self) -> usize {
        self.evictions.load(Ordering::SeqCst)
    }

    /// The number of live pools.
    pub fn len(&self) -> usize {
        self.pools.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trims every pool down to its most recently used handle, and destroys
    /// the others in the background. Returns `None` if there was nothing to
    /// reclaim.
    pub fn request_eviction(&self) -> Option<Eviction> {
        if self.extra_handles() == 0 {
            return None;
        }

        let mut batch = Batch::new();
        {
            let pools = self.pools.lock().unwrap();
            for pool in pools.values().filter_map(Weak::upgrade) {
                pool.take_extra(&mut batch);
            }
        }

        self.release(batch.len());
        if batch.is_empty() {
            return None;
        }

        Some(eviction::dispatch(&self.scheduler, &self.evictions, batch))
    }

    pub(crate) fn register(&self, pool: Weak<PoolShared>) -> ClipPoolHandle {
        self.pools.lock().unwrap().create(pool)
    }

    pub(crate) fn unregister(&self, handle: ClipPoolHandle) {
        self.pools.lock().unwrap().free(handle);
    }

    /// Reserves one extra handle, fails if the budget is exhausted.
    pub(crate) fn try_reserve(&self) -> bool {
        self.budget.try_reserve()
    }

    pub(crate) fn release(&self, n: usize) {
        self.budget.release(n);
    }
}

impl Drop for ClipRegistry {
    fn drop(&mut self) {
        self.scheduler.terminate();
        info!("Destroys clip registry.");
    }
}

struct Budget {
    extra: AtomicUsize,
    max: usize,
}

impl Budget {
    fn new(max: usize) -> Self {
        Budget {
            extra: AtomicUsize::new(0),
            max,
        }
    }

    fn try_reserve(&self) -> bool {
        let max = self.max;
        self.extra
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                if v < max {
                    Some(v + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    fn release(&self, n: usize) {
        if n > 0 {
            let _ = self
                .extra
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                    Some(v.saturating_sub(n))
                });
        }
    }
}
