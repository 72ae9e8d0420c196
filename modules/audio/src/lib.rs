//! # Polyclip Audio
//!
//! Low-latency playback of short samples that must be audible several times
//! at once, like hit-sounds triggered in quick succession.
//!
//! Every sample lives in a `ClipPool`, which hands out reusable playback
//! handles. Handles beyond the first one of each pool are extra handles, and
//! the `ClipRegistry` bounds their number across the whole process. Once the
//! budget is exhausted, pools cut off their oldest handle instead of minting
//! new ones, until the application requests an eviction which trims every
//! pool back to a single handle in the background.
//!
//! ```rust,ignore
//! polyclip_audio::setup(AudioSettings::default())?;
//!
//! let pool = polyclip_audio::create_pool("hit", Some(buffer))?;
//! pool.start(0.8, None)?;
//!
//! if let Some(eviction) = polyclip_audio::request_eviction()? {
//!     eviction.wait();
//! }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate polyclip;

pub mod assets;
pub mod clip;
pub mod errors;
pub mod eviction;
pub mod listener;
pub mod mixer;
pub mod pool;
pub mod registry;
pub mod report;
pub mod settings;

pub mod prelude {
    pub use crate::assets::prelude::*;
    pub use crate::clip::ClipHandle;
    pub use crate::errors::{Error, NativeError, Result};
    pub use crate::eviction::{Eviction, EvictionReport};
    pub use crate::listener::{PlaybackEvent, PlaybackListener};
    pub use crate::mixer::headless::HeadlessMixer;
    pub use crate::mixer::{Mixer, Sound};
    pub use crate::pool::ClipPool;
    pub use crate::registry::{ClipPoolHandle, ClipRegistry};
    pub use crate::report::{ErrorReporter, LogReporter};
    pub use crate::settings::{AudioSettings, MAX_EXTRA_HANDLES};
}

pub use self::inside::{discard, registry, setup, setup_with};

use self::assets::prelude::{PcmStream, SampleBuffer};
use self::errors::Result;
use self::eviction::Eviction;
use self::pool::ClipPool;

/// Creates a pool that plays `buffer` within the process-wide registry.
#[inline]
pub fn create_pool(name: &str, buffer: Option<SampleBuffer>) -> Result<ClipPool> {
    ClipPool::new(&registry()?, name, buffer)
}

/// Creates a pool from the samples of `stream` within the process-wide
/// registry.
#[inline]
pub fn create_pool_from_stream<S>(name: &str, stream: S) -> Result<ClipPool>
where
    S: PcmStream + 'static,
{
    ClipPool::from_stream(&registry()?, name, stream)
}

/// Trims every pool back to one handle, see `ClipRegistry::request_eviction`.
#[inline]
pub fn request_eviction() -> Result<Option<Eviction>> {
    Ok(registry()?.request_eviction())
}

/// The number of extra handles alive across all the pools.
#[inline]
pub fn extra_handles() -> Result<usize> {
    Ok(registry()?.extra_handles())
}

/// The number of evictions that are still running.
#[inline]
pub fn active_evictions() -> Result<usize> {
    Ok(registry()?.active_evictions())
}

mod inside {
    use std::sync::{Arc, RwLock};

    use crate::errors::{Error, Result};
    use crate::mixer::headless::HeadlessMixer;
    use crate::mixer::Mixer;
    use crate::registry::ClipRegistry;
    use crate::settings::AudioSettings;

    lazy_static! {
        static ref CTX: RwLock<Option<Arc<ClipRegistry>>> = RwLock::new(None);
    }

    /// Returns the process-wide registry.
    pub fn registry() -> Result<Arc<ClipRegistry>> {
        CTX.read().unwrap().clone().ok_or(Error::NotInitialized)
    }

    /// Setup the audio system with the headless mixer.
    pub fn setup(settings: AudioSettings) -> Result<()> {
        setup_with(settings, Arc::new(HeadlessMixer::new()))
    }

    /// Setup the audio system on top of `mixer`.
    pub fn setup_with(settings: AudioSettings, mixer: Arc<dyn Mixer>) -> Result<()> {
        let mut ctx = CTX.write().unwrap();
        if ctx.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        *ctx = Some(ClipRegistry::new(settings, mixer)?);
        Ok(())
    }

    /// Discard the audio system. Pools that are still alive keep the registry
    /// around until they are dropped.
    pub fn discard() {
        let registry = CTX.write().unwrap().take();
        drop(registry);
    }
}
