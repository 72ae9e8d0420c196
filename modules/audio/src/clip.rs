use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::assets::prelude::SampleBuffer;
use crate::errors::Result;
use crate::listener::{notify, PlaybackEvent, PlaybackListener};
use crate::mixer::{Mixer, Sound};

/// One native playback instance owned by a `ClipPool`.
///
/// The native sound sits behind its own lock, so the pool and the eviction
/// workers never drive it from two threads at once. Once destroyed, every
/// operation on the handle is a no-op.
pub struct ClipHandle {
    id: usize,
    pool: String,
    state: Mutex<ClipState>,
}

struct ClipState {
    sound: Option<Box<dyn Sound>>,
    listener: Option<Arc<dyn PlaybackListener>>,
}

impl ClipHandle {
    pub(crate) fn new(pool: &str, mixer: &dyn Mixer, buffer: &Arc<SampleBuffer>) -> Result<Self> {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

        let sound = mixer.create_sound(buffer)?;
        Ok(ClipHandle {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            pool: pool.to_owned(),
            state: Mutex::new(ClipState {
                sound: Some(sound),
                listener: None,
            }),
        })
    }

    /// A process-unique identifier, for diagnostics.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The name of the pool that owns this handle.
    #[inline]
    pub fn pool(&self) -> &str {
        &self.pool
    }

    pub fn is_playing(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.sound.as_ref().map(|v| v.is_playing()).unwrap_or(false)
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().unwrap().sound.is_none()
    }

    pub fn volume(&self) -> f32 {
        let state = self.state.lock().unwrap();
        state.sound.as_ref().map(|v| v.volume()).unwrap_or(0.0)
    }

    pub fn set_volume(&self, volume: f32) {
        if let Some(ref mut sound) = self.state.lock().unwrap().sound {
            sound.set_volume(volume);
        }
    }

    pub fn seek_to_frame(&self, frame: u64) -> Result<()> {
        if let Some(ref mut sound) = self.state.lock().unwrap().sound {
            sound.seek_to_frame(frame)?;
        }

        Ok(())
    }

    /// Resumes playback from the current frame.
    pub fn start(&self) -> Result<()> {
        if let Some(ref mut sound) = self.state.lock().unwrap().sound {
            sound.start()?;
        }

        Ok(())
    }

    /// Stops playback, notifying the attached listener if it was playing.
    pub fn stop(&self) -> Result<()> {
        let listener = {
            let mut state = self.state.lock().unwrap();
            match state.sound {
                Some(ref mut sound) if sound.is_playing() => {
                    sound.stop()?;
                    state.listener.take()
                }
                _ => None,
            }
        };

        notify(listener, PlaybackEvent::Stopped);
        Ok(())
    }

    /// Plays from the first frame at `volume`, replacing the listener.
    /// Returns the listener, which should hear `Started` once the caller
    /// released its locks.
    pub(crate) fn play(
        &self,
        volume: f32,
        listener: Option<Arc<dyn PlaybackListener>>,
    ) -> Result<Option<Arc<dyn PlaybackListener>>> {
        let mut state = self.state.lock().unwrap();
        match state.sound {
            Some(ref mut sound) => {
                sound.set_volume(volume);
                sound.seek_to_frame(0)?;
                sound.start()?;
            }
            None => return Ok(None),
        }

        state.listener = listener.clone();
        Ok(listener)
    }

    /// Force-stops a playing handle so it can be handed out again. Returns the
    /// detached listener, which should hear `Interrupted` once the caller
    /// released its locks.
    #[must_use]
    pub(crate) fn interrupt(&self) -> Option<Arc<dyn PlaybackListener>> {
        let mut state = self.state.lock().unwrap();
        let listener = match state.sound {
            Some(ref mut sound) if sound.is_playing() => {
                if let Err(err) = sound.stop() {
                    warn!("Failed to stop clip {} of {}. {}", self.id, self.pool, err);
                }

                state.listener.take()
            }
            _ => None,
        };

        listener
    }

    /// Stops and releases the native sound. Returns false if it has been
    /// destroyed already.
    pub(crate) fn destroy(&self) -> Result<bool> {
        let (mut sound, listener) = {
            let mut state = self.state.lock().unwrap();
            match state.sound.take() {
                Some(sound) => (sound, state.listener.take()),
                None => return Ok(false),
            }
        };

        if sound.is_playing() {
            if let Err(err) = sound.stop() {
                warn!("Failed to stop clip {} of {}. {}", self.id, self.pool, err);
            }

            notify(listener, PlaybackEvent::Interrupted);
        }

        sound.destroy()?;
        Ok(true)
    }
}

impl fmt::Debug for ClipHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClipHandle")
            .field("id", &self.id)
            .field("pool", &self.pool)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
