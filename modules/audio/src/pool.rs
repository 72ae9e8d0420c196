use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex};

use crate::assets::prelude::{PcmStream, SampleBuffer, SampleFormat};
use crate::clip::ClipHandle;
use crate::errors::Result;
use crate::eviction::Batch;
use crate::listener::{notify, PlaybackEvent, PlaybackListener};
use crate::registry::{ClipPoolHandle, ClipRegistry};

/// The playback handles of one sample.
///
/// Handles are kept in recency order, the tail being the one handed out last.
/// `get_clip` prefers an idle handle, then mints a new one while the global
/// budget of the registry allows it, and finally cuts off the oldest handle
/// and reuses it. A pool built with a buffer always holds its first handle
/// until it is destroyed.
pub struct ClipPool {
    shared: Arc<PoolShared>,
    registry: Arc<ClipRegistry>,
    handle: ClipPoolHandle,
}

pub(crate) struct PoolShared {
    name: String,
    state: Mutex<PoolState>,
}

struct PoolState {
    buffer: Option<Arc<SampleBuffer>>,
    clips: VecDeque<Arc<ClipHandle>>,
    stream: Option<Box<dyn PcmStream>>,
    destroyed: bool,
}

impl PoolShared {
    /// Moves every handle but the most recently used one into `batch`.
    pub(crate) fn take_extra(&self, batch: &mut Batch) -> usize {
        let mut state = self.state.lock().unwrap();
        if state.destroyed || state.clips.len() <= 1 {
            return 0;
        }

        let n = state.clips.len() - 1;
        batch.extend(state.clips.drain(..n));
        debug!("Evicts {} clip(s) from {}.", n, self.name);
        n
    }
}

impl ClipPool {
    /// Creates a pool that plays `buffer`. A pool without buffer is legal,
    /// it just never hands out any handle.
    pub fn new(
        registry: &Arc<ClipRegistry>,
        name: &str,
        buffer: Option<SampleBuffer>,
    ) -> Result<Self> {
        ClipPool::build(registry, name, buffer, None)
    }

    /// Creates a pool from the samples of `stream`. The stream is kept open
    /// and closed when the pool gets destroyed.
    pub fn from_stream<S>(registry: &Arc<ClipRegistry>, name: &str, stream: S) -> Result<Self>
    where
        S: PcmStream + 'static,
    {
        let mut stream: Box<dyn PcmStream> = Box::new(stream);
        match SampleBuffer::from_stream(&mut *stream) {
            Ok(buffer) => ClipPool::build(registry, name, Some(buffer), Some(stream)),
            Err(err) => {
                close(registry, name, stream);
                Err(err)
            }
        }
    }

    fn build(
        registry: &Arc<ClipRegistry>,
        name: &str,
        buffer: Option<SampleBuffer>,
        stream: Option<Box<dyn PcmStream>>,
    ) -> Result<Self> {
        let buffer = buffer.map(Arc::new);
        let mut clips = VecDeque::new();

        if let Some(ref buffer) = buffer {
            match ClipHandle::new(name, registry.mixer(), buffer) {
                Ok(clip) => clips.push_back(Arc::new(clip)),
                Err(err) => {
                    if let Some(stream) = stream {
                        close(registry, name, stream);
                    }

                    return Err(err);
                }
            }
        }

        let shared = Arc::new(PoolShared {
            name: name.to_owned(),
            state: Mutex::new(PoolState {
                buffer,
                clips,
                stream,
                destroyed: false,
            }),
        });

        let handle = registry.register(Arc::downgrade(&shared));
        info!("Creates clip pool {} as {}.", name, handle);

        Ok(ClipPool {
            shared,
            registry: registry.clone(),
            handle,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    #[inline]
    pub fn handle(&self) -> ClipPoolHandle {
        self.handle
    }

    /// The number of handles owned.
    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.lock().unwrap().destroyed
    }

    /// The sample format of the buffer, `None` if there is nothing to play.
    pub fn format(&self) -> Option<SampleFormat> {
        self.buffer().map(|v| v.format())
    }

    pub fn channels(&self) -> u16 {
        self.buffer().map(|v| v.channels()).unwrap_or(0)
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer().map(|v| v.sample_rate()).unwrap_or(0)
    }

    fn buffer(&self) -> Option<Arc<SampleBuffer>> {
        self.shared.state.lock().unwrap().buffer.clone()
    }

    /// Returns a handle that is ready to play, or `None` if the pool can not
    /// provide one right now. Fails only if minting a new handle failed.
    pub fn get_clip(&self) -> Result<Option<Arc<ClipHandle>>> {
        let acquired = {
            let mut state = self.shared.state.lock().unwrap();
            self.acquire(&mut state)?
        };

        Ok(acquired.map(|(clip, interrupted)| {
            notify(interrupted, PlaybackEvent::Interrupted);
            clip
        }))
    }

    /// Plays the sample from its start at `volume`. Silently does nothing if
    /// no handle is available.
    pub fn start(&self, volume: f32, listener: Option<Arc<dyn PlaybackListener>>) -> Result<()> {
        // The handle starts playing before the pool lock is released, so no
        // concurrent trigger sees it idle and no eviction collects it.
        let (interrupted, started) = {
            let mut state = self.shared.state.lock().unwrap();
            match self.acquire(&mut state)? {
                Some((clip, interrupted)) => (interrupted, clip.play(volume, listener)),
                None => return Ok(()),
            }
        };

        notify(interrupted, PlaybackEvent::Interrupted);
        notify(started?, PlaybackEvent::Started);
        Ok(())
    }

    /// Picks a handle and moves it to the tail. A handle cut off for reuse
    /// comes with its detached listener, to be notified once the pool lock is
    /// released.
    fn acquire(
        &self,
        state: &mut PoolState,
    ) -> Result<Option<(Arc<ClipHandle>, Option<Arc<dyn PlaybackListener>>)>> {
        if state.destroyed {
            return Ok(None);
        }

        if self.registry.settings().back_off_during_eviction
            && self.registry.active_evictions() > 0
        {
            debug!("Refuses clip of {} while evictions are running.", self.name());
            return Ok(None);
        }

        if let Some(index) = state.clips.iter().position(|v| !v.is_playing()) {
            if let Some(clip) = state.clips.remove(index) {
                state.clips.push_back(clip.clone());
                return Ok(Some((clip, None)));
            }
        }

        let buffer = match state.buffer {
            Some(ref buffer) => buffer.clone(),
            None => return Ok(None),
        };

        if state.clips.is_empty() {
            let clip = Arc::new(ClipHandle::new(self.name(), self.registry.mixer(), &buffer)?);
            state.clips.push_back(clip.clone());
            return Ok(Some((clip, None)));
        }

        if !self.registry.try_reserve() {
            let clip = match state.clips.pop_front() {
                Some(clip) => clip,
                None => return Ok(None),
            };

            state.clips.push_back(clip.clone());
            debug!("Cuts off clip {} of {} for reuse.", clip.id(), self.name());
            let interrupted = clip.interrupt();
            return Ok(Some((clip, interrupted)));
        }

        match ClipHandle::new(self.name(), self.registry.mixer(), &buffer) {
            Ok(clip) => {
                let clip = Arc::new(clip);
                state.clips.push_back(clip.clone());
                Ok(Some((clip, None)))
            }
            Err(err) => {
                self.registry.release(1);
                Err(err)
            }
        }
    }

    /// Stops the most recently used handle if it is playing.
    pub fn stop(&self) -> Result<()> {
        let clip = self.shared.state.lock().unwrap().clips.back().cloned();
        if let Some(clip) = clip {
            clip.stop()?;
        }

        Ok(())
    }

    /// Destroys every handle and releases the buffer and the stream. The pool
    /// refuses any further playback afterwards.
    pub fn destroy(&self) -> Result<()> {
        let (clips, stream) = {
            let mut state = self.shared.state.lock().unwrap();
            if state.destroyed {
                return Ok(());
            }

            state.destroyed = true;
            state.buffer = None;
            (mem::replace(&mut state.clips, VecDeque::new()), state.stream.take())
        };

        self.registry.release(clips.len().saturating_sub(1));
        self.registry.unregister(self.handle);

        let mut result = Ok(());
        for clip in &clips {
            if let Err(err) = clip.destroy() {
                error!("Failed to destroy clip {} of {}. {}", clip.id(), self.name(), err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        if let Some(stream) = stream {
            close(&self.registry, self.name(), stream);
        }

        info!("Destroys clip pool {}.", self.name());
        result
    }
}

impl Drop for ClipPool {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            error!("Failed to destroy clip pool {}. {}", self.name(), err);
        }
    }
}

fn close(registry: &ClipRegistry, name: &str, mut stream: Box<dyn PcmStream>) {
    if let Err(err) = stream.close() {
        let context = format!("Failed to close the stream of clip pool {}", name);
        registry.reporter().report(&context, &err);
    }
}
