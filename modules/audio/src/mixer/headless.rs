use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Mixer, NativeResult, Sound};
use crate::assets::prelude::SampleBuffer;
use crate::errors::NativeError;

/// A mixer that plays nothing.
///
/// Sounds report themselves as playing for the real duration of their buffer,
/// so pools behave as they would against a device. Clones share the same
/// bookkeeping, which makes it handy to observe a mixer handed to a registry.
#[derive(Clone, Default)]
pub struct HeadlessMixer {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    generation: AtomicUsize,
    fail_create: AtomicBool,
    fail_destroy: AtomicBool,
}

impl HeadlessMixer {
    pub fn new() -> Self {
        info!("Create headless audio mixer.");
        HeadlessMixer::default()
    }

    /// Number of sounds created so far.
    #[inline]
    pub fn created(&self) -> usize {
        self.shared.created.load(Ordering::SeqCst)
    }

    /// Number of sounds destroyed successfully so far.
    #[inline]
    pub fn destroyed(&self) -> usize {
        self.shared.destroyed.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn alive(&self) -> usize {
        self.created() - self.destroyed()
    }

    /// Makes every sound that is currently playing reach its end.
    pub fn finish_all(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Makes subsequent `create_sound` calls fail.
    pub fn set_fail_create(&self, fail: bool) {
        self.shared.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `Sound::destroy` calls fail.
    pub fn set_fail_destroy(&self, fail: bool) {
        self.shared.fail_destroy.store(fail, Ordering::SeqCst);
    }
}

impl Mixer for HeadlessMixer {
    fn create_sound(&self, buffer: &Arc<SampleBuffer>) -> NativeResult<Box<dyn Sound>> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(NativeError::OUT_OF_MEMORY);
        }

        self.shared.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(HeadlessSound {
            shared: self.shared.clone(),
            frames: buffer.frames(),
            sample_rate: buffer.sample_rate(),
            cursor: 0,
            volume: 1.0,
            playing: None,
        }))
    }
}

struct HeadlessSound {
    shared: Arc<Shared>,
    frames: u64,
    sample_rate: u32,
    cursor: u64,
    volume: f32,
    playing: Option<(Instant, usize)>,
}

impl HeadlessSound {
    fn remaining(&self) -> Duration {
        let frames = self.frames - self.cursor;
        Duration::from_micros(frames * 1_000_000 / u64::from(self.sample_rate))
    }
}

impl Sound for HeadlessSound {
    fn start(&mut self) -> NativeResult<()> {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        self.playing = Some((Instant::now(), generation));
        Ok(())
    }

    fn stop(&mut self) -> NativeResult<()> {
        self.playing = None;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.playing {
            Some((since, generation)) => {
                generation == self.shared.generation.load(Ordering::SeqCst)
                    && since.elapsed() < self.remaining()
            }
            None => false,
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
    }

    fn seek_to_frame(&mut self, frame: u64) -> NativeResult<()> {
        if frame > self.frames {
            return Err(NativeError::OUT_OF_RANGE);
        }

        self.cursor = frame;
        if self.playing.is_some() {
            self.start()?;
        }

        Ok(())
    }

    fn destroy(self: Box<Self>) -> NativeResult<()> {
        if self.shared.fail_destroy.load(Ordering::SeqCst) {
            return Err(NativeError::INVALID_OPERATION);
        }

        self.shared.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assets::prelude::*;

    fn buffer(secs: usize) -> Arc<SampleBuffer> {
        let format = StreamFormat::new(Encoding::UnsignedInt, 8, 1, 1000);
        Arc::new(SampleBuffer::new(vec![128; 1000 * secs], format).unwrap())
    }

    #[test]
    fn lifecycle() {
        let mixer = HeadlessMixer::new();
        let mut sound = mixer.create_sound(&buffer(10)).unwrap();
        assert_eq!(mixer.created(), 1);
        assert!(!sound.is_playing());

        sound.set_volume(0.5);
        assert_eq!(sound.volume(), 0.5);

        sound.start().unwrap();
        assert!(sound.is_playing());

        sound.stop().unwrap();
        assert!(!sound.is_playing());

        sound.start().unwrap();
        mixer.finish_all();
        assert!(!sound.is_playing());

        sound.destroy().unwrap();
        assert_eq!(mixer.destroyed(), 1);
        assert_eq!(mixer.alive(), 0);
    }

    #[test]
    fn empty_buffer_never_plays() {
        let mixer = HeadlessMixer::new();
        let mut sound = mixer.create_sound(&buffer(0)).unwrap();
        sound.start().unwrap();
        assert!(!sound.is_playing());
    }

    #[test]
    fn seek() {
        let mixer = HeadlessMixer::new();
        let mut sound = mixer.create_sound(&buffer(1)).unwrap();
        assert!(sound.seek_to_frame(0).is_ok());
        assert!(sound.seek_to_frame(1000).is_ok());
        assert_eq!(sound.seek_to_frame(1001), Err(NativeError::OUT_OF_RANGE));
    }

    #[test]
    fn failures() {
        let mixer = HeadlessMixer::new();
        mixer.set_fail_create(true);
        assert_eq!(
            mixer.create_sound(&buffer(1)).err(),
            Some(NativeError::OUT_OF_MEMORY)
        );

        mixer.set_fail_create(false);
        let sound = mixer.create_sound(&buffer(1)).unwrap();
        mixer.set_fail_destroy(true);
        assert!(sound.destroy().is_err());
        assert_eq!(mixer.alive(), 1);
    }
}
