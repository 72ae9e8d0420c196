//! The contract of the native playback engine.
//!
//! A `Mixer` mints `Sound`s, one native playback instance bound to a sample
//! buffer each. Calls on a single `Sound` are synchronous and must never be
//! made from two threads at once, `ClipHandle` takes care of that.

pub mod headless;

use std::sync::Arc;

use crate::assets::prelude::SampleBuffer;
use crate::errors::NativeError;

pub type NativeResult<T> = ::std::result::Result<T, NativeError>;

/// One native playback instance.
pub trait Sound: Send {
    fn start(&mut self) -> NativeResult<()>;

    fn stop(&mut self) -> NativeResult<()>;

    /// Queried live from the engine, never cached.
    fn is_playing(&self) -> bool;

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    fn seek_to_frame(&mut self, frame: u64) -> NativeResult<()>;

    /// Releases the native instance.
    fn destroy(self: Box<Self>) -> NativeResult<()>;
}

/// The native engine that creates sounds from decoded buffers.
pub trait Mixer: Send + Sync {
    fn create_sound(&self, buffer: &Arc<SampleBuffer>) -> NativeResult<Box<dyn Sound>>;
}
