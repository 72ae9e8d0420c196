//! Playback-state observers.
//!
//! Notifications are best-effort and fire on the thread that caused the
//! change, after every internal lock has been released. A listener must not
//! call back into the pool that notified it.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackEvent {
    /// Playback started from the first frame.
    Started,
    /// Playback was stopped on request.
    Stopped,
    /// Playback was cut off because the handle got reused or evicted.
    Interrupted,
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            PlaybackEvent::Started => "started",
            PlaybackEvent::Stopped => "stopped",
            PlaybackEvent::Interrupted => "interrupted",
        };

        write!(f, "{}", name)
    }
}

pub trait PlaybackListener: Send + Sync {
    fn on_playback(&self, event: PlaybackEvent);
}

impl<F> PlaybackListener for F
where
    F: Fn(PlaybackEvent) + Send + Sync,
{
    fn on_playback(&self, event: PlaybackEvent) {
        self(event)
    }
}

pub(crate) fn notify(listener: Option<Arc<dyn PlaybackListener>>, event: PlaybackEvent) {
    if let Some(listener) = listener {
        listener.on_playback(event);
    }
}
