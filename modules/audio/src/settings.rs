use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// The default upper bound of extra handles across all the pools.
pub const MAX_EXTRA_HANDLES: usize = 20;

/// The settings of audio system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// The total number of handles that could be minted beyond the first one
    /// of every pool.
    pub max_extra_handles: usize,
    /// The number of threads that destroy evicted handles. Zero runs eviction
    /// on the thread that requested it.
    pub eviction_threads: u32,
    /// Refuses `get_clip` while an eviction is still running.
    pub back_off_during_eviction: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        AudioSettings {
            max_extra_handles: MAX_EXTRA_HANDLES,
            eviction_threads: 1,
            back_off_during_eviction: false,
        }
    }
}

impl AudioSettings {
    /// Parses settings from JSON, missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
