//! # Polyclip
//!
//! The core of a low-latency clip playback stack. It provides the small set of
//! building blocks shared by the modules of this workspace:
//!
//! - `utils`: versioned handles and the pools that name objects with them.
//! - `sched`: a background job scheduler that keeps slow work (like destroying
//! native playback resources) away from latency-sensitive threads.
//! - `errors`: the common `Result` alias.
//!
//! The clip pool itself lives in the `polyclip-audio` module.

#[macro_use]
extern crate log;
pub extern crate failure;

pub mod errors;
#[macro_use]
pub mod utils;
pub mod sched;

pub mod prelude {
    pub use crate::errors::Result;
    pub use crate::sched::prelude::*;
    pub use crate::utils::prelude::*;
}
