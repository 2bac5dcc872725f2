//! Frame timing.
//!
//! The driver samples the window clock once per iteration and feeds it to a
//! `DeltaTimer`, so timing stays deterministic under a fake window clock.

mod delta;

pub use delta::{DeltaTimer, FrameTime};
