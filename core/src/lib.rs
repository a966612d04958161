//! Core playback and heatmap model for the Smart Campus beacon viewer.
//!
//! The modules turn per-user, per-minute beacon detections into render
//! commands against an abstract map surface: an animated day replay driven by
//! a fixed-period timer, and a one-shot density heatmap with per-beacon counts.

pub mod aggregate;
pub mod model;
pub mod playback;
pub mod prelude;
pub mod surface;
pub mod telemetry;

pub use prelude::{Granularity, PlaybackConfig, PlaybackError, PlaybackResult};
