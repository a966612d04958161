use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::model::Granularity;
pub use crate::surface::{Layer, MapSurface};

/// Playback tuning shared by the engine, the headless driver and the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wall-clock delay between two ticks.
    pub tick_period_ms: u64,
    pub granularity: Granularity,
    /// Drop point markers when the cursor wraps from 23:59 back to 00:00.
    pub clear_points_on_day_wrap: bool,
    /// Fixed seed for user colors; a fresh random palette is drawn per session otherwise.
    pub color_seed: Option<u64>,
    /// Upper bound on path segments kept on the map; the oldest are removed
    /// first. Paths survive the day wrap, so without a bound a looping replay
    /// adds a full day of segments per loop.
    pub max_path_segments: Option<usize>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 250,
            granularity: Granularity::Minute,
            clear_points_on_day_wrap: true,
            color_seed: None,
            max_path_segments: None,
        }
    }
}

impl PlaybackConfig {
    /// The coarser replay: one tick per hour, every two seconds.
    pub fn hourly() -> Self {
        Self {
            tick_period_ms: 2000,
            granularity: Granularity::Hour,
            ..Self::default()
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

/// Failures surfaced by dataset fetches and payload decoding.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("network error: {0}")]
    Network(String),
    #[error("no detections recorded on {date}")]
    EmptyDataset { date: NaiveDate },
    #[error("malformed detection payload: {0}")]
    Decode(String),
    #[error("request superseded by a newer one")]
    Cancelled,
}

impl From<serde_json::Error> for PlaybackError {
    fn from(err: serde_json::Error) -> Self {
        PlaybackError::Decode(err.to_string())
    }
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let cfg: PlaybackConfig = serde_json::from_str(r#"{"tick_period_ms": 40}"#).unwrap();
        assert_eq!(cfg.tick_period(), Duration::from_millis(40));
        assert_eq!(cfg.granularity, Granularity::Minute);
        assert!(cfg.clear_points_on_day_wrap);
        assert_eq!(cfg.max_path_segments, None);
    }

    #[test]
    fn hourly_config_uses_slow_period() {
        let cfg = PlaybackConfig::hourly();
        assert_eq!(cfg.tick_period(), Duration::from_secs(2));
        assert_eq!(cfg.granularity, Granularity::Hour);
    }

    #[test]
    fn zero_period_is_clamped() {
        let cfg = PlaybackConfig {
            tick_period_ms: 0,
            ..PlaybackConfig::default()
        };
        assert_eq!(cfg.tick_period(), Duration::from_millis(1));
    }
}
