use crate::generator::profile::build_day;
use crate::workflow::config::SimulatorConfig;
use anyhow::Context;
use beaconcore::playback::{self, DriverSummary, FetchStatus, PlaybackEngine};
use beaconcore::surface::{Layer, Scene};
use beaconcore::telemetry::MetricsSnapshot;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

pub struct ReplayResult {
    pub date: NaiveDate,
    pub users: usize,
    pub samples: usize,
    pub summary: DriverSummary,
    pub points_on_map: usize,
    pub paths_on_map: usize,
    pub metrics: MetricsSnapshot,
}

/// Replays generated days through the playback engine without a display.
#[derive(Clone)]
pub struct Runner {
    config: SimulatorConfig,
}

impl Runner {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub async fn replay(
        &self,
        date: NaiveDate,
        max_ticks: usize,
        shutdown: CancellationToken,
    ) -> anyhow::Result<ReplayResult> {
        let dataset = build_day(&self.config.generator, date)
            .with_context(|| format!("generating detections for {}", date))?;
        let users = dataset.user_count();
        let samples = dataset.sample_count();

        let mut scene = Scene::new();
        let mut engine = PlaybackEngine::new(self.config.playback.clone());
        let request = engine.start(date);
        let status = engine
            .complete_fetch(request.ticket, Ok(dataset), &mut scene)
            .with_context(|| format!("loading detections for {}", date))?;
        debug_assert!(matches!(status, FetchStatus::Started(_)));

        let summary = playback::run(&mut engine, &mut scene, Some(max_ticks), shutdown).await;

        Ok(ReplayResult {
            date,
            users,
            samples,
            summary,
            points_on_map: scene.count(Layer::Points),
            paths_on_map: scene.count(Layer::Paths),
            metrics: engine.metrics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconcore::playback::StopReason;

    fn fast_config() -> SimulatorConfig {
        let mut cfg = SimulatorConfig::from_args(4, 5, None);
        cfg.playback.tick_period_ms = 1;
        cfg.generator.detection_rate = 1.0;
        cfg
    }

    #[tokio::test]
    async fn replay_of_a_full_day_renders_every_sample() {
        let runner = Runner::new(fast_config());
        let date = NaiveDate::from_ymd_opt(2017, 9, 11).unwrap();
        let result = runner
            .replay(date, 24 * 60, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.summary.reason, StopReason::TickLimit);
        assert_eq!(result.summary.points_drawn, result.samples);
        assert_eq!(result.summary.day_wraps, 1);
        assert_eq!(result.points_on_map, 0);
        assert_eq!(result.metrics.samples_rendered as usize, result.samples);
    }

    #[tokio::test]
    async fn replay_of_an_empty_day_fails() {
        let mut cfg = fast_config();
        cfg.generator.detection_rate = 0.0;
        let runner = Runner::new(cfg);
        let date = NaiveDate::from_ymd_opt(2017, 9, 11).unwrap();
        let err = runner
            .replay(date, 10, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("loading detections"));
    }
}
