use crate::playback::engine::{PlaybackEngine, TickReport};
use crate::surface::MapSurface;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    TickLimit,
    TimerStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSummary {
    pub ticks: usize,
    pub points_drawn: usize,
    pub segments_drawn: usize,
    pub day_wraps: usize,
    pub reason: StopReason,
}

impl DriverSummary {
    fn absorb(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.points_drawn += report.points_drawn;
        self.segments_drawn += report.segments_drawn;
        if report.wrap == crate::model::CursorWrap::Day {
            self.day_wraps += 1;
        }
    }
}

/// Ticks `engine` at its configured period until `shutdown` fires, `max_ticks`
/// is reached or the engine's timer is disarmed.
///
/// Ticks that fall behind are skipped rather than queued, so a slow surface
/// never causes a burst of catch-up renders.
pub async fn run<S: MapSurface>(
    engine: &mut PlaybackEngine,
    surface: &mut S,
    max_ticks: Option<usize>,
    shutdown: CancellationToken,
) -> DriverSummary {
    let mut ticker = time::interval(engine.config().tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut summary = DriverSummary {
        ticks: 0,
        points_drawn: 0,
        segments_drawn: 0,
        day_wraps: 0,
        reason: StopReason::TimerStopped,
    };

    loop {
        if max_ticks.is_some_and(|limit| summary.ticks >= limit) {
            summary.reason = StopReason::TickLimit;
            break;
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                summary.reason = StopReason::Shutdown;
                break;
            }
            _ = ticker.tick() => {
                match engine.tick(surface) {
                    Some(report) => summary.absorb(&report),
                    None => {
                        summary.reason = StopReason::TimerStopped;
                        break;
                    }
                }
            }
        }
    }

    log::info!(
        "playback driver stopped after {} ticks ({:?})",
        summary.ticks,
        summary.reason
    );
    summary
}
