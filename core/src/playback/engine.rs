use crate::model::{
    ColorPalette, CursorWrap, DetectionDataset, DetectionSample, Granularity, PlaybackCursor, Rgb,
    UserIndex, UserTrail,
};
use crate::prelude::{PlaybackConfig, PlaybackError};
use crate::surface::{FeatureId, Layer, MapSurface, MarkerStyle};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, VecDeque};
use tokio_util::sync::CancellationToken;

/// Identifies one dataset request; responses carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// Identifies one armed playback timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// A dataset fetch the host must perform and hand back through
/// [`PlaybackEngine::complete_fetch`]. The token fires once the request is
/// superseded or playback is stopped.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub date: NaiveDate,
    pub token: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Started(TimerHandle),
    Superseded,
}

/// What a single tick drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub rendered: PlaybackCursor,
    pub points_drawn: usize,
    pub segments_drawn: usize,
    pub wrap: CursorWrap,
}

/// Inline, non-blocking message about a failed load.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub date: NaiveDate,
    pub error: PlaybackError,
}

impl Notice {
    pub fn message(&self) -> String {
        match &self.error {
            PlaybackError::EmptyDataset { .. } => {
                format!("No detections recorded on {}.", self.date)
            }
            other => format!("Could not load {}: {}", self.date, other),
        }
    }
}

struct PendingFetch {
    ticket: FetchTicket,
    date: NaiveDate,
    token: CancellationToken,
}

/// Replays a day of detections one cursor step per tick.
///
/// The engine never sleeps or spawns: the host calls [`tick`](Self::tick) at
/// `config.tick_period()` while [`is_running`](Self::is_running) holds, and
/// performs the fetches described by [`FetchRequest`]s. At most one timer is
/// armed at a time and it is always disarmed before the dataset changes.
pub struct PlaybackEngine {
    config: PlaybackConfig,
    selected: Option<NaiveDate>,
    loaded: Option<NaiveDate>,
    dataset: DetectionDataset,
    cursor: PlaybackCursor,
    trails: BTreeMap<UserIndex, UserTrail>,
    paths: VecDeque<FeatureId>,
    palette: ColorPalette,
    timer: Option<TimerHandle>,
    pending: Option<PendingFetch>,
    next_ticket: u64,
    next_timer: u64,
    notice: Option<Notice>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig) -> Self {
        let palette = ColorPalette::new(config.color_seed);
        Self {
            config,
            selected: None,
            loaded: None,
            dataset: DetectionDataset::default(),
            cursor: PlaybackCursor::default(),
            trails: BTreeMap::new(),
            paths: VecDeque::new(),
            palette,
            timer: None,
            pending: None,
            next_ticket: 0,
            next_timer: 0,
            notice: None,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("playback"),
        }
    }

    /// Moves the selection by `offset_days` (0 jumps back to `today`) and
    /// requests that day's dataset.
    pub fn select_date(&mut self, offset_days: i64, today: NaiveDate) -> FetchRequest {
        let date = if offset_days == 0 {
            today
        } else {
            let base = self.selected.unwrap_or(today);
            let step = Days::new(offset_days.unsigned_abs());
            let shifted = if offset_days > 0 {
                base.checked_add_days(step)
            } else {
                base.checked_sub_days(step)
            };
            match shifted {
                Some(date) => date,
                None => {
                    self.logger
                        .warn(&format!("offset {} from {} overflows", offset_days, base));
                    base
                }
            }
        };
        self.start(date)
    }

    /// Stops playback and requests the dataset for `date`, superseding any
    /// request still in flight.
    pub fn start(&mut self, date: NaiveDate) -> FetchRequest {
        self.disarm_timer();
        if let Some(previous) = self.pending.take() {
            previous.token.cancel();
            self.logger.detail(&format!(
                "request for {} superseded by {}",
                previous.date, date
            ));
        }

        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        let token = CancellationToken::new();
        self.selected = Some(date);
        self.pending = Some(PendingFetch {
            ticket,
            date,
            token: token.clone(),
        });
        self.logger.record(&format!("requesting detections for {}", date));

        FetchRequest {
            ticket,
            date,
            token,
        }
    }

    /// Applies the outcome of the fetch identified by `ticket`.
    ///
    /// Stale tickets are discarded. A failed or empty load leaves the previous
    /// dataset and everything already drawn untouched and raises a notice.
    pub fn complete_fetch<S: MapSurface>(
        &mut self,
        ticket: FetchTicket,
        result: Result<DetectionDataset, PlaybackError>,
        surface: &mut S,
    ) -> Result<FetchStatus, PlaybackError> {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending = other;
                self.metrics.record_superseded();
                self.logger.detail(&format!("discarding stale response {:?}", ticket));
                return Ok(FetchStatus::Superseded);
            }
        };
        let date = pending.date;

        let outcome = result.and_then(|dataset| {
            if dataset.is_empty() {
                Err(PlaybackError::EmptyDataset { date })
            } else {
                Ok(dataset)
            }
        });
        let dataset = match outcome {
            Ok(dataset) => dataset,
            Err(PlaybackError::Cancelled) => {
                self.selected = self.loaded.or(Some(date));
                self.metrics.record_superseded();
                return Err(PlaybackError::Cancelled);
            }
            Err(error) => {
                self.metrics.record_failure();
                self.logger
                    .warn(&format!("loading {} failed: {}", date, error));
                self.selected = self.loaded.or(Some(date));
                self.notice = Some(Notice {
                    date,
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        surface.clear_layer(Layer::Points);
        surface.clear_layer(Layer::Paths);
        self.logger.record(&format!(
            "loaded {} samples for {} users on {}",
            dataset.sample_count(),
            dataset.user_count(),
            date
        ));
        self.dataset = dataset;
        self.loaded = Some(date);
        self.cursor = PlaybackCursor::default();
        self.trails.clear();
        self.paths.clear();
        self.palette.reset(self.config.color_seed);
        self.notice = None;
        self.metrics.record_loaded();

        Ok(FetchStatus::Started(self.arm_timer()))
    }

    /// Renders the samples under the cursor, then advances it one step.
    /// Returns `None` while no timer is armed.
    pub fn tick<S: MapSurface>(&mut self, surface: &mut S) -> Option<TickReport> {
        self.timer?;

        let granularity = self.config.granularity;
        let rendered = self.cursor;
        let mut report = TickReport {
            rendered,
            points_drawn: 0,
            segments_drawn: 0,
            wrap: CursorWrap::None,
        };

        for (user, grid) in self.dataset.iter() {
            let samples: Vec<&DetectionSample> = match granularity {
                Granularity::Minute => grid
                    .samples_at(rendered.hour(), rendered.minute())
                    .iter()
                    .collect(),
                Granularity::Hour => grid.hour_samples(rendered.hour()).collect(),
            };
            if samples.is_empty() {
                continue;
            }

            let color = self.palette.color_for(user);
            let trail = self.trails.entry(user).or_default();
            for sample in samples {
                let position = sample.position();
                surface.add_point(Layer::Points, position, MarkerStyle::dot(color));
                report.points_drawn += 1;
                if let Some(segment) = trail.push(position) {
                    self.paths
                        .push_back(surface.add_polyline(Layer::Paths, &segment, color));
                    report.segments_drawn += 1;
                }
            }
        }

        if let Some(limit) = self.config.max_path_segments {
            while self.paths.len() > limit {
                if let Some(oldest) = self.paths.pop_front() {
                    surface.remove(oldest);
                }
            }
        }

        report.wrap = self.cursor.advance(granularity);
        if report.wrap == CursorWrap::Day && self.config.clear_points_on_day_wrap {
            surface.clear_layer(Layer::Points);
            self.logger.detail("day wrapped, point markers cleared");
        }
        self.metrics.record_tick(report.points_drawn);

        Some(report)
    }

    /// Disarms the timer and abandons any request in flight.
    pub fn stop(&mut self) {
        self.disarm_timer();
        if let Some(pending) = self.pending.take() {
            pending.token.cancel();
            self.selected = self.loaded.or(Some(pending.date));
        }
    }

    /// Re-arms the timer against the dataset already loaded.
    pub fn resume(&mut self) -> Option<TimerHandle> {
        if self.timer.is_some() || self.pending.is_some() || self.loaded.is_none() {
            return None;
        }
        Some(self.arm_timer())
    }

    fn arm_timer(&mut self) -> TimerHandle {
        self.disarm_timer();
        self.next_timer += 1;
        let handle = TimerHandle(self.next_timer);
        self.timer = Some(handle);
        handle
    }

    fn disarm_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.logger.detail(&format!("timer {:?} disarmed", handle));
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn active_timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn loaded_date(&self) -> Option<NaiveDate> {
        self.loaded
    }

    pub fn dataset(&self) -> &DetectionDataset {
        &self.dataset
    }

    pub fn trail(&self, user: UserIndex) -> Option<&UserTrail> {
        self.trails.get(&user)
    }

    pub fn user_color(&self, user: UserIndex) -> Option<Rgb> {
        self.palette.get(user)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
