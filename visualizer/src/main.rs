use api::{fetch_aggregate, fetch_dataset, ApiClient};
use beaconcore::aggregate::{AggregatePayload, AggregateView};
use beaconcore::model::DetectionDataset;
use beaconcore::playback::{FetchStatus, FetchTicket, PlaybackEngine};
use beaconcore::surface::{Scene, Viewport};
use beaconcore::PlaybackError;
use chrono::Local;
use config::ClientConfig;
use iced::{
    time,
    widget::{button, canvas::Canvas, column, row, scrollable, text, Column, Container},
    Alignment, Color, Element, Length, Subscription, Task, Theme,
};
use map_canvas::MapCanvas;

mod api;
mod config;
mod map_canvas;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Smart Campus Beacon Viewer".into()
}

/// Ticks are only delivered while the engine has an armed timer, so there is
/// never more than one.
fn application_subscription(state: &Visualizer) -> Subscription<Message> {
    if state.mode == ViewMode::Playback && state.engine.is_running() {
        time::every(state.engine.config().tick_period()).map(|_| Message::Tick)
    } else {
        Subscription::none()
    }
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Playback,
    Heatmap,
}

struct Visualizer {
    api: ApiClient,
    engine: PlaybackEngine,
    scene: Scene,
    heatmap: Scene,
    aggregate: AggregateView,
    aggregate_loaded: bool,
    heatmap_notice: Option<String>,
    mode: ViewMode,
    viewport: Viewport,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    SelectDate(i64),
    DatasetFetched(FetchTicket, Result<DetectionDataset, PlaybackError>),
    TogglePlayback,
    ShowMode(ViewMode),
    AggregateFetched(Result<AggregatePayload, PlaybackError>),
    ToggleMarkers,
    Zoom(f64),
    DismissNotice,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let config = ClientConfig::from_env();
        let mut state = Visualizer {
            api: ApiClient::new(&config),
            engine: PlaybackEngine::new(config.playback.clone()),
            scene: Scene::new(),
            heatmap: Scene::new(),
            aggregate: AggregateView::default(),
            aggregate_loaded: false,
            heatmap_notice: None,
            mode: ViewMode::Playback,
            viewport: Viewport::default(),
            status: format!("Connecting to {}...", config.server_url),
            history: Vec::new(),
        };
        let task = state.request_date(0);
        (state, task)
    }

    fn request_date(&mut self, offset: i64) -> Task<Message> {
        let request = self.engine.select_date(offset, Local::now().date_naive());
        self.status = format!("Loading detections for {}...", request.date);
        Task::perform(fetch_dataset(self.api.clone(), request), |(ticket, result)| {
            Message::DatasetFetched(ticket, result)
        })
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                state.engine.tick(&mut state.scene);
                Task::none()
            }
            Message::SelectDate(offset) => state.request_date(offset),
            Message::DatasetFetched(ticket, result) => {
                match state.engine.complete_fetch(ticket, result, &mut state.scene) {
                    Ok(FetchStatus::Started(_)) => {
                        let dataset = state.engine.dataset();
                        let entry = format!(
                            "{}: {} users / {} detections",
                            state
                                .engine
                                .loaded_date()
                                .map(|date| date.to_string())
                                .unwrap_or_default(),
                            dataset.user_count(),
                            dataset.sample_count()
                        );
                        state.status = format!("Playing {}", entry);
                        state.push_history(entry);
                    }
                    Ok(FetchStatus::Superseded) | Err(PlaybackError::Cancelled) => {}
                    Err(err) => {
                        log::warn!("dataset load failed: {}", err);
                        state.status = "Load failed; previous day kept on the map.".into();
                        state.push_history(format!("Load error: {err}"));
                    }
                }
                Task::none()
            }
            Message::TogglePlayback => {
                if state.engine.is_running() || state.engine.is_loading() {
                    log::info!("playback stopped at {}", state.engine.cursor());
                    state.engine.stop();
                    state.status = "Playback stopped".into();
                } else if state.engine.resume().is_some() {
                    state.status = "Playback resumed".into();
                }
                Task::none()
            }
            Message::ShowMode(mode) => {
                log::info!("switching to {:?} view", mode);
                state.mode = mode;
                if mode == ViewMode::Heatmap && !state.aggregate_loaded {
                    state.status = "Loading aggregate detections...".into();
                    return Task::perform(fetch_aggregate(state.api.clone()), Message::AggregateFetched);
                }
                Task::none()
            }
            Message::AggregateFetched(Ok(payload)) => {
                let summary = state.aggregate.render(&payload, &mut state.heatmap);
                state.aggregate_loaded = true;
                state.heatmap_notice = None;
                let entry = format!(
                    "Heatmap: {} detections at {} beacons",
                    summary.heat_points, summary.markers
                );
                state.status = entry.clone();
                state.push_history(entry);
                Task::none()
            }
            Message::AggregateFetched(Err(err)) => {
                log::warn!("aggregate load failed: {}", err);
                state.heatmap_notice = Some(format!("Could not load aggregate detections: {err}"));
                Task::none()
            }
            Message::ToggleMarkers => {
                let visible = state.aggregate.toggle_markers(&mut state.heatmap);
                log::info!("beacon markers visible: {}", visible);
                state.push_history(format!(
                    "Beacon markers {}",
                    if visible { "shown" } else { "hidden" }
                ));
                Task::none()
            }
            Message::Zoom(delta) => {
                state.viewport.zoom_by(delta);
                Task::none()
            }
            Message::DismissNotice => {
                state.engine.dismiss_notice();
                state.heatmap_notice = None;
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let selected = state
            .engine
            .selected_date()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".into());
        let clock = if state.engine.loaded_date().is_some() {
            format!("Time {}", state.engine.cursor())
        } else {
            "Time --:--".into()
        };

        let notice = match state.mode {
            ViewMode::Playback => state.engine.notice().map(|notice| notice.message()),
            ViewMode::Heatmap => state.heatmap_notice.clone(),
        };
        let notice_row: Element<'_, Message> = match notice {
            Some(message) => row![
                text(message).size(14).color(Color::from_rgb(0.95, 0.55, 0.2)),
                button("Dismiss").on_press(Message::DismissNotice).padding(4),
            ]
            .spacing(8)
            .align_y(Alignment::Center)
            .into(),
            None => text("").size(14).into(),
        };

        let playback_label = if state.engine.is_running() || state.engine.is_loading() {
            "Stop"
        } else {
            "Resume"
        };
        let markers_label = if state.aggregate.markers_visible() {
            "Hide beacon markers"
        } else {
            "Show beacon markers"
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let controls = column![
            text("Beacon Playback").size(26),
            text(format!("Date {}", selected)).size(18),
            text(clock).size(18),
            row![
                button("< Prev day").on_press(Message::SelectDate(-1)).padding(8),
                button("Today").on_press(Message::SelectDate(0)).padding(8),
                button("Next day >").on_press(Message::SelectDate(1)).padding(8),
            ]
            .spacing(6),
            button(playback_label).on_press(Message::TogglePlayback).padding(8),
            text("View").size(18),
            row![
                button("Playback")
                    .on_press(Message::ShowMode(ViewMode::Playback))
                    .padding(8),
                button("Heatmap")
                    .on_press(Message::ShowMode(ViewMode::Heatmap))
                    .padding(8),
            ]
            .spacing(6),
            button(markers_label)
                .on_press_maybe((state.mode == ViewMode::Heatmap).then_some(Message::ToggleMarkers))
                .padding(8),
            row![
                button("Zoom in").on_press(Message::Zoom(1.0)).padding(8),
                button("Zoom out").on_press(Message::Zoom(-1.0)).padding(8),
            ]
            .spacing(6),
            text(&state.status).size(14),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(160.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(340.0));

        let scene = match state.mode {
            ViewMode::Playback => &state.scene,
            ViewMode::Heatmap => &state.heatmap,
        };
        let map = Canvas::new(MapCanvas {
            scene,
            viewport: state.viewport,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let map_column = column![notice_row, map]
            .spacing(8)
            .padding(16)
            .width(Length::Fill)
            .height(Length::Fill);

        let layout = row![controls, map_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}
