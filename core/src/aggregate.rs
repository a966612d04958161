//! Static, one-shot density view over every recorded detection.

use crate::model::{DetectionSample, LatLng, Rgb};
use crate::prelude::PlaybackResult;
use crate::surface::{FeatureId, HeatOptions, Layer, MapSurface, MarkerStyle};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Cumulative detections reported at one beacon location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconCount {
    pub lat: f64,
    pub lng: f64,
    #[serde(
        default,
        deserialize_with = "crate::model::sample::beacon_id_from_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub beacon_id: Option<String>,
    pub count: u64,
}

impl BeaconCount {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn label(&self) -> String {
        match &self.beacon_id {
            Some(id) => format!("{}: {}", id, self.count),
            None => self.count.to_string(),
        }
    }
}

/// Body of the un-dated aggregate detection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatePayload {
    #[serde(default)]
    pub data: Vec<DetectionSample>,
    #[serde(default)]
    pub data_with_each_detection_cnt: Vec<BeaconCount>,
}

impl AggregatePayload {
    pub fn from_json(payload: &str) -> PlaybackResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn from_samples(data: Vec<DetectionSample>) -> Self {
        let data_with_each_detection_cnt = count_by_location(&data);
        Self {
            data,
            data_with_each_detection_cnt,
        }
    }

    /// Per-location counts, derived from `data` when the server sent none.
    pub fn beacon_counts(&self) -> Cow<'_, [BeaconCount]> {
        if self.data_with_each_detection_cnt.is_empty() {
            Cow::Owned(count_by_location(&self.data))
        } else {
            Cow::Borrowed(&self.data_with_each_detection_cnt)
        }
    }
}

/// Groups samples by exact coordinates, in order of first appearance.
pub fn count_by_location(samples: &[DetectionSample]) -> Vec<BeaconCount> {
    let mut slots: HashMap<(u64, u64), usize> = HashMap::new();
    let mut counts: Vec<BeaconCount> = Vec::new();
    for sample in samples {
        let key = sample.position().location_key();
        match slots.get(&key) {
            Some(&slot) => {
                let entry = &mut counts[slot];
                entry.count += 1;
                if entry.beacon_id.is_none() {
                    entry.beacon_id = sample.beacon_id.clone();
                }
            }
            None => {
                slots.insert(key, counts.len());
                counts.push(BeaconCount {
                    lat: sample.lat,
                    lng: sample.lng,
                    beacon_id: sample.beacon_id.clone(),
                    count: 1,
                });
            }
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSummary {
    pub heat_points: usize,
    pub markers: usize,
}

/// Renders the heat layer plus a labelled marker per beacon location and
/// owns the marker layer's visibility.
#[derive(Debug, Clone)]
pub struct AggregateView {
    options: HeatOptions,
    marker_color: Rgb,
    heat: Option<FeatureId>,
    markers: Vec<FeatureId>,
    markers_visible: bool,
}

impl Default for AggregateView {
    fn default() -> Self {
        Self::new(HeatOptions::default())
    }
}

impl AggregateView {
    pub fn new(options: HeatOptions) -> Self {
        Self {
            options,
            marker_color: Rgb::new(0x21, 0x85, 0xd0),
            heat: None,
            markers: Vec::new(),
            markers_visible: true,
        }
    }

    pub fn render<S: MapSurface>(
        &mut self,
        payload: &AggregatePayload,
        surface: &mut S,
    ) -> AggregateSummary {
        self.clear(surface);

        let points: Vec<LatLng> = payload.data.iter().map(DetectionSample::position).collect();
        self.heat = Some(surface.add_heat_layer(&points, self.options));

        for beacon in payload.beacon_counts().iter() {
            let style = MarkerStyle::labelled(self.marker_color, beacon.label());
            self.markers
                .push(surface.add_point(Layer::BeaconMarkers, beacon.position(), style));
        }
        surface.set_layer_visible(Layer::BeaconMarkers, self.markers_visible);

        log::info!(
            "aggregate view: {} detections over {} locations",
            points.len(),
            self.markers.len()
        );
        AggregateSummary {
            heat_points: points.len(),
            markers: self.markers.len(),
        }
    }

    /// Flips marker visibility; the heat layer and data are left alone.
    pub fn toggle_markers<S: MapSurface>(&mut self, surface: &mut S) -> bool {
        self.markers_visible = !self.markers_visible;
        surface.set_layer_visible(Layer::BeaconMarkers, self.markers_visible);
        self.markers_visible
    }

    pub fn markers_visible(&self) -> bool {
        self.markers_visible
    }

    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) {
        if let Some(heat) = self.heat.take() {
            surface.remove(heat);
        }
        for marker in self.markers.drain(..) {
            surface.remove(marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Scene;

    fn records() -> Vec<DetectionSample> {
        vec![
            DetectionSample::new(1.0, 1.0).with_beacon("A"),
            DetectionSample::new(2.0, 2.0).with_beacon("B"),
            DetectionSample::new(1.0, 1.0).with_beacon("A"),
            DetectionSample::new(3.0, 3.0),
            DetectionSample::new(1.0, 1.0).with_beacon("A"),
        ]
    }

    #[test]
    fn one_marker_per_distinct_location_with_counts() {
        let payload = AggregatePayload {
            data: records(),
            data_with_each_detection_cnt: Vec::new(),
        };
        let mut scene = Scene::new();
        let summary = AggregateView::default().render(&payload, &mut scene);

        assert_eq!(summary.heat_points, 5);
        assert_eq!(summary.markers, 3);
        assert_eq!(
            scene.points(Layer::BeaconMarkers),
            vec![
                (LatLng::new(1.0, 1.0), Some("A: 3")),
                (LatLng::new(2.0, 2.0), Some("B: 1")),
                (LatLng::new(3.0, 3.0), Some("1")),
            ]
        );
        assert_eq!(scene.count(Layer::Heat), 1);
    }

    #[test]
    fn server_counts_take_precedence() {
        let payload = AggregatePayload::from_json(
            r#"{"data": [{"lat": 1, "lng": 1}],
                "data_with_each_detection_cnt": [{"lat": 1, "lng": 1, "beacon_id": 9, "count": 40}]}"#,
        )
        .unwrap();
        assert_eq!(payload.beacon_counts()[0].label(), "9: 40");
    }

    #[test]
    fn toggling_twice_restores_the_render() {
        let payload = AggregatePayload::from_samples(records());
        let mut scene = Scene::new();
        let mut view = AggregateView::default();
        view.render(&payload, &mut scene);
        let original = scene.clone();

        assert!(!view.toggle_markers(&mut scene));
        assert_ne!(scene, original);
        assert_eq!(scene.visible_features().count(), 1);
        assert!(view.toggle_markers(&mut scene));
        assert_eq!(scene, original);
    }

    #[test]
    fn rerender_replaces_previous_layers() {
        let payload = AggregatePayload::from_samples(records());
        let mut scene = Scene::new();
        let mut view = AggregateView::default();
        view.render(&payload, &mut scene);
        view.render(&payload, &mut scene);
        assert_eq!(scene.count(Layer::Heat), 1);
        assert_eq!(scene.count(Layer::BeaconMarkers), 3);
    }

    #[test]
    fn empty_payload_renders_an_empty_heat_layer() {
        let mut scene = Scene::new();
        let summary = AggregateView::default().render(&AggregatePayload::default(), &mut scene);
        assert_eq!(summary.markers, 0);
        assert_eq!(scene.count(Layer::BeaconMarkers), 0);
    }
}
