use crate::model::{LatLng, Rgb};
use crate::surface::{FeatureId, HeatOptions, Layer, MapSurface, MarkerStyle};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Point {
        position: LatLng,
        style: MarkerStyle,
    },
    Polyline {
        path: Vec<LatLng>,
        color: Rgb,
    },
    Heat {
        points: Vec<LatLng>,
        options: HeatOptions,
    },
}

/// In-memory map surface: the viewer draws from it and tests inspect it.
///
/// Equality compares what would be on screen (features and layer
/// visibility), not bookkeeping such as clear counters.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    features: BTreeMap<FeatureId, (Layer, Feature)>,
    hidden: BTreeSet<Layer>,
    clears: BTreeMap<Layer, usize>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, layer: Layer, feature: Feature) -> FeatureId {
        self.next_id += 1;
        let id = FeatureId(self.next_id);
        self.features.insert(id, (layer, feature));
        id
    }

    pub fn features(&self, layer: Layer) -> impl Iterator<Item = &Feature> {
        self.features
            .values()
            .filter(move |(owner, _)| *owner == layer)
            .map(|(_, feature)| feature)
    }

    /// Features of visible layers, in insertion order.
    pub fn visible_features(&self) -> impl Iterator<Item = (Layer, &Feature)> {
        self.features
            .values()
            .filter(|(layer, _)| !self.hidden.contains(layer))
            .map(|(layer, feature)| (*layer, feature))
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.features(layer).count()
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        !self.hidden.contains(&layer)
    }

    pub fn clear_count(&self, layer: Layer) -> usize {
        self.clears.get(&layer).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Point positions on `layer`, with their labels.
    pub fn points(&self, layer: Layer) -> Vec<(LatLng, Option<&str>)> {
        self.features(layer)
            .filter_map(|feature| match feature {
                Feature::Point { position, style } => Some((*position, style.label.as_deref())),
                _ => None,
            })
            .collect()
    }
}

impl PartialEq for Scene {
    fn eq(&self, other: &Self) -> bool {
        self.features == other.features && self.hidden == other.hidden
    }
}

impl MapSurface for Scene {
    fn add_point(&mut self, layer: Layer, position: LatLng, style: MarkerStyle) -> FeatureId {
        self.insert(layer, Feature::Point { position, style })
    }

    fn add_polyline(&mut self, layer: Layer, path: &[LatLng], color: Rgb) -> FeatureId {
        self.insert(
            layer,
            Feature::Polyline {
                path: path.to_vec(),
                color,
            },
        )
    }

    fn add_heat_layer(&mut self, points: &[LatLng], options: HeatOptions) -> FeatureId {
        self.insert(
            Layer::Heat,
            Feature::Heat {
                points: points.to_vec(),
                options,
            },
        )
    }

    fn remove(&mut self, id: FeatureId) {
        self.features.remove(&id);
    }

    fn clear_layer(&mut self, layer: Layer) {
        self.features.retain(|_, (owner, _)| *owner != layer);
        *self.clears.entry(layer).or_default() += 1;
    }

    fn set_layer_visible(&mut self, layer: Layer, visible: bool) {
        if visible {
            self.hidden.remove(&layer);
        } else {
            self.hidden.insert(layer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn clear_layer_only_touches_that_layer() {
        let mut scene = Scene::new();
        scene.add_point(Layer::Points, LatLng::new(0.0, 0.0), MarkerStyle::dot(RED));
        scene.add_polyline(
            Layer::Paths,
            &[LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            RED,
        );
        scene.clear_layer(Layer::Points);
        assert_eq!(scene.count(Layer::Points), 0);
        assert_eq!(scene.count(Layer::Paths), 1);
        assert_eq!(scene.clear_count(Layer::Points), 1);
    }

    #[test]
    fn hidden_layers_are_skipped_when_drawing() {
        let mut scene = Scene::new();
        scene.add_point(
            Layer::BeaconMarkers,
            LatLng::new(0.0, 0.0),
            MarkerStyle::labelled(RED, "3"),
        );
        scene.set_layer_visible(Layer::BeaconMarkers, false);
        assert_eq!(scene.visible_features().count(), 0);
        assert_eq!(scene.count(Layer::BeaconMarkers), 1);
        scene.set_layer_visible(Layer::BeaconMarkers, true);
        assert_eq!(scene.points(Layer::BeaconMarkers)[0].1, Some("3"));
    }

    #[test]
    fn remove_drops_single_feature() {
        let mut scene = Scene::new();
        let id = scene.add_heat_layer(&[LatLng::new(0.0, 0.0)], HeatOptions::default());
        scene.remove(id);
        assert!(scene.is_empty());
    }
}
