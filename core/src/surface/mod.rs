//! Rendering seam between playback state and whatever draws the map.

pub mod heat;
pub mod scene;
pub mod viewport;

pub use heat::HeatGrid;
pub use scene::{Feature, Scene};
pub use viewport::Viewport;

use crate::model::{LatLng, Rgb};
use serde::{Deserialize, Serialize};

/// Named layer groups that can be cleared or hidden as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Points,
    Paths,
    Heat,
    BeaconMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub color: Rgb,
    pub label: Option<String>,
}

impl MarkerStyle {
    pub fn dot(color: Rgb) -> Self {
        Self { color, label: None }
    }

    pub fn labelled(color: Rgb, label: impl Into<String>) -> Self {
        Self {
            color,
            label: Some(label.into()),
        }
    }
}

/// Density layer rendering knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatOptions {
    pub min_opacity: f32,
    pub radius: f32,
    pub blur: f32,
}

impl Default for HeatOptions {
    fn default() -> Self {
        Self {
            min_opacity: 0.6,
            radius: 10.0,
            blur: 0.0,
        }
    }
}

/// Capabilities the playback and heatmap views need from a map library.
pub trait MapSurface {
    fn add_point(&mut self, layer: Layer, position: LatLng, style: MarkerStyle) -> FeatureId;
    fn add_polyline(&mut self, layer: Layer, path: &[LatLng], color: Rgb) -> FeatureId;
    fn add_heat_layer(&mut self, points: &[LatLng], options: HeatOptions) -> FeatureId;
    fn remove(&mut self, id: FeatureId);
    fn clear_layer(&mut self, layer: Layer);
    fn set_layer_visible(&mut self, layer: Layer, visible: bool);
}
