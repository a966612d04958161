use crate::model::LatLng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Web-Mercator view onto the map, centered on `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: LatLng::new(22.998684, 120.218724),
            zoom: 17.0,
        }
    }
}

impl Viewport {
    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn world_pixel(&self, position: LatLng) -> (f64, f64) {
        let size = self.world_size();
        let x = (position.lng + 180.0) / 360.0 * size;
        let lat = position.lat.clamp(-85.051_128, 85.051_128).to_radians();
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
        (x, y)
    }

    /// Screen coordinates of `position` inside a `width` x `height` frame.
    pub fn project(&self, position: LatLng, width: f32, height: f32) -> (f32, f32) {
        let (cx, cy) = self.world_pixel(self.center);
        let (x, y) = self.world_pixel(position);
        (
            (x - cx) as f32 + width / 2.0,
            (y - cy) as f32 + height / 2.0,
        )
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_projects_to_frame_middle() {
        let viewport = Viewport::default();
        let (x, y) = viewport.project(viewport.center, 400.0, 300.0);
        assert!((x - 200.0).abs() < 1e-3);
        assert!((y - 150.0).abs() < 1e-3);
    }

    #[test]
    fn north_east_lands_up_and_right() {
        let viewport = Viewport::default();
        let target = LatLng::new(viewport.center.lat + 0.001, viewport.center.lng + 0.001);
        let (x, y) = viewport.project(target, 400.0, 300.0);
        assert!(x > 200.0);
        assert!(y < 150.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_by(10.0);
        assert_eq!(viewport.zoom, MAX_ZOOM);
        viewport.zoom_by(-40.0);
        assert_eq!(viewport.zoom, MIN_ZOOM);
    }
}
