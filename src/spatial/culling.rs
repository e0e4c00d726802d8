use crate::core::{
    bounds::Bounds,
    geo::{LatLng, LatLngBounds, Point},
};

/// Simple axis-aligned culling helper.
///
/// Geographic checks run before projection so off-screen cells never reach
/// the projector; screen-space checks work on already projected rectangles.
pub struct Culling;

impl Culling {
    /// Returns `true` if the supplied rectangle is at least partially inside the viewport.
    pub fn aabb_intersects(viewport: &Bounds, target: &Bounds) -> bool {
        viewport.intersects(target)
    }

    /// Returns `true` if a point lies inside the viewport rectangle.
    pub fn point_visible(viewport: &Bounds, p: &Point) -> bool {
        viewport.contains(p)
    }

    /// Visible geographic extent grown by half a cell, so cells whose
    /// center is just off-screen but whose edge is visible are kept.
    pub fn cell_window(visible: &LatLngBounds, step: f64) -> LatLngBounds {
        visible.padded(step / 2.0)
    }

    /// Returns `true` if the cell centered on `(lat, lng)` may be on screen
    pub fn cell_visible(window: &LatLngBounds, lat: f64, lng: f64) -> bool {
        window.contains(&LatLng::new(lat, lng))
    }
}
