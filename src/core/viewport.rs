use crate::core::geo::{LatLng, LatLngBounds, Point, EARTH_RADIUS, MAX_LATITUDE};
use crate::traits::MapHost;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tile edge used to scale projected coordinates at zoom 0.
const WORLD_TILE_SIZE: f64 = 256.0;

/// Manages the current view of the map: center, zoom, and screen dimensions.
///
/// This is the in-crate map host. Embedders driving a different map widget
/// implement [`MapHost`] for it instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Pixel origin for coordinate transformations (to avoid precision issues)
    pixel_origin: Option<Point>,
    /// Whether the host has finished its initial layout
    ready: bool,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let mut viewport = Self {
            center,
            zoom: zoom.clamp(0.0, 22.0),
            size,
            min_zoom: 0.0,
            max_zoom: 22.0,
            pixel_origin: None,
            ready: true,
        };
        viewport.update_pixel_origin();
        viewport
    }

    /// Creates a viewport that reports itself as not yet laid out
    pub fn pending(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            ready: false,
            ..Self::new(center, zoom, size)
        }
    }

    /// Marks the host as laid out and able to project
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(
            LatLng::clamp_lat(center.lat),
            center.lng.clamp(-180.0, 180.0),
        );
        self.update_pixel_origin();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.update_pixel_origin();
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.set_zoom(self.zoom);
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let scale = WORLD_TILE_SIZE * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let mercator = lat_lng.to_mercator();
        let circumference = 2.0 * PI * EARTH_RADIUS;

        Point::new(
            (mercator.x + PI * EARTH_RADIUS) / circumference * scale,
            (-mercator.y + PI * EARTH_RADIUS) / circumference * scale,
        )
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = WORLD_TILE_SIZE * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let circumference = 2.0 * PI * EARTH_RADIUS;

        let x = (pixel.x / scale) * circumference - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * circumference;

        LatLng::from_mercator(Point::new(x, y))
    }

    /// Gets or calculates the pixel origin for this viewport
    pub fn get_pixel_origin(&self) -> Point {
        self.pixel_origin
            .unwrap_or_else(|| self.project(&self.center, None).floor())
    }

    fn update_pixel_origin(&mut self) {
        self.pixel_origin = Some(self.project(&self.center, None).floor());
    }

    /// Converts LatLng to layer point (relative to pixel origin)
    pub fn lat_lng_to_layer_point(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.get_pixel_origin())
    }

    /// Converts layer point back to LatLng
    pub fn layer_point_to_lat_lng(&self, point: &Point) -> LatLng {
        self.unproject(&point.add(&self.get_pixel_origin()), None)
    }

    /// Converts a geographical coordinate to container pixel coordinates.
    ///
    /// Measured from the unrounded center projection so the view center
    /// always lands exactly on the container center.
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let offset = self
            .project(lat_lng, None)
            .subtract(&self.project(&self.center, None));
        Point::new(offset.x + self.size.x / 2.0, offset.y + self.size.y / 2.0)
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let offset = Point::new(pixel.x - self.size.x / 2.0, pixel.y - self.size.y / 2.0);
        self.unproject(&self.project(&self.center, None).add(&offset), None)
    }

    /// Pans the viewport by the given pixel offset
    pub fn pan(&mut self, delta: Point) {
        let current = self.lat_lng_to_layer_point(&self.center);
        let new_center = self.layer_point_to_lat_lng(&current.add(&delta));
        self.set_center(new_center);
    }

    /// Zooms the viewport, keeping `focus_point` (container pixels) stationary if given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus_point {
            Some(focus_screen) => {
                let focus_lat_lng = self.pixel_to_lat_lng(&focus_screen);
                self.zoom = new_zoom;
                self.update_pixel_origin();
                let drifted = self.lat_lng_to_pixel(&focus_lat_lng);
                self.pan(drifted.subtract(&focus_screen));
            }
            None => {
                self.zoom = new_zoom;
                self.update_pixel_origin();
            }
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::new(
            LatLng::new(se.lat.max(-MAX_LATITUDE), nw.lng),
            LatLng::new(nw.lat.min(MAX_LATITUDE), se.lng),
        )
    }
}

impl MapHost for Viewport {
    fn is_ready(&self) -> bool {
        self.ready && self.size.x > 0.0 && self.size.y > 0.0
    }

    fn size(&self) -> Point {
        self.size
    }

    fn lat_lng_to_container_point(&self, lat_lng: &LatLng) -> Point {
        self.lat_lng_to_pixel(lat_lng)
    }

    fn container_point_to_lat_lng(&self, point: &Point) -> LatLng {
        self.pixel_to_lat_lng(point)
    }

    fn visible_bounds(&self) -> LatLngBounds {
        self.bounds()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}
