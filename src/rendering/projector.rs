//! Geographic → screen projection for grid cells.

use crate::core::{
    bounds::Bounds,
    constants::GRID_STEP_DEG,
    geo::{LatLng, Point},
};
use crate::traits::MapHost;
use crate::{MapError, Result};

/// Projects coordinates and cell rectangles through the host's live
/// projection.
///
/// Borrowing the host makes every projector a fresh view of the current
/// pan/zoom/size; nothing is cached between repaints.
pub struct ViewportProjector<'a> {
    host: &'a dyn MapHost,
    half_step: f64,
}

impl<'a> ViewportProjector<'a> {
    /// Fails with [`MapError::ProjectionUnavailable`] until the host is ready
    pub fn new(host: &'a dyn MapHost) -> Result<Self> {
        Self::with_step(host, GRID_STEP_DEG)
    }

    pub fn with_step(host: &'a dyn MapHost, step: f64) -> Result<Self> {
        if !host.is_ready() {
            return Err(MapError::ProjectionUnavailable);
        }
        Ok(Self {
            host,
            half_step: step / 2.0,
        })
    }

    /// Container pixel position of a coordinate
    pub fn project(&self, lat: f64, lng: f64) -> Point {
        self.host.lat_lng_to_container_point(&LatLng::new(lat, lng))
    }

    /// Screen rectangle covering the cell centered on `(lat, lng)`.
    ///
    /// The north-west and south-east corners of the cell's geographic box
    /// are projected independently, so the rectangle stays correct at any
    /// zoom without assuming a fixed pixel size per cell.
    pub fn cell_screen_rect(&self, lat: f64, lng: f64) -> Bounds {
        let north_west = self.project(lat + self.half_step, lng - self.half_step);
        let south_east = self.project(lat - self.half_step, lng + self.half_step);
        Bounds::from_corners(north_west, south_east)
    }

    /// Surface size the host currently reports
    pub fn surface_size(&self) -> Point {
        self.host.size()
    }
}
