//! Grid quantization.
//!
//! Every coordinate that identifies a cell, whether typed by a user, echoed
//! by the placement endpoint or read from the feed, is snapped onto the
//! fixed-step lattice defined by [`GRID_STEP_DEG`]. Cell-slot equality is
//! only ever decided on quantized values.
//!
//! Ties at exactly half a step round away from zero (`f64::round`), so
//! `0.5 * step` snaps to `step` and `-0.5 * step` snaps to `-step`.

use crate::core::constants::GRID_STEP_DEG;
use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Snaps `value` to the nearest multiple of [`GRID_STEP_DEG`].
pub fn quantize(value: f64) -> f64 {
    quantize_with_step(value, GRID_STEP_DEG)
}

/// Snaps `value` to the nearest multiple of `step`.
///
/// Non-finite input is returned unchanged so callers can still reject it.
///
/// Idempotent: `quantize_with_step(quantize_with_step(x, s), s)` returns the
/// same bits as the inner call.
pub fn quantize_with_step(value: f64, step: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    lattice_index(value, step) as f64 * step
}

/// Snaps both components of a coordinate.
pub fn quantize_lat_lng(lat_lng: &LatLng) -> LatLng {
    LatLng::new(quantize(lat_lng.lat), quantize(lat_lng.lng))
}

/// Saturating: NaN maps to 0 and infinities to the outermost index.
fn lattice_index(value: f64, step: f64) -> i64 {
    (value / step).round() as i64
}

/// Integer lattice address of a cell.
///
/// Two cells occupy the same slot iff their slots compare equal; the
/// integer form avoids comparing floating-point coordinates directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSlot {
    pub lat_index: i64,
    pub lng_index: i64,
}

impl CellSlot {
    /// Slot containing an arbitrary (not necessarily quantized) coordinate.
    pub fn containing(lat_lng: &LatLng) -> Self {
        Self::containing_with_step(lat_lng, GRID_STEP_DEG)
    }

    pub fn containing_with_step(lat_lng: &LatLng, step: f64) -> Self {
        Self {
            lat_index: lattice_index(lat_lng.lat, step),
            lng_index: lattice_index(lat_lng.lng, step),
        }
    }

    /// Quantized center of the slot.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            self.lat_index as f64 * GRID_STEP_DEG,
            self.lng_index as f64 * GRID_STEP_DEG,
        )
    }
}
