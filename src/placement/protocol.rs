//! Wire shapes of the placement endpoint.
//!
//! Request: `POST {lat, lng, color}` with pre-quantized coordinates.
//! Response, decoded once into [`PlaceResponse`]:
//! - `{ok: true, lat, lng, color, pool_size}`
//! - `{ok: false, reason?, refill_in?}`
//!
//! Anything else, including an `ok: true` body missing an echoed field, is
//! a parse failure rather than a partial result.

use crate::core::geo::LatLng;
use crate::core::grid::quantize_lat_lng;
use crate::store::cell::Cell;
use crate::PlacementError;
use serde::{Deserialize, Serialize};

/// Body of a placement request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementRequest {
    pub lat: f64,
    pub lng: f64,
    pub color: u8,
}

impl PlacementRequest {
    /// Builds a request from coordinates the caller has already quantized.
    pub fn new(lat: f64, lng: f64, color: u8) -> Self {
        Self { lat, lng, color }
    }

    /// Builds a request for the cell under an arbitrary map position,
    /// e.g. a click, quantizing it first.
    pub fn at(lat_lng: &LatLng, color: u8) -> Self {
        let snapped = quantize_lat_lng(lat_lng);
        Self::new(snapped.lat, snapped.lng, color)
    }

    /// Rejects coordinates that cannot name a cell.
    pub fn validate(&self) -> Result<(), PlacementError> {
        if self.lat.is_finite() && self.lng.is_finite() {
            Ok(())
        } else {
            Err(PlacementError::InvalidRequest(format!(
                "non-finite coordinate ({}, {})",
                self.lat, self.lng
            )))
        }
    }
}

/// Decoded placement response.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceResponse {
    Accepted { cell: Cell, pool_size: u32 },
    Rejected {
        reason: Option<String>,
        refill_in: Option<f64>,
    },
}

#[derive(Deserialize)]
struct RawPlaceResponse {
    ok: bool,
    lat: Option<f64>,
    lng: Option<f64>,
    color: Option<u8>,
    pool_size: Option<u32>,
    reason: Option<String>,
    refill_in: Option<f64>,
}

impl TryFrom<RawPlaceResponse> for PlaceResponse {
    type Error = PlacementError;

    fn try_from(raw: RawPlaceResponse) -> Result<Self, Self::Error> {
        if !raw.ok {
            return Ok(PlaceResponse::Rejected {
                reason: raw.reason,
                refill_in: raw.refill_in,
            });
        }

        match (raw.lat, raw.lng, raw.color, raw.pool_size) {
            (Some(lat), Some(lng), Some(color), Some(pool_size)) => Ok(PlaceResponse::Accepted {
                cell: Cell::new(lat, lng, color),
                pool_size,
            }),
            _ => Err(PlacementError::Parse(
                "accepted response is missing lat, lng, color or pool_size".to_string(),
            )),
        }
    }
}

/// Decodes a response body into one of the two known shapes.
pub fn decode_response(body: &str) -> Result<PlaceResponse, PlacementError> {
    let raw: RawPlaceResponse =
        serde_json::from_str(body).map_err(|e| PlacementError::Parse(e.to_string()))?;
    PlaceResponse::try_from(raw)
}
