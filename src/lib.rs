//! # Mapix
//!
//! A geo-anchored pixel canvas: colored grid cells pinned to real-world
//! coordinates, painted as overlays on top of a pannable/zoomable map.
//!
//! The crate quantizes coordinates onto a fixed lattice, re-projects cells
//! into screen space whenever the viewport changes, tracks the pointer with
//! a reticle snapped to the same lattice, merges a live placement feed into
//! an in-memory store and talks to a rate-limited placement endpoint.

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod placement;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod spatial;
pub mod store;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::MapixConfig,
    geo::{LatLng, LatLngBounds, Point},
    grid::{quantize, quantize_lat_lng, CellSlot},
    map::MapSession,
    viewport::Viewport,
};

pub use input::events::MapEvent;

pub use layers::{pixels::PixelCanvasLayer, reticle::ReticleLayer};

pub use placement::{AuthToken, PlacementClient, PlacementReceipt, PlacementRequest};

pub use store::{
    cell::{Cell, CellSnapshot},
    live::LiveCellStore,
};

pub use traits::{MapHost, PushFeed, SeedSource};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Placement rejected: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Rejected {
        reason: Option<String>,
        refill_in: Option<f64>,
    },

    #[error("Projection unavailable: map host is not ready")]
    ProjectionUnavailable,

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for MapError {
    fn from(err: reqwest::Error) -> Self {
        MapError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::ParseError(err.to_string())
    }
}

/// Failure outcome of a placement call.
///
/// None of these mutate the cell store; retrying (for example after
/// `refill_in` seconds) is left to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    /// The request was refused locally and never sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request could not be sent or the response body not retrieved
    #[error("network error: {0}")]
    Network(String),

    /// The response body matched neither the success nor the failure shape
    #[error("parse error: {0}")]
    Parse(String),

    /// The endpoint declined the placement (rate limit, invalid slot, ...)
    #[error("placement rejected: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Rejected {
        reason: Option<String>,
        refill_in: Option<f64>,
    },
}

impl PlacementError {
    /// Seconds until the server expects a token to be available again
    pub fn refill_in(&self) -> Option<f64> {
        match self {
            PlacementError::Rejected { refill_in, .. } => *refill_in,
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PlacementError::Rejected { reason: Some(reason), .. } if reason == "rate_limited")
    }
}

impl From<PlacementError> for MapError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::InvalidRequest(msg) => MapError::InvalidInput(msg),
            PlacementError::Network(msg) => MapError::Network(msg),
            PlacementError::Parse(msg) => MapError::ParseError(msg),
            PlacementError::Rejected { reason, refill_in } => MapError::Rejected { reason, refill_in },
        }
    }
}

/// Error type alias for convenience
pub type Error = MapError;

/// Install an `env_logger` backend honoring `RUST_LOG`. Safe to call more
/// than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .try_init();
}
