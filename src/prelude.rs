//! Prelude module for common mapix types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapix::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{MapixConfig, ReticleStyle},
    constants::GRID_STEP_DEG,
    geo::{LatLng, LatLngBounds, Point},
    grid::{quantize, quantize_lat_lng, CellSlot},
    map::MapSession,
    viewport::Viewport,
};

pub use crate::input::events::{MapEvent, MapEventKind};

pub use crate::layers::{
    base::{LayerContext, LayerState, OverlayLayer},
    pixels::{PixelCanvasLayer, RepaintStats},
    reticle::ReticleLayer,
};

pub use crate::rendering::{
    color::{cell_fill, Rgba},
    context::{DrawCommand, RenderContext},
    projector::ViewportProjector,
};

pub use crate::store::{
    cell::{Cell, CellSnapshot},
    feed::{FeedPump, FeedSignal, FeedSubscription, PLACEMENTS_CHANNEL},
    live::LiveCellStore,
    seed::RestSeedSource,
};

pub use crate::placement::{AuthToken, PlacementClient, PlacementReceipt, PlacementRequest};

pub use crate::runtime::{spawn, AsyncHandle, AsyncSpawner};

pub use crate::traits::{MapHost, PushFeed, SeedSource};

pub use crate::{Error as MapError, PlacementError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
