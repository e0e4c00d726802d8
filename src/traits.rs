//! Seams to the collaborators this crate consumes but does not own: the map
//! widget hosting the overlays, the bulk read store and the push feed.

use crate::{
    core::geo::{LatLng, LatLngBounds, Point},
    store::{cell::Cell, feed::FeedSignal},
    Result,
};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Live pan/zoom/projection state of the map widget.
///
/// Treated as read-only; overlays react to change notifications and query
/// the projection afresh on every repaint.
pub trait MapHost {
    /// Whether the host has laid out and can answer projection queries
    fn is_ready(&self) -> bool;

    /// Container size in pixels
    fn size(&self) -> Point;

    /// Projects a geographic coordinate into container pixel space
    fn lat_lng_to_container_point(&self, lat_lng: &LatLng) -> Point;

    /// Inverse of [`MapHost::lat_lng_to_container_point`]
    fn container_point_to_lat_lng(&self, point: &Point) -> LatLng;

    /// Geographic extent currently on screen
    fn visible_bounds(&self) -> LatLngBounds;
}

/// Bulk read of the most recent placements, newest first.
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn load_recent(&self, limit: usize) -> Result<Vec<Cell>>;
}

/// Push subscription delivering one signal per accepted placement.
///
/// The returned stream completes once the subscription handshake has
/// succeeded; delivery is at-least-once and unordered across identities.
#[async_trait]
pub trait PushFeed: Send + Sync {
    async fn subscribe(&self, channel: &str) -> Result<BoxStream<'static, FeedSignal>>;
}
