use crate::{
    animation::frame::FrameScheduler,
    core::{
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    input::{events::MapEvent, subscriptions::EventBus},
    layers::{
        base::{LayerContext, OverlayLayer},
        manager::LayerManager,
        pane::{Pane, PaneManager},
    },
    rendering::context::RenderContext,
    store::{
        feed::{FeedPump, FeedSubscription},
        live::{LiveCellStore, StoreChange},
    },
    traits::{MapHost, PushFeed, SeedSource},
    MapError, Result,
};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Borrow the session's collaborators as a [`LayerContext`] while leaving
/// `self.layers` free for a disjoint mutable borrow.
macro_rules! layer_ctx {
    ($session:expr) => {
        LayerContext {
            host: &$session.host,
            panes: &mut $session.panes,
            events: &mut $session.events,
            frames: &mut $session.frames,
            store: &$session.store,
        }
    };
}

/// One map with its overlays, cell store and feed subscription.
///
/// Everything the overlays share is owned here and lent to them per
/// callback; there is no global state. The host drives the session by
/// forwarding its notifications to [`MapSession::dispatch`], calling
/// [`MapSession::frame`] once per display refresh and
/// [`MapSession::pump_store_changes`] whenever it regains control.
pub struct MapSession<H: MapHost = Viewport> {
    host: H,
    panes: PaneManager,
    events: EventBus,
    frames: FrameScheduler,
    layers: LayerManager,
    store: LiveCellStore,
    store_changes: Receiver<StoreChange>,
    feed: Option<FeedSubscription>,
}

impl<H: MapHost> MapSession<H> {
    pub fn new(host: H, store: LiveCellStore) -> Self {
        let store_changes = store.subscribe();
        Self {
            host,
            panes: PaneManager::new(),
            events: EventBus::new(),
            frames: FrameScheduler::new(),
            layers: LayerManager::new(),
            store,
            store_changes,
            feed: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access. Callers that change the view must follow up
    /// with the matching [`MapEvent`].
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &LiveCellStore {
        &self.store
    }

    pub fn panes(&self) -> &PaneManager {
        &self.panes
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn frames(&self) -> &FrameScheduler {
        &self.frames
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Attach an overlay. It acquires its surface and subscriptions here.
    pub fn add_layer(&mut self, mut layer: Box<dyn OverlayLayer>) -> Result<()> {
        if self.layers.contains(layer.id()) {
            return Err(MapError::Layer(format!("duplicate layer id {}", layer.id())));
        }
        layer.on_add(&mut layer_ctx!(self))?;
        self.layers.add_layer(layer)
    }

    /// Detach an overlay and hand it back
    pub fn remove_layer(&mut self, layer_id: &str) -> Result<Option<Box<dyn OverlayLayer>>> {
        let Some(mut layer) = self.layers.remove_layer(layer_id) else {
            return Ok(None);
        };
        layer.on_remove(&mut layer_ctx!(self))?;
        Ok(Some(layer))
    }

    /// Typed access to an attached overlay
    pub fn layer<T: OverlayLayer + 'static>(&self, layer_id: &str) -> Option<&T> {
        self.layers.get_layer(layer_id)?.as_any().downcast_ref::<T>()
    }

    /// Run `f` against a typed overlay with its context
    pub fn with_layer_mut<T, R, F>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        T: OverlayLayer + 'static,
        F: FnOnce(&mut T, &mut LayerContext<'_>) -> R,
    {
        let layer = self.layers.get_layer_mut(layer_id)?.as_any_mut().downcast_mut::<T>()?;
        Some(f(layer, &mut layer_ctx!(self)))
    }

    /// Deliver an event to every overlay subscribed to its kind.
    ///
    /// All subscribers run even if one fails; the first error is returned.
    pub fn dispatch(&mut self, event: MapEvent) -> Result<()> {
        let kind = event.kind();
        let targets: Vec<String> = self
            .layers
            .ids()
            .iter()
            .filter(|id| self.events.is_subscribed(id, kind))
            .cloned()
            .collect();

        let mut first_error = None;
        for id in targets {
            let Some(layer) = self.layers.get_layer_mut(&id) else {
                continue;
            };
            if let Err(e) = layer.on_event(&event, &mut layer_ctx!(self)) {
                log::warn!("layer {} failed to handle {}: {}", id, kind, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drain the pending store notification, turning any number of store
    /// mutations since the last pump into a single
    /// [`MapEvent::CellsChanged`]. Returns how many were drained, which is
    /// at most one.
    pub fn pump_store_changes(&mut self) -> Result<usize> {
        let drained = self.store_changes.try_iter().count();
        if drained > 0 {
            log::trace!("{} store changes since last pump", drained);
            self.dispatch(MapEvent::CellsChanged)?;
        }
        Ok(drained)
    }

    /// One display refresh: run every scheduled frame task.
    ///
    /// All tasks run even if one fails; the first error is returned.
    pub fn frame(&mut self) -> Result<()> {
        let mut first_error = None;
        for owner in self.frames.tick() {
            // A task whose layer is gone has nothing to draw into
            let Some(layer) = self.layers.get_layer_mut(&owner) else {
                continue;
            };
            if let Err(e) = layer.on_frame(&mut layer_ctx!(self)) {
                log::warn!("layer {} failed to draw frame: {}", owner, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Pointer moved to a container pixel position
    pub fn pointer_move(&mut self, pixel: Point) -> Result<()> {
        let lat_lng = self.host.container_point_to_lat_lng(&pixel);
        self.dispatch(MapEvent::PointerMove { lat_lng })
    }

    /// Composited surfaces, bottom to top
    pub fn surfaces(&self) -> Vec<(&Pane, &RenderContext)> {
        self.panes.render_order()
    }

    /// Replace the store contents with the most recent placements
    pub async fn seed_from(&self, source: &dyn SeedSource, limit: usize) -> Result<usize> {
        let cells = source.load_recent(limit).await?;
        let count = cells.len();
        self.store.seed(cells);
        log::info!("seeded {} cells", count);
        Ok(count)
    }

    /// Subscribe to live placements. Any previous subscription is torn down
    /// first.
    pub async fn connect_feed(&mut self, feed: Arc<dyn PushFeed>, channel: &str, pump: FeedPump) -> Result<()> {
        self.disconnect_feed();
        self.feed = Some(FeedSubscription::open(feed, channel, pump).await?);
        Ok(())
    }

    pub fn disconnect_feed(&mut self) {
        if let Some(subscription) = self.feed.take() {
            subscription.unsubscribe();
        }
    }

    pub fn feed(&self) -> Option<&FeedSubscription> {
        self.feed.as_ref()
    }

    /// Detach every overlay and cancel the feed
    pub fn teardown(&mut self) -> Result<()> {
        self.disconnect_feed();
        for id in self.layers.ids().to_vec() {
            self.remove_layer(&id)?;
        }
        log::debug!(
            "session torn down: {} surfaces, {} subscriptions, {} frame tasks left",
            self.panes.surface_count(),
            self.events.len(),
            self.frames.active_count()
        );
        Ok(())
    }
}

/// View changes for the in-crate viewport host. Each one updates the view
/// and dispatches the event a map widget would emit once it settles.
impl MapSession<Viewport> {
    pub fn set_ready(&mut self) -> Result<()> {
        self.host.mark_ready();
        self.dispatch(MapEvent::Ready)
    }

    pub fn pan_by(&mut self, delta: Point) -> Result<()> {
        self.host.pan(delta);
        let center = self.host.center;
        self.dispatch(MapEvent::MoveEnd { center })
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()> {
        self.host.set_center(center);
        self.host.set_zoom(zoom);
        self.dispatch(MapEvent::MoveEnd { center: self.host.center })?;
        self.dispatch(MapEvent::ZoomEnd { zoom: self.host.zoom })
    }

    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) -> Result<()> {
        self.host.zoom_to(zoom, focus);
        let zoom = self.host.zoom;
        self.dispatch(MapEvent::ZoomEnd { zoom })
    }

    pub fn resize(&mut self, size: Point) -> Result<()> {
        self.host.set_size(size);
        self.dispatch(MapEvent::Resize { size })
    }
}

impl<H: MapHost> Drop for MapSession<H> {
    fn drop(&mut self) {
        self.disconnect_feed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::CellSlot;
    use crate::layers::{
        base::{LayerProperties, LayerState, LayerType},
        pane::SurfaceId,
        pixels::PixelCanvasLayer,
        reticle::ReticleLayer,
    };
    use crate::store::cell::Cell;

    /// Overlay whose every frame fails
    struct BrokenFrames {
        properties: LayerProperties,
        frames_seen: usize,
    }

    impl BrokenFrames {
        fn new(id: &str) -> Self {
            Self {
                properties: LayerProperties::new(id, LayerType::Reticle, "broken-pane", 700),
                frames_seen: 0,
            }
        }
    }

    impl OverlayLayer for BrokenFrames {
        fn properties(&self) -> &LayerProperties {
            &self.properties
        }

        fn state(&self) -> LayerState {
            LayerState::Attached
        }

        fn surface(&self) -> Option<SurfaceId> {
            None
        }

        fn on_add(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
            ctx.frames.request(&self.properties.id);
            Ok(())
        }

        fn on_remove(&mut self, _ctx: &mut LayerContext<'_>) -> Result<()> {
            Ok(())
        }

        fn on_event(&mut self, _event: &MapEvent, _ctx: &mut LayerContext<'_>) -> Result<()> {
            Ok(())
        }

        fn on_frame(&mut self, _ctx: &mut LayerContext<'_>) -> Result<()> {
            self.frames_seen += 1;
            Err(MapError::Layer("broken frame".to_string()))
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn session() -> MapSession {
        MapSession::new(
            Viewport::new(LatLng::new(10.0, 20.0), 17.0, Point::new(640.0, 480.0)),
            LiveCellStore::new(100),
        )
    }

    #[test]
    fn store_changes_coalesce_into_one_repaint() {
        let mut session = session();
        session.add_layer(Box::new(PixelCanvasLayer::new("pixels"))).unwrap();

        session.store().merge(Cell::new(10.0, 20.0, 1));
        session.store().merge(Cell::new(10.0002, 20.0, 2));
        assert_eq!(session.pump_store_changes().unwrap(), 1);
        assert_eq!(session.pump_store_changes().unwrap(), 0);

        let pixels = session.layer::<PixelCanvasLayer>("pixels").unwrap();
        assert_eq!(pixels.last_repaint().painted, 2);
    }

    #[test]
    fn frame_drives_reticle_only() {
        let mut session = session();
        session.add_layer(Box::new(PixelCanvasLayer::new("pixels"))).unwrap();
        session.add_layer(Box::new(ReticleLayer::new("reticle"))).unwrap();
        assert_eq!(session.frames().active_count(), 1);

        session.pointer_move(Point::new(320.0, 240.0)).unwrap();
        session.frame().unwrap();

        let surfaces = session.surfaces();
        assert_eq!(surfaces.len(), 2);
        assert_eq!(surfaces[1].0.id, "mapix-grid-overlay");
        assert_eq!(surfaces[1].1.commands().len(), 1);
    }

    #[test]
    fn teardown_releases_everything() {
        let mut session = session();
        session.add_layer(Box::new(PixelCanvasLayer::new("pixels"))).unwrap();
        session.add_layer(Box::new(ReticleLayer::new("reticle"))).unwrap();

        session.teardown().unwrap();
        assert!(session.layers().is_empty());
        assert_eq!(session.panes().surface_count(), 0);
        assert!(session.events().is_empty());
        assert_eq!(session.frames().active_count(), 0);
        assert!(session.remove_layer("pixels").unwrap().is_none());
    }

    #[test]
    fn unpumped_merges_queue_a_single_change() {
        let mut session = MapSession::new(
            Viewport::new(LatLng::new(10.0, 20.0), 17.0, Point::new(640.0, 480.0)),
            LiveCellStore::new(10),
        );
        for i in 0..100_000 {
            session.store().merge(Cell::new(10.0 + i as f64 * 1e-6, 20.0, 1));
        }

        assert_eq!(session.store().len(), 10);
        assert_eq!(session.store_changes.len(), 1);
        assert_eq!(session.pump_store_changes().unwrap(), 1);

        // The listener survives a full queue
        session.store().merge(Cell::new(10.0, 20.0, 2));
        assert_eq!(session.pump_store_changes().unwrap(), 1);
    }

    #[test]
    fn failing_frame_task_does_not_starve_later_tasks() {
        let mut session = session();
        session.add_layer(Box::new(BrokenFrames::new("broken"))).unwrap();
        session.add_layer(Box::new(ReticleLayer::new("reticle"))).unwrap();
        session.pointer_move(Point::new(320.0, 240.0)).unwrap();

        assert!(matches!(session.frame(), Err(MapError::Layer(_))));

        assert_eq!(session.layer::<BrokenFrames>("broken").unwrap().frames_seen, 1);
        let reticle = session
            .surfaces()
            .into_iter()
            .find(|(pane, _)| pane.id == "mapix-grid-overlay")
            .map(|(_, surface)| surface.commands().len());
        assert_eq!(reticle, Some(1));
    }

    #[test]
    fn pointer_move_resolves_through_host_projection() {
        let mut session = session();
        session.add_layer(Box::new(ReticleLayer::new("reticle"))).unwrap();

        let pixel = Point::new(100.0, 50.0);
        session.pointer_move(pixel).unwrap();

        let expected = CellSlot::containing(&session.host().container_point_to_lat_lng(&pixel));
        let reticle = session.layer::<ReticleLayer>("reticle").unwrap();
        assert_eq!(reticle.last_highlighted(), Some(expected));
    }
}
