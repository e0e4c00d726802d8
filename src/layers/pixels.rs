use crate::core::{
    config::MapixConfig,
    constants::{GRID_STEP_DEG, PIXEL_PANE_ID, PIXEL_PANE_Z_INDEX},
    geo::Point,
};
use crate::input::events::{MapEvent, MapEventKind};
use crate::layers::base::{LayerContext, LayerProperties, LayerState, LayerType, OverlayLayer};
use crate::layers::pane::SurfaceId;
use crate::rendering::{color::cell_fill, projector::ViewportProjector};
use crate::spatial::culling::Culling;
use crate::{MapError, Result};

/// Events that invalidate the canvas
const REPAINT_TRIGGERS: &[MapEventKind] = &[
    MapEventKind::Ready,
    MapEventKind::MoveEnd,
    MapEventKind::ZoomEnd,
    MapEventKind::Resize,
    MapEventKind::CellsChanged,
];

/// Outcome of one repaint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepaintStats {
    /// Cells drawn to the surface
    pub painted: usize,
    /// Cells skipped before projection because they lie outside the view
    pub culled: usize,
    /// Cells projected but falling entirely off the surface
    pub offscreen: usize,
}

/// Paints every cell of the live store as a filled rectangle.
///
/// Cells are painted oldest first so that when several entries share a slot
/// the newest one ends up on top.
pub struct PixelCanvasLayer {
    properties: LayerProperties,
    state: LayerState,
    surface: Option<SurfaceId>,
    culling: bool,
    /// Size the surface buffer was last allocated at
    cached_size: Option<Point>,
    last_repaint: RepaintStats,
}

impl PixelCanvasLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::PixelCanvas, PIXEL_PANE_ID, PIXEL_PANE_Z_INDEX),
            state: LayerState::Uninitialized,
            surface: None,
            culling: true,
            cached_size: None,
            last_repaint: RepaintStats::default(),
        }
    }

    pub fn from_config(id: impl Into<String>, config: &MapixConfig) -> Self {
        Self::new(id).with_culling(config.culling)
    }

    /// Skip cells outside the visible bounds before projecting them
    pub fn with_culling(mut self, culling: bool) -> Self {
        self.culling = culling;
        self
    }

    pub fn last_repaint(&self) -> RepaintStats {
        self.last_repaint
    }

    /// Redraw the whole canvas from the current store snapshot.
    ///
    /// A detached layer returns empty stats without drawing. Fails with
    /// [`MapError::ProjectionUnavailable`] if the host cannot project yet.
    pub fn request_repaint(&mut self, ctx: &mut LayerContext<'_>) -> Result<RepaintStats> {
        let Some(surface_id) = self.surface else {
            log::trace!("repaint of detached layer {} ignored", self.properties.id);
            return Ok(RepaintStats::default());
        };

        let projector = ViewportProjector::with_step(ctx.host, GRID_STEP_DEG)?;
        let window = self
            .culling
            .then(|| Culling::cell_window(&ctx.host.visible_bounds(), GRID_STEP_DEG));
        let size = projector.surface_size();
        let snapshot = ctx.store.snapshot();

        let Some(surface) = ctx.panes.surface_mut(surface_id) else {
            return Ok(RepaintStats::default());
        };
        if self.cached_size != Some(size) {
            surface.resize(size);
            self.cached_size = Some(size);
        }
        surface.clear();

        let mut stats = RepaintStats::default();
        for cell in snapshot.iter_paint_order() {
            if let Some(window) = &window {
                if !Culling::cell_visible(window, cell.lat, cell.lng) {
                    stats.culled += 1;
                    continue;
                }
            }
            let rect = projector.cell_screen_rect(cell.lat, cell.lng);
            if surface.fill_rect(rect, cell_fill(cell.color)) {
                stats.painted += 1;
            } else {
                stats.offscreen += 1;
            }
        }

        log::debug!(
            "repainted {} cells ({} culled, {} offscreen) at version {}",
            stats.painted,
            stats.culled,
            stats.offscreen,
            snapshot.version()
        );
        self.last_repaint = stats;
        Ok(stats)
    }

    /// Repaint, treating an unready host as "try again on the next trigger"
    fn repaint_when_ready(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        match self.request_repaint(ctx) {
            Ok(_) => Ok(()),
            Err(MapError::ProjectionUnavailable) => {
                log::debug!("projection unavailable, repaint of {} skipped", self.properties.id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl OverlayLayer for PixelCanvasLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    fn on_add(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        if self.state == LayerState::Attached {
            return Err(MapError::Layer(format!("layer {} is already attached", self.properties.id)));
        }

        let size = ctx.host.size();
        self.surface = Some(ctx.panes.attach_surface(&self.properties.pane, self.properties.z_index, size));
        self.cached_size = Some(size);
        ctx.events.subscribe(&self.properties.id, REPAINT_TRIGGERS);
        self.state = LayerState::Attached;
        log::info!("pixel canvas {} attached", self.properties.id);

        self.repaint_when_ready(ctx)
    }

    fn on_remove(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        if let Some(surface) = self.surface.take() {
            ctx.panes.detach_surface(surface);
        }
        ctx.events.unsubscribe_owner(&self.properties.id);
        self.cached_size = None;
        if self.state == LayerState::Attached {
            self.state = LayerState::Detached;
            log::info!("pixel canvas {} detached", self.properties.id);
        }
        Ok(())
    }

    fn on_event(&mut self, event: &MapEvent, ctx: &mut LayerContext<'_>) -> Result<()> {
        match event {
            MapEvent::Resize { size } => {
                if let Some(surface) = self.surface.and_then(|id| ctx.panes.surface_mut(id)) {
                    surface.resize(*size);
                    self.cached_size = Some(*size);
                }
                self.repaint_when_ready(ctx)
            }
            MapEvent::Ready | MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. } | MapEvent::CellsChanged => {
                self.repaint_when_ready(ctx)
            }
            MapEvent::PointerMove { .. } | MapEvent::Click { .. } => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
