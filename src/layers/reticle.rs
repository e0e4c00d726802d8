use crate::animation::frame::FrameTaskId;
use crate::core::{
    config::{MapixConfig, ReticleStyle},
    constants::{RETICLE_PANE_ID, RETICLE_PANE_Z_INDEX},
    geo::{LatLng, Point},
    grid::CellSlot,
};
use crate::input::events::{MapEvent, MapEventKind};
use crate::layers::base::{LayerContext, LayerProperties, LayerState, LayerType, OverlayLayer};
use crate::layers::pane::SurfaceId;
use crate::rendering::{context::StrokeStyle, projector::ViewportProjector};
use crate::{MapError, Result};

const RETICLE_EVENTS: &[MapEventKind] = &[
    MapEventKind::Ready,
    MapEventKind::PointerMove,
    MapEventKind::MoveEnd,
    MapEventKind::ZoomEnd,
    MapEventKind::Resize,
];

/// Corner brackets around `center`: each edge of a `2 * radius` square with
/// a `2 * gap` opening in its middle, as eight segments.
pub fn bracket_segments(center: Point, radius: f64, gap: f64) -> Vec<(Point, Point)> {
    let (x, y) = (center.x, center.y);
    let (r, g) = (radius, gap);
    let p = Point::new;
    vec![
        // top
        (p(x - r, y - r), p(x - g, y - r)),
        (p(x + g, y - r), p(x + r, y - r)),
        // bottom
        (p(x - r, y + r), p(x - g, y + r)),
        (p(x + g, y + r), p(x + r, y + r)),
        // left
        (p(x - r, y - r), p(x - r, y - g)),
        (p(x - r, y + g), p(x - r, y + r)),
        // right
        (p(x + r, y - r), p(x + r, y - g)),
        (p(x + r, y + g), p(x + r, y + r)),
    ]
}

/// Highlights the grid cell under the pointer.
///
/// Redrawn on every display refresh while attached so the brackets follow
/// the map during continuous drags, not only when a gesture settles.
pub struct ReticleLayer {
    properties: LayerProperties,
    state: LayerState,
    surface: Option<SurfaceId>,
    frame_task: Option<FrameTaskId>,
    enabled: bool,
    last_highlighted: Option<CellSlot>,
    style: ReticleStyle,
    highlight_changes: u64,
}

impl ReticleLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Reticle, RETICLE_PANE_ID, RETICLE_PANE_Z_INDEX),
            state: LayerState::Uninitialized,
            surface: None,
            frame_task: None,
            enabled: true,
            last_highlighted: None,
            style: ReticleStyle::default(),
            highlight_changes: 0,
        }
    }

    pub fn from_config(id: impl Into<String>, config: &MapixConfig) -> Self {
        let mut layer = Self::new(id).with_style(config.reticle.clone());
        layer.enabled = config.reticle_enabled;
        layer
    }

    pub fn with_style(mut self, style: ReticleStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Takes effect on the next frame; a disabled reticle keeps tracking the
    /// pointer but draws nothing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn last_highlighted(&self) -> Option<CellSlot> {
        self.last_highlighted
    }

    /// Number of times the highlighted slot actually changed
    pub fn highlight_changes(&self) -> u64 {
        self.highlight_changes
    }

    pub fn frame_task(&self) -> Option<FrameTaskId> {
        self.frame_task
    }

    /// Track the slot under `lat_lng`. Returns `true` if it changed.
    pub fn track_pointer(&mut self, lat_lng: &LatLng) -> bool {
        let slot = CellSlot::containing(lat_lng);
        if self.last_highlighted == Some(slot) {
            return false;
        }
        self.last_highlighted = Some(slot);
        self.highlight_changes += 1;
        true
    }

    fn start_loop(&mut self, ctx: &mut LayerContext<'_>) {
        if self.frame_task.is_none() && self.surface.is_some() {
            self.frame_task = Some(ctx.frames.request(&self.properties.id));
            log::debug!("reticle {} frame loop started", self.properties.id);
        }
    }

    fn draw(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        let Some(surface) = self.surface.and_then(|id| ctx.panes.surface_mut(id)) else {
            return Ok(());
        };
        surface.clear();

        if !self.enabled {
            return Ok(());
        }
        let Some(slot) = self.last_highlighted else {
            return Ok(());
        };
        let projector = match ViewportProjector::new(ctx.host) {
            Ok(projector) => projector,
            Err(MapError::ProjectionUnavailable) => return Ok(()),
            Err(e) => return Err(e),
        };

        let center = slot.center();
        let center = projector.project(center.lat, center.lng);
        surface.stroke_segments(
            bracket_segments(center, self.style.radius, self.style.gap),
            StrokeStyle {
                color: self.style.color,
                width: self.style.line_width,
                alpha: self.style.alpha,
            },
        );
        Ok(())
    }
}

impl OverlayLayer for ReticleLayer {
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
        self.style.validate()?;

        self.surface = Some(ctx.panes.attach_surface(
            &self.properties.pane,
            self.properties.z_index,
            ctx.host.size(),
        ));
        ctx.events.subscribe(&self.properties.id, RETICLE_EVENTS);
        self.state = LayerState::Attached;

        if ctx.host.is_ready() {
            self.start_loop(ctx);
        }
        log::info!("reticle {} attached", self.properties.id);
        Ok(())
    }

    fn on_remove(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        if let Some(task) = self.frame_task.take() {
            log::debug!(
                "reticle {} frame loop stopped after {} frames ({:.1} fps)",
                self.properties.id,
                ctx.frames.frames_delivered(task).unwrap_or_default(),
                ctx.frames.frame_rate(task).unwrap_or_default()
            );
            ctx.frames.cancel(task);
        }
        if let Some(surface) = self.surface.take() {
            ctx.panes.detach_surface(surface);
        }
        ctx.events.unsubscribe_owner(&self.properties.id);
        if self.state == LayerState::Attached {
            self.state = LayerState::Detached;
            log::info!("reticle {} detached", self.properties.id);
        }
        Ok(())
    }

    fn on_event(&mut self, event: &MapEvent, ctx: &mut LayerContext<'_>) -> Result<()> {
        match event {
            MapEvent::PointerMove { lat_lng } => {
                self.track_pointer(lat_lng);
                Ok(())
            }
            MapEvent::Ready => {
                self.start_loop(ctx);
                self.draw(ctx)
            }
            MapEvent::Resize { size } => {
                if let Some(surface) = self.surface.and_then(|id| ctx.panes.surface_mut(id)) {
                    surface.resize(*size);
                }
                self.draw(ctx)
            }
            MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. } => self.draw(ctx),
            MapEvent::Click { .. } | MapEvent::CellsChanged => Ok(()),
        }
    }

    fn on_frame(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        self.draw(ctx)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
