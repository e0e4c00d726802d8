use crate::core::geo::Point;
use crate::prelude::HashMap;
use crate::rendering::context::RenderContext;

/// Handle to a drawing surface owned by one overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

/// A stacking level on the map. Surfaces inside a pane share its z-index.
#[derive(Debug, Clone)]
pub struct Pane {
    pub id: String,
    pub z_index: i32,
    /// Whether the pane intercepts pointer input; overlays leave this off so
    /// map interaction passes through
    pub pointer_events: bool,
    surfaces: Vec<SurfaceId>,
}

impl Pane {
    pub fn surfaces(&self) -> &[SurfaceId] {
        &self.surfaces
    }
}

/// Stacked panes and the drawing surfaces attached to them.
///
/// Panes are created on first use and kept for the session, so a layer that
/// is detached and attached again reuses its pane. Surfaces are owned by
/// exactly one overlay and are dropped when it detaches.
#[derive(Debug, Default)]
pub struct PaneManager {
    panes: HashMap<String, Pane>,
    surfaces: HashMap<SurfaceId, RenderContext>,
    next_surface: u64,
}

impl PaneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pane with `id`, creating it at `z_index` if it does not
    /// exist. An existing pane keeps its original stacking.
    pub fn get_or_create_pane(&mut self, id: &str, z_index: i32) -> &mut Pane {
        self.panes.entry(id.to_string()).or_insert_with(|| {
            log::debug!("creating pane {} at z-index {}", id, z_index);
            Pane {
                id: id.to_string(),
                z_index,
                pointer_events: false,
                surfaces: Vec::new(),
            }
        })
    }

    pub fn pane(&self, id: &str) -> Option<&Pane> {
        self.panes.get(id)
    }

    /// Create a surface of `size` inside `pane_id`
    pub fn attach_surface(&mut self, pane_id: &str, z_index: i32, size: Point) -> SurfaceId {
        self.next_surface += 1;
        let surface = SurfaceId(self.next_surface);
        self.get_or_create_pane(pane_id, z_index).surfaces.push(surface);
        self.surfaces.insert(surface, RenderContext::sized_to(size));
        surface
    }

    /// Release a surface. Returns `false` if it was already gone.
    pub fn detach_surface(&mut self, surface: SurfaceId) -> bool {
        for pane in self.panes.values_mut() {
            pane.surfaces.retain(|s| *s != surface);
        }
        self.surfaces.remove(&surface).is_some()
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&RenderContext> {
        self.surfaces.get(&surface)
    }

    pub fn surface_mut(&mut self, surface: SurfaceId) -> Option<&mut RenderContext> {
        self.surfaces.get_mut(&surface)
    }

    /// Surfaces bottom to top, the order a host composites them in
    pub fn render_order(&self) -> Vec<(&Pane, &RenderContext)> {
        let mut panes: Vec<&Pane> = self.panes.values().collect();
        panes.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));

        let surfaces = &self.surfaces;
        panes
            .into_iter()
            .flat_map(move |pane| {
                pane.surfaces
                    .iter()
                    .filter_map(move |id| surfaces.get(id))
                    .map(move |ctx| (pane, ctx))
            })
            .collect()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }
}
