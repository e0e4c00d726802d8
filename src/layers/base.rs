use crate::animation::frame::FrameScheduler;
use crate::input::{events::MapEvent, subscriptions::EventBus};
use crate::layers::pane::{PaneManager, SurfaceId};
use crate::store::live::LiveCellStore;
use crate::traits::MapHost;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    PixelCanvas,
    Reticle,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::PixelCanvas => write!(f, "pixel-canvas"),
            LayerType::Reticle => write!(f, "reticle"),
        }
    }
}

/// Lifecycle of an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerState {
    #[default]
    Uninitialized,
    Attached,
    Detached,
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub layer_type: LayerType,
    /// Pane the layer draws into
    pub pane: String,
    pub z_index: i32,
}

impl LayerProperties {
    pub fn new(id: impl Into<String>, layer_type: LayerType, pane: impl Into<String>, z_index: i32) -> Self {
        Self {
            id: id.into(),
            layer_type,
            pane: pane.into(),
            z_index,
        }
    }
}

/// Everything an overlay may touch, lent to it for the duration of a
/// callback.
pub struct LayerContext<'a> {
    pub host: &'a dyn MapHost,
    pub panes: &'a mut PaneManager,
    pub events: &'a mut EventBus,
    pub frames: &'a mut FrameScheduler,
    pub store: &'a LiveCellStore,
}

/// An overlay drawn above the map.
///
/// Callbacks may arrive after [`OverlayLayer::on_remove`] (a queued frame, a
/// late event); implementations must check that their surface still exists
/// and do nothing otherwise.
pub trait OverlayLayer {
    fn properties(&self) -> &LayerProperties;

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn layer_type(&self) -> LayerType {
        self.properties().layer_type
    }

    fn z_index(&self) -> i32 {
        self.properties().z_index
    }

    fn state(&self) -> LayerState;

    /// Surface currently owned by the layer, if attached
    fn surface(&self) -> Option<SurfaceId>;

    /// Attach to the map: acquire a surface and subscribe to events
    fn on_add(&mut self, ctx: &mut LayerContext<'_>) -> Result<()>;

    /// Detach: release the surface and every subscription
    fn on_remove(&mut self, ctx: &mut LayerContext<'_>) -> Result<()>;

    fn on_event(&mut self, event: &MapEvent, ctx: &mut LayerContext<'_>) -> Result<()>;

    /// Called once per display refresh while the layer holds a frame task
    fn on_frame(&mut self, _ctx: &mut LayerContext<'_>) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new("pixels", LayerType::PixelCanvas, "pixel-canvas-pane", 450);
        assert_eq!(props.id, "pixels");
        assert_eq!(props.pane, "pixel-canvas-pane");
        assert_eq!(props.z_index, 450);
        assert_eq!(LayerState::default(), LayerState::Uninitialized);
    }

    #[test]
    fn test_layer_type_display() {
        assert_eq!(LayerType::PixelCanvas.to_string(), "pixel-canvas");
        assert_eq!(LayerType::Reticle.to_string(), "reticle");
    }
}
