pub mod base;
pub mod manager;
pub mod pane;
pub mod pixels;
pub mod reticle;

pub use base::{LayerContext, LayerProperties, LayerState, LayerType, OverlayLayer};
pub use manager::LayerManager;
pub use pane::{Pane, PaneManager, SurfaceId};
pub use pixels::{PixelCanvasLayer, RepaintStats};
pub use reticle::ReticleLayer;
