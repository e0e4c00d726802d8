pub mod color;
pub mod context;
pub mod projector;

// Re-export main types
pub use color::{cell_fill, Hsl, Rgba};
pub use context::{DrawCommand, RenderContext, StrokeStyle};
pub use projector::ViewportProjector;
