use crate::core::{bounds::Bounds, geo::Point};
use crate::rendering::color::Rgba;

/// Stroke parameters for line work
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
    pub alpha: f32,
}

/// Commands retained by a drawing surface until the next clear
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        bounds: Bounds,
        color: Rgba,
    },
    StrokeSegments {
        segments: Vec<(Point, Point)>,
        style: StrokeStyle,
    },
}

/// Retained-mode drawing surface backing one overlay.
///
/// The queue is the surface content: hosts rasterize it (canvas 2D, egui
/// painter, wgpu, ...) after each repaint. Resizing reallocates the backing
/// buffer, which discards everything drawn so far.
#[derive(Debug, Clone)]
pub struct RenderContext {
    width: u32,
    height: u32,
    drawing_queue: Vec<DrawCommand>,
    clear_count: u64,
}

impl RenderContext {
    /// Create a new surface of the given pixel size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
            clear_count: 0,
        }
    }

    /// Sized to a container, rounding fractional pixels up
    pub fn sized_to(size: Point) -> Self {
        let (width, height) = pixel_size(size);
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Surface extent in pixel space
    pub fn bounds(&self) -> Bounds {
        Bounds::from_coords(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// Reallocates the backing buffer; existing content is dropped
    pub fn resize(&mut self, size: Point) {
        let (width, height) = pixel_size(size);
        self.width = width;
        self.height = height;
        self.drawing_queue.clear();
    }

    /// Erase the whole surface
    pub fn clear(&mut self) {
        self.drawing_queue.clear();
        self.clear_count += 1;
    }

    /// Number of clears since creation
    pub fn clear_count(&self) -> u64 {
        self.clear_count
    }

    /// Fill a rectangle. Returns `false` if it lies entirely off-surface
    /// and was not recorded.
    pub fn fill_rect(&mut self, bounds: Bounds, color: Rgba) -> bool {
        if !bounds.is_valid() || !self.bounds().intersects(&bounds) {
            return false;
        }
        self.drawing_queue.push(DrawCommand::FillRect { bounds, color });
        true
    }

    /// Stroke a set of independent line segments in one path
    pub fn stroke_segments(&mut self, segments: Vec<(Point, Point)>, style: StrokeStyle) {
        if segments.is_empty() {
            return;
        }
        self.drawing_queue
            .push(DrawCommand::StrokeSegments { segments, style });
    }

    /// Get the current drawing queue
    pub fn commands(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    pub fn is_blank(&self) -> bool {
        self.drawing_queue.is_empty()
    }
}

fn pixel_size(size: Point) -> (u32, u32) {
    (size.x.max(0.0).ceil() as u32, size.y.max(0.0).ceil() as u32)
}
