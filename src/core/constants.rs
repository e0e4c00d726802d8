//! Process-wide constants for the pixel grid and its overlay panes.
//! Keeping them in a single place makes it easier to keep client and
//! placement endpoint in agreement.

/// Angular size of one grid cell, in degrees.
///
/// Must be identical to the step the placement endpoint validates against;
/// a mismatch silently produces offset or duplicate cells.
pub const GRID_STEP_DEG: f64 = 0.0002;

/// Maximum number of cells retained by the live store (newest first).
pub const RETENTION_BOUND: usize = 5000;

/// Pane holding the pixel canvas surface.
pub const PIXEL_PANE_ID: &str = "pixel-canvas-pane";

/// Stacking order of the pixel pane (above tiles, below popups).
pub const PIXEL_PANE_Z_INDEX: i32 = 450;

/// Pane holding the reticle surface, stacked above the pixel canvas.
pub const RETICLE_PANE_ID: &str = "mapix-grid-overlay";

/// Stacking order of the reticle pane.
pub const RETICLE_PANE_Z_INDEX: i32 = 600;

/// Half-extent of the reticle brackets in pixels.
pub const RETICLE_RADIUS_PX: f64 = 10.0;

/// Gap left open in the middle of each reticle edge, in pixels.
pub const RETICLE_GAP_PX: f64 = 4.0;

/// Reticle stroke width in pixels.
pub const RETICLE_LINE_WIDTH: f32 = 2.0;

/// Reticle stroke opacity.
pub const RETICLE_ALPHA: f32 = 0.9;
