//! Per-frame render context.

use kurbo::{Affine, Size};
use peniko::Color;
use sketchpad_core::canvas::Canvas;

/// Grid cell size in world units.
pub const GRID_SIZE: f64 = 50.0;

/// Default grid line color, `rgba(0,0,0,0.06)`.
pub const GRID_COLOR: Color = Color::from_rgba8(0, 0, 0, 15);

/// Default selection outline color, `rgba(59,130,246,0.9)`.
pub const SELECTION_COLOR: Color = Color::from_rgba8(59, 130, 246, 230);

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// Viewport size in CSS pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    pub background_color: Color,
    pub show_grid: bool,
    pub grid_color: Color,
    pub selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a context using the canvas' own background and grid settings.
    pub fn new(canvas: &'a Canvas, viewport_size: Size) -> Self {
        Self {
            canvas,
            viewport_size,
            scale_factor: 1.0,
            background_color: canvas.ui.settings.background.into(),
            show_grid: canvas.ui.settings.show_grid,
            grid_color: GRID_COLOR,
            selection_color: SELECTION_COLOR,
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_grid(mut self, show_grid: bool) -> Self {
        self.show_grid = show_grid;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// CSS pixels to device pixels.
    pub fn screen_transform(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }

    /// World coordinates to device pixels.
    pub fn view_transform(&self) -> Affine {
        self.screen_transform() * self.canvas.camera.transform()
    }

    /// Backing store size in device pixels.
    pub fn pixel_size(&self) -> Size {
        Size::new(
            self.viewport_size.width * self.scale_factor,
            self.viewport_size.height * self.scale_factor,
        )
    }
}
