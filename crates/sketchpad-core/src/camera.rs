//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest zoom reachable through [`Camera::zoom_at`].
pub const MIN_ZOOM: f64 = 0.2;
/// Largest zoom reachable through [`Camera::zoom_at`].
pub const MAX_ZOOM: f64 = 4.0;

/// Camera manages the view transform for the canvas.
///
/// `screen = world * zoom + offset`. The zoom range is only enforced by the
/// zooming operations; assigning the field directly bypasses the clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen-space translation (pan).
    pub offset: Vec2,
    /// Scale factor from world to screen units.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Create a new camera at the origin with zoom 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Affine transform from world to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Affine transform from screen to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.offset.x) / self.zoom,
            (screen_point.y - self.offset.y) / self.zoom,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            world_point.x * self.zoom + self.offset.x,
            world_point.y * self.zoom + self.offset.y,
        )
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    ///
    /// The resulting zoom is clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`]; the
    /// offset is scaled by the ratio actually applied.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let prev = self.zoom;
        let next = (prev * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let scale = next / prev;
        self.offset = Vec2::new(
            screen_point.x - (screen_point.x - self.offset.x) * scale,
            screen_point.y - (screen_point.y - self.offset.y) * scale,
        );
        self.zoom = next;
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
