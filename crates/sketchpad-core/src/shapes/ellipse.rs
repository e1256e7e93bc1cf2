//! Ellipse shape, described by its bounding box.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use crate::geometry::rect_from_points;
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse inscribed in the box at `position` with the given extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// Top-left corner of the bounding box.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl Ellipse {
    pub fn new(position: Point, width: f64, height: f64, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            style,
        }
    }

    pub fn set_corners(&mut self, a: Point, b: Point) {
        let r = rect_from_points(a, b);
        self.position = r.origin();
        self.width = r.width();
        self.height = r.height();
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Semi-axes, each floored at 1.
    pub fn radii(&self) -> (f64, f64) {
        (
            (self.width.abs() / 2.0).max(1.0),
            (self.height.abs() / 2.0).max(1.0),
        )
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    /// Tolerance is applied in normalized radius units (`tolerance / 100`),
    /// so it does not scale with the ellipse the way the rectangle slack does.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let c = self.center();
        let (rx, ry) = self.radii();
        let nx = (point.x - c.x) / rx;
        let ny = (point.y - c.y) / ry;
        nx * nx + ny * ny <= 1.0 + tolerance / 100.0
    }

    fn to_path(&self) -> BezPath {
        let radii = (self.width.abs() / 2.0, self.height.abs() / 2.0);
        KurboEllipse::new(self.center(), radii, 0.0).to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}
