//! Rectangle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use crate::geometry::{point_in_rect, rect_from_points};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An axis-aligned rectangle. Extents are kept non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(position: Point, width: f64, height: f64, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            style,
        }
    }

    /// Reshape to the box spanned by two corner points, in any order.
    pub fn set_corners(&mut self, a: Point, b: Point) {
        let r = rect_from_points(a, b);
        self.position = r.origin();
        self.width = r.width();
        self.height = r.height();
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    /// Anywhere inside the box grown by `tolerance` hits, filled or not.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_in_rect(point, self.as_rect().inflate(tolerance, tolerance))
    }

    fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_corners_normalizes() {
        let mut rect = Rectangle::new(Point::ZERO, 0.0, 0.0, ShapeStyle::default());
        rect.set_corners(Point::new(50.0, 40.0), Point::new(10.0, 10.0));
        assert_eq!(rect.position, Point::new(10.0, 10.0));
        assert!((rect.width - 40.0).abs() < f64::EPSILON);
        assert!((rect.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_includes_tolerance_edge() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 10.0, 10.0, ShapeStyle::default());
        assert!(rect.hit_test(Point::new(5.0, 5.0), 6.0));
        assert!(rect.hit_test(Point::new(16.0, 16.0), 6.0));
        assert!(!rect.hit_test(Point::new(16.5, 5.0), 6.0));
    }
}
