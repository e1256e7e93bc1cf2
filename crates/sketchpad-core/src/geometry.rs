//! Pure geometry helpers: coordinate transforms, boxes and hit testing.

use crate::camera::Camera;
use crate::canvas::CanvasDocument;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};

/// Default hit slack in world units.
pub const HIT_TOLERANCE: f64 = 6.0;

pub use crate::shapes::point_to_segment_dist as distance_point_to_segment;

/// `(p - offset) / zoom`.
pub fn screen_to_world(p: Point, camera: &Camera) -> Point {
    camera.screen_to_world(p)
}

/// `p * zoom + offset`.
pub fn world_to_screen(p: Point, camera: &Camera) -> Point {
    camera.world_to_screen(p)
}

/// Euclidean distance.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Box spanned by two points, independent of their order.
pub fn rect_from_points(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Closed containment: points on any edge are inside.
pub fn point_in_rect(p: Point, r: Rect) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

pub fn hit_test_shape(shape: &Shape, p: Point, tolerance: f64) -> bool {
    shape.hit_test(p, tolerance)
}

/// Topmost shape under `p`, scanning the paint order from the front.
pub fn hit_test_top(doc: &CanvasDocument, p: Point) -> Option<ShapeId> {
    doc.z_order.iter().rev().copied().find(|id| {
        doc.shapes
            .get(id)
            .is_some_and(|shape| hit_test_shape(shape, p, HIT_TOLERANCE))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Line, Rectangle, ShapeStyle, ShapeTrait};
    use kurbo::Vec2;

    #[test]
    fn test_rect_from_points_symmetric() {
        let pairs = [
            (Point::new(0.0, 0.0), Point::new(10.0, 20.0)),
            (Point::new(-5.0, 7.0), Point::new(3.0, -9.0)),
            (Point::new(4.0, 4.0), Point::new(4.0, 4.0)),
        ];
        for (a, b) in pairs {
            let r1 = rect_from_points(a, b);
            let r2 = rect_from_points(b, a);
            assert_eq!(r1, r2);
            assert!(r1.width() >= 0.0);
            assert!(r1.height() >= 0.0);
        }
    }

    #[test]
    fn test_point_in_rect_is_closed() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_rect(Point::new(0.0, 0.0), r));
        assert!(point_in_rect(Point::new(10.0, 10.0), r));
        assert!(!point_in_rect(Point::new(10.000_1, 5.0), r));
    }

    #[test]
    fn test_distance() {
        assert!((distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_functions_invert() {
        let camera = Camera { offset: Vec2::new(12.0, -8.0), zoom: 2.5 };
        let p = Point::new(77.0, 31.0);
        let back = world_to_screen(screen_to_world(p, &camera), &camera);
        assert!((back - p).hypot() < 1e-9);
    }

    #[test]
    fn test_hit_test_top_prefers_last_painted() {
        let mut doc = CanvasDocument::new();
        let below = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0, ShapeStyle::default());
        let above = Ellipse::new(Point::new(25.0, 25.0), 50.0, 50.0, ShapeStyle::default());
        let below_id = below.id();
        let above_id = above.id();
        doc.add_shape(Shape::Rectangle(below)).unwrap();
        doc.add_shape(Shape::Ellipse(above)).unwrap();

        assert_eq!(hit_test_top(&doc, Point::new(50.0, 50.0)), Some(above_id));
        assert_eq!(hit_test_top(&doc, Point::new(5.0, 5.0)), Some(below_id));
        assert_eq!(hit_test_top(&doc, Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_hit_test_top_after_reinsertion() {
        let mut doc = CanvasDocument::new();
        let a = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), ShapeStyle::default());
        let b = Line::new(Point::new(0.0, 2.0), Point::new(100.0, 2.0), ShapeStyle::default());
        let a_id = a.id();
        let b_id = b.id();
        doc.add_shape(Shape::Line(a.clone())).unwrap();
        doc.add_shape(Shape::Line(b)).unwrap();
        assert_eq!(hit_test_top(&doc, Point::new(50.0, 1.0)), Some(b_id));

        doc.remove_shape(a_id);
        doc.add_shape(Shape::Line(a)).unwrap();
        assert_eq!(hit_test_top(&doc, Point::new(50.0, 1.0)), Some(a_id));
    }
}
