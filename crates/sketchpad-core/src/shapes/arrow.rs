//! Arrow shape: a line with a filled head at its end point.

use super::{ShapeId, ShapeStyle, ShapeTrait, point_to_segment_dist};
use crate::geometry::rect_from_points;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_6;
use uuid::Uuid;

/// Length of the arrow head sides in world units.
pub const ARROW_HEAD_SIZE: f64 = 10.0;

/// An arrow from `start` to `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    pub style: ShapeStyle,
}

impl Arrow {
    pub fn new(start: Point, end: Point, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            style,
        }
    }

    /// Closed triangle at `end`, with sides at +/-30 degrees from the shaft.
    pub fn head_path(&self) -> BezPath {
        let angle = (self.end.y - self.start.y).atan2(self.end.x - self.start.x);
        let side = |a: f64| self.end - Vec2::from_angle(a) * ARROW_HEAD_SIZE;

        let mut path = BezPath::new();
        path.move_to(self.end);
        path.line_to(side(angle - FRAC_PI_6));
        path.line_to(side(angle + FRAC_PI_6));
        path.close_path();
        path
    }
}

impl ShapeTrait for Arrow {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        rect_from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end) <= tolerance
    }

    /// The shaft only; the head comes from [`Arrow::head_path`].
    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}
