//! Single-line text label.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use crate::geometry::point_in_rect;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_RATIO: f64 = 0.6;
/// Line box height as a multiple of the font size.
const LINE_HEIGHT_RATIO: f64 = 1.2;

/// A text label anchored at its alphabetic baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Baseline start position.
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub style: ShapeStyle,
}

impl Text {
    pub fn new(position: Point, content: impl Into<String>, font_size: f64, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content: content.into(),
            font_size,
            style,
        }
    }

    /// Approximate layout box; no font metrics are consulted.
    pub fn layout_box(&self) -> Rect {
        let chars = self.content.chars().count() as f64;
        Rect::from_origin_size(
            (self.position.x, self.position.y - self.font_size),
            (chars * self.font_size * CHAR_WIDTH_RATIO, self.font_size * LINE_HEIGHT_RATIO),
        )
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.layout_box()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_in_rect(point, self.layout_box().inflate(tolerance, tolerance))
    }

    fn to_path(&self) -> BezPath {
        self.layout_box().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}
