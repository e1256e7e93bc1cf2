//! Immediate-mode raster pipeline.
//!
//! [`RasterContext`] is the small drawing surface the pipeline needs; the
//! browser implements it over `CanvasRenderingContext2d` and tests use the
//! recording context in [`crate::headless`].

use crate::renderer::{GRID_SIZE, RenderContext};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size, Stroke};
use peniko::Color;
use sketchpad_core::camera::Camera;
use sketchpad_core::shapes::Shape;

/// Dash pattern for selection outlines, in world units.
pub const SELECTION_DASHES: [f64; 2] = [6.0, 4.0];

/// Immediate-mode 2D drawing target.
///
/// Every call carries its full transform, so implementations never need to
/// track a transform stack.
pub trait RasterContext {
    /// Reset to the identity transform.
    fn reset_transform(&mut self);

    /// Clear the whole backing store (in device pixels) to transparent.
    fn clear(&mut self, pixel_size: Size);

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath);

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath);

    /// Draw text with its alphabetic baseline starting at `origin`.
    fn fill_text(&mut self, transform: Affine, text: &str, origin: Point, font_size: f64, color: Color);
}

/// A grid line in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub from: Point,
    pub to: Point,
}

/// Grid lines covering the viewport.
///
/// The visible world box comes from the inverse camera transform; the first
/// line on each axis is snapped down to a multiple of [`GRID_SIZE`].
pub fn grid_lines(camera: &Camera, viewport: Size) -> Vec<GridLine> {
    let inv_zoom = 1.0 / camera.zoom;
    let left = -camera.offset.x * inv_zoom;
    let top = -camera.offset.y * inv_zoom;
    let right = left + viewport.width * inv_zoom;
    let bottom = top + viewport.height * inv_zoom;

    let start_x = (left / GRID_SIZE).floor() * GRID_SIZE;
    let start_y = (top / GRID_SIZE).floor() * GRID_SIZE;

    let mut lines = Vec::new();
    let mut x = start_x;
    while x <= right {
        lines.push(GridLine {
            from: Point::new(x, top),
            to: Point::new(x, bottom),
        });
        x += GRID_SIZE;
    }
    let mut y = start_y;
    while y <= bottom {
        lines.push(GridLine {
            from: Point::new(left, y),
            to: Point::new(right, y),
        });
        y += GRID_SIZE;
    }
    lines
}

/// Draw one frame of the document.
pub fn render_raster<R: RasterContext + ?Sized>(raster: &mut R, ctx: &RenderContext) {
    let screen = ctx.screen_transform();
    let view = ctx.view_transform();

    raster.clear(ctx.pixel_size());
    let backdrop = Rect::from_origin_size(Point::ZERO, ctx.viewport_size);
    raster.fill(screen, ctx.background_color, &backdrop.to_path(0.1));

    if ctx.show_grid {
        render_grid(raster, ctx, view);
    }

    let canvas = ctx.canvas;
    for shape in canvas.document.shapes_ordered() {
        render_shape(raster, shape, view);
        if canvas.is_selected(shape.id()) {
            render_selection(raster, shape, view, ctx.selection_color);
        }
    }
}

fn render_grid<R: RasterContext + ?Sized>(raster: &mut R, ctx: &RenderContext, view: Affine) {
    let lines = grid_lines(&ctx.canvas.camera, ctx.viewport_size);
    if lines.is_empty() {
        return;
    }
    let mut path = BezPath::new();
    for line in lines {
        path.move_to(line.from);
        path.line_to(line.to);
    }
    raster.stroke(&Stroke::new(1.0), view, ctx.grid_color, &path);
}

/// Draw a single shape with its own style.
pub fn render_shape<R: RasterContext + ?Sized>(raster: &mut R, shape: &Shape, view: Affine) {
    let style = shape.style();
    let stroke = Stroke::new(style.stroke_width);
    let stroke_color = style.stroke();

    match shape {
        Shape::Pencil(pencil) => {
            if pencil.is_empty() {
                return;
            }
            raster.stroke(&stroke, view, stroke_color, &shape.to_path());
        }
        Shape::Rectangle(_) | Shape::Ellipse(_) => {
            let path = shape.to_path();
            if let Some(fill) = style.fill() {
                raster.fill(view, fill, &path);
            }
            raster.stroke(&stroke, view, stroke_color, &path);
        }
        Shape::Line(_) => {
            raster.stroke(&stroke, view, stroke_color, &shape.to_path());
        }
        Shape::Arrow(arrow) => {
            raster.stroke(&stroke, view, stroke_color, &shape.to_path());
            raster.fill(view, stroke_color, &arrow.head_path());
        }
        Shape::Text(text) => {
            raster.fill_text(view, &text.content, text.position, text.font_size, stroke_color);
        }
    }
}

/// Dashed outline around a shape's bounds.
pub fn render_selection<R: RasterContext + ?Sized>(
    raster: &mut R,
    shape: &Shape,
    view: Affine,
    color: Color,
) {
    let outline = Stroke::new(1.0).with_dashes(0.0, SELECTION_DASHES);
    raster.stroke(&outline, view, color, &shape.bounds().to_path(0.1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DrawCommand, RecordingContext};
    use kurbo::Vec2;
    use sketchpad_core::canvas::Canvas;
    use sketchpad_core::shapes::{Arrow, Pencil, Rectangle, ShapeStyle, Text};

    #[test]
    fn test_grid_lines_snap_to_cells() {
        let camera = Camera {
            offset: Vec2::new(-120.0, 30.0),
            zoom: 1.0,
        };
        let lines = grid_lines(&camera, Size::new(100.0, 100.0));
        // visible x: 120..220, y: -30..70
        let xs: Vec<f64> = lines.iter().filter(|l| l.from.x == l.to.x).map(|l| l.from.x).collect();
        let ys: Vec<f64> = lines.iter().filter(|l| l.from.y == l.to.y).map(|l| l.from.y).collect();
        assert_eq!(xs, vec![100.0, 150.0, 200.0]);
        assert_eq!(ys, vec![-50.0, 0.0, 50.0]);
    }

    #[test]
    fn test_grid_lines_scale_with_zoom() {
        let camera = Camera {
            offset: Vec2::ZERO,
            zoom: 0.5,
        };
        let lines = grid_lines(&camera, Size::new(100.0, 100.0));
        // world 0..200 on both axes, lines at 0, 50, .., 200
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.from.x % GRID_SIZE == 0.0 || l.from.y % GRID_SIZE == 0.0));
    }

    #[test]
    fn test_frame_order() {
        let mut canvas = Canvas::new();
        let rect = Rectangle::new(
            Point::new(0.0, 0.0),
            10.0,
            10.0,
            canvas.ui.settings.shape_style(true),
        );
        let id = canvas.add_shape(Shape::Rectangle(rect)).unwrap();
        canvas.select_only(Some(id));

        let ctx = RenderContext::new(&canvas, Size::new(200.0, 100.0)).with_scale_factor(2.0);
        let mut rec = RecordingContext::new();
        render_raster(&mut rec, &ctx);

        let kinds: Vec<&str> = rec.commands().iter().map(DrawCommand::kind).collect();
        // clear, background, grid, rect fill, rect stroke, selection
        assert_eq!(kinds, vec!["clear", "fill", "stroke", "fill", "stroke", "stroke"]);
        assert!(matches!(
            rec.commands()[0],
            DrawCommand::Clear { pixel_size } if pixel_size == Size::new(400.0, 200.0)
        ));
        let DrawCommand::Stroke { dashes, width, .. } = &rec.commands()[5] else {
            panic!("expected selection stroke");
        };
        assert_eq!(dashes.as_slice(), &SELECTION_DASHES);
        assert!((width - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grid_hidden() {
        let mut canvas = Canvas::new();
        canvas.ui.settings.show_grid = false;
        let ctx = RenderContext::new(&canvas, Size::new(200.0, 100.0));
        let mut rec = RecordingContext::new();
        render_raster(&mut rec, &ctx);
        assert_eq!(rec.commands().len(), 2);
    }

    #[test]
    fn test_shape_specific_draws() {
        let style = ShapeStyle::default();
        let mut rec = RecordingContext::new();

        render_shape(
            &mut rec,
            &Shape::Pencil(Pencil::from_points(Vec::new(), style.clone())),
            Affine::IDENTITY,
        );
        assert!(rec.commands().is_empty());

        render_shape(
            &mut rec,
            &Shape::Arrow(Arrow::new(Point::ZERO, Point::new(50.0, 0.0), style.clone())),
            Affine::IDENTITY,
        );
        let kinds: Vec<&str> = rec.commands().iter().map(DrawCommand::kind).collect();
        assert_eq!(kinds, vec!["stroke", "fill"]);

        rec.clear_commands();
        render_shape(
            &mut rec,
            &Shape::Text(Text::new(Point::new(5.0, 30.0), "Hi", 18.0, style)),
            Affine::IDENTITY,
        );
        let [DrawCommand::Text { text, font_size, .. }] = rec.commands() else {
            panic!("expected one text command");
        };
        assert_eq!(text, "Hi");
        assert!((font_size - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unfilled_rectangle_only_strokes() {
        let mut rec = RecordingContext::new();
        let rect = Rectangle::new(Point::ZERO, 5.0, 5.0, ShapeStyle::default());
        render_shape(&mut rec, &Shape::Rectangle(rect), Affine::IDENTITY);
        let kinds: Vec<&str> = rec.commands().iter().map(DrawCommand::kind).collect();
        assert_eq!(kinds, vec!["stroke"]);
    }
}
