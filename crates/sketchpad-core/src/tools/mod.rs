//! Tool system for the whiteboard.
//!
//! A [`ToolSession`] turns pointer and wheel input into document mutations.
//! It never touches the document directly; everything goes through
//! [`WhiteboardActions`], which [`Canvas`] implements.

use crate::camera::Camera;
use crate::canvas::{Canvas, CanvasDocument, CanvasResult, UiSettings};
use crate::geometry::hit_test_top;
use crate::input::{Modifiers, WheelEvent};
use crate::shapes::{Arrow, Ellipse, Line, Pencil, Rectangle, Shape, ShapeId, ShapeStyle, Text};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Zoom factor for a zoom-tool click (inverted with Shift held).
pub const CLICK_ZOOM_IN: f64 = 1.1;
pub const CLICK_ZOOM_OUT: f64 = 0.9;
/// Zoom factor per ctrl+wheel notch.
pub const WHEEL_ZOOM_IN: f64 = 1.08;
pub const WHEEL_ZOOM_OUT: f64 = 0.92;
/// Content of a freshly placed text label.
pub const PLACEHOLDER_TEXT: &str = "Text";

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Pencil,
    Line,
    Rectangle,
    Ellipse,
    Arrow,
    Text,
    Eraser,
    Zoom,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Pencil,
        ToolKind::Line,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Arrow,
        ToolKind::Text,
        ToolKind::Eraser,
        ToolKind::Zoom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Pencil => "pencil",
            ToolKind::Line => "line",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Arrow => "arrow",
            ToolKind::Text => "text",
            ToolKind::Eraser => "eraser",
            ToolKind::Zoom => "zoom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

/// Everything a tool session may read or change.
pub trait WhiteboardActions {
    fn camera(&self) -> &Camera;
    fn document(&self) -> &CanvasDocument;
    fn tool(&self) -> ToolKind;
    fn settings(&self) -> &UiSettings;

    fn add_shape(&mut self, shape: Shape) -> CanvasResult<ShapeId>;
    fn remove_shape(&mut self, id: ShapeId);
    fn select_only(&mut self, id: Option<ShapeId>);
    fn clear_selection(&mut self);
    fn pan_by(&mut self, dx: f64, dy: f64);
    fn zoom_at(&mut self, screen: Point, factor: f64);
    fn update_rect(&mut self, id: ShapeId, a: Point, b: Point);
    fn update_line_like(&mut self, id: ShapeId, a: Point, b: Point);
    fn append_point(&mut self, id: ShapeId, p: Point);
}

impl WhiteboardActions for Canvas {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn document(&self) -> &CanvasDocument {
        &self.document
    }

    fn tool(&self) -> ToolKind {
        self.ui.tool
    }

    fn settings(&self) -> &UiSettings {
        &self.ui.settings
    }

    fn add_shape(&mut self, shape: Shape) -> CanvasResult<ShapeId> {
        Canvas::add_shape(self, shape)
    }

    fn remove_shape(&mut self, id: ShapeId) {
        Canvas::remove_shape(self, id);
    }

    fn select_only(&mut self, id: Option<ShapeId>) {
        Canvas::select_only(self, id);
    }

    fn clear_selection(&mut self) {
        Canvas::clear_selection(self);
    }

    fn pan_by(&mut self, dx: f64, dy: f64) {
        Canvas::pan_by(self, dx, dy);
    }

    fn zoom_at(&mut self, screen: Point, factor: f64) {
        Canvas::zoom_at(self, screen, factor);
    }

    fn update_rect(&mut self, id: ShapeId, a: Point, b: Point) {
        Canvas::update_rect(self, id, a, b);
    }

    fn update_line_like(&mut self, id: ShapeId, a: Point, b: Point) {
        Canvas::update_line_like(self, id, a, b);
    }

    fn append_point(&mut self, id: ShapeId, p: Point) {
        Canvas::append_point(self, id, p);
    }
}

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Dragging,
}

/// Ephemeral state for one pointer-down to pointer-up interaction.
#[derive(Debug, Clone, Default)]
pub struct ToolSession {
    pub phase: SessionPhase,
    pub start_screen: Point,
    pub start_world: Point,
    pub last_screen: Point,
    /// Shape created by this drag, if any.
    pub active_shape: Option<ShapeId>,
}

impl ToolSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Dragging
    }

    /// Pointer down at `screen`.
    pub fn begin<A: WhiteboardActions + ?Sized>(
        &mut self,
        actions: &mut A,
        screen: Point,
        modifiers: Modifiers,
    ) {
        let world = actions.camera().screen_to_world(screen);
        self.phase = SessionPhase::Dragging;
        self.start_screen = screen;
        self.last_screen = screen;
        self.start_world = world;
        self.active_shape = None;

        let tool = actions.tool();
        match tool {
            ToolKind::Pan => {}
            ToolKind::Zoom => {
                let factor = if modifiers.shift { CLICK_ZOOM_OUT } else { CLICK_ZOOM_IN };
                actions.zoom_at(screen, factor);
                self.phase = SessionPhase::Idle;
            }
            ToolKind::Select => {
                let hit = hit_test_top(actions.document(), world);
                actions.select_only(hit);
            }
            ToolKind::Eraser => {
                if let Some(id) = hit_test_top(actions.document(), world) {
                    actions.remove_shape(id);
                }
                self.phase = SessionPhase::Idle;
            }
            ToolKind::Text => {
                let settings = actions.settings();
                let style = ShapeStyle::new(settings.stroke, 1.0, None);
                let text = Text::new(world, PLACEHOLDER_TEXT, settings.font_size, style);
                if let Some(id) = self.insert(actions, Shape::Text(text)) {
                    actions.select_only(Some(id));
                }
                self.phase = SessionPhase::Idle;
            }
            ToolKind::Pencil
            | ToolKind::Line
            | ToolKind::Arrow
            | ToolKind::Rectangle
            | ToolKind::Ellipse => {
                let shape = new_shape(tool, world, actions.settings());
                if let Some(shape) = shape {
                    self.active_shape = self.insert(actions, shape);
                    actions.clear_selection();
                }
            }
        }
    }

    /// Pointer move to `screen`. Ignored unless dragging.
    pub fn update<A: WhiteboardActions + ?Sized>(&mut self, actions: &mut A, screen: Point) {
        if !self.is_active() {
            return;
        }
        let world = actions.camera().screen_to_world(screen);
        match (actions.tool(), self.active_shape) {
            (ToolKind::Pan, _) => {
                let delta = screen - self.last_screen;
                actions.pan_by(delta.x, delta.y);
            }
            (ToolKind::Pencil, Some(id)) => actions.append_point(id, world),
            (ToolKind::Line | ToolKind::Arrow, Some(id)) => {
                actions.update_line_like(id, self.start_world, world)
            }
            (ToolKind::Rectangle | ToolKind::Ellipse, Some(id)) => {
                actions.update_rect(id, self.start_world, world)
            }
            _ => {}
        }
        self.last_screen = screen;
    }

    /// Pointer up. Always returns to idle.
    pub fn end(&mut self) {
        *self = Self::default();
    }

    /// Pointer cancel. Same as [`ToolSession::end`].
    pub fn cancel(&mut self) {
        self.end();
    }

    /// Wheel input, handled in any phase.
    pub fn wheel<A: WhiteboardActions + ?Sized>(&mut self, actions: &mut A, event: WheelEvent) {
        if event.modifiers.ctrl {
            let factor = if event.delta.y < 0.0 { WHEEL_ZOOM_IN } else { WHEEL_ZOOM_OUT };
            actions.zoom_at(event.position, factor);
        } else {
            actions.pan_by(-event.delta.x, -event.delta.y);
        }
    }

    fn insert<A: WhiteboardActions + ?Sized>(&mut self, actions: &mut A, shape: Shape) -> Option<ShapeId> {
        match actions.add_shape(shape) {
            Ok(id) => Some(id),
            Err(err) => {
                log::warn!("Dropping new shape: {err}");
                self.phase = SessionPhase::Idle;
                None
            }
        }
    }
}

/// Zero-extent shape for a creation tool, styled from the current settings.
fn new_shape(tool: ToolKind, at: Point, settings: &UiSettings) -> Option<Shape> {
    let shape = match tool {
        ToolKind::Pencil => Shape::Pencil(Pencil::new(at, settings.shape_style(false))),
        ToolKind::Line => Shape::Line(Line::new(at, at, settings.shape_style(false))),
        ToolKind::Arrow => Shape::Arrow(Arrow::new(at, at, settings.shape_style(false))),
        ToolKind::Rectangle => {
            Shape::Rectangle(Rectangle::new(at, 0.0, 0.0, settings.shape_style(true)))
        }
        ToolKind::Ellipse => Shape::Ellipse(Ellipse::new(at, 0.0, 0.0, settings.shape_style(true))),
        _ => return None,
    };
    Some(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeTrait;
    use kurbo::{Rect, Vec2};

    fn canvas_with(tool: ToolKind) -> Canvas {
        let mut canvas = Canvas::new();
        canvas.set_tool(tool);
        canvas
    }

    fn drag(canvas: &mut Canvas, session: &mut ToolSession, from: Point, to: Point) {
        session.begin(canvas, from, Modifiers::default());
        session.update(canvas, to);
        session.end();
    }

    #[test]
    fn test_tool_names() {
        for tool in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ToolKind::from_name("lasso"), None);
    }

    #[test]
    fn test_rectangle_drag() {
        let mut canvas = canvas_with(ToolKind::Rectangle);
        let mut session = ToolSession::new();
        drag(&mut canvas, &mut session, Point::new(10.0, 10.0), Point::new(50.0, 40.0));

        assert_eq!(canvas.document.len(), 1);
        let Some(Shape::Rectangle(rect)) = canvas.document.shapes_ordered().next() else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.as_rect(), Rect::new(10.0, 10.0, 50.0, 40.0));
        assert_eq!(rect.style.fill_color, canvas.ui.settings.fill);
        assert!(!session.is_active());
    }

    #[test]
    fn test_drag_up_left_normalizes() {
        let mut canvas = canvas_with(ToolKind::Ellipse);
        let mut session = ToolSession::new();
        drag(&mut canvas, &mut session, Point::new(50.0, 40.0), Point::new(10.0, 10.0));
        let shape = canvas.document.shapes_ordered().next().unwrap();
        assert_eq!(shape.bounds(), Rect::new(10.0, 10.0, 50.0, 40.0));
    }

    #[test]
    fn test_line_and_arrow_have_no_fill() {
        for tool in [ToolKind::Line, ToolKind::Arrow, ToolKind::Pencil] {
            let mut canvas = canvas_with(tool);
            let mut session = ToolSession::new();
            drag(&mut canvas, &mut session, Point::new(0.0, 0.0), Point::new(30.0, 0.0));
            let shape = canvas.document.shapes_ordered().next().unwrap();
            assert_eq!(shape.style().fill_color, None);
            assert!(shape.hit_test(Point::new(15.0, 0.0), 1.0));
        }
    }

    #[test]
    fn test_pencil_collects_world_points() {
        let mut canvas = canvas_with(ToolKind::Pencil);
        canvas.camera.zoom = 2.0;
        let mut session = ToolSession::new();
        session.begin(&mut canvas, Point::new(0.0, 0.0), Modifiers::default());
        session.update(&mut canvas, Point::new(10.0, 0.0));
        session.update(&mut canvas, Point::new(20.0, 10.0));
        session.end();
        session.update(&mut canvas, Point::new(90.0, 90.0));

        let Some(Shape::Pencil(pencil)) = canvas.document.shapes_ordered().next() else {
            panic!("expected a pencil stroke");
        };
        assert_eq!(
            pencil.points,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 5.0)]
        );
    }

    #[test]
    fn test_creation_clears_selection() {
        let mut canvas = canvas_with(ToolKind::Select);
        let id = canvas
            .add_shape(Shape::Rectangle(Rectangle::new(Point::ZERO, 5.0, 5.0, ShapeStyle::default())))
            .unwrap();
        canvas.select_only(Some(id));
        canvas.ui.tool = ToolKind::Line;
        let mut session = ToolSession::new();
        session.begin(&mut canvas, Point::new(100.0, 100.0), Modifiers::default());
        assert!(canvas.ui.selection.is_empty());
        assert!(session.active_shape.is_some());
    }

    #[test]
    fn test_select_hits_or_clears() {
        let mut canvas = canvas_with(ToolKind::Select);
        let id = canvas
            .add_shape(Shape::Rectangle(Rectangle::new(Point::ZERO, 20.0, 20.0, ShapeStyle::default())))
            .unwrap();
        let mut session = ToolSession::new();
        session.begin(&mut canvas, Point::new(10.0, 10.0), Modifiers::default());
        assert!(canvas.is_selected(id));
        assert!(session.is_active());
        session.end();

        session.begin(&mut canvas, Point::new(300.0, 300.0), Modifiers::default());
        assert!(canvas.ui.selection.is_empty());
    }

    #[test]
    fn test_eraser_hit_and_miss() {
        let mut canvas = canvas_with(ToolKind::Eraser);
        let id = canvas
            .add_shape(Shape::Rectangle(Rectangle::new(Point::ZERO, 20.0, 20.0, ShapeStyle::default())))
            .unwrap();
        canvas.ui.selection.insert(id);
        let mut session = ToolSession::new();

        session.begin(&mut canvas, Point::new(200.0, 200.0), Modifiers::default());
        assert_eq!(canvas.document.len(), 1);
        assert!(!session.is_active());

        session.begin(&mut canvas, Point::new(10.0, 10.0), Modifiers::default());
        assert!(canvas.document.is_empty());
        assert!(canvas.document.z_order.is_empty());
        assert!(canvas.ui.selection.is_empty());
        assert!(!session.is_active());
    }

    #[test]
    fn test_text_placement() {
        let mut canvas = canvas_with(ToolKind::Text);
        let mut session = ToolSession::new();
        session.begin(&mut canvas, Point::new(40.0, 60.0), Modifiers::default());
        assert!(!session.is_active());

        let Some(Shape::Text(text)) = canvas.document.shapes_ordered().next() else {
            panic!("expected text");
        };
        assert_eq!(text.content, PLACEHOLDER_TEXT);
        assert_eq!(text.position, Point::new(40.0, 60.0));
        assert!((text.font_size - 24.0).abs() < f64::EPSILON);
        assert!((text.style.stroke_width - 1.0).abs() < f64::EPSILON);
        assert!(canvas.is_selected(text.id()));
    }

    #[test]
    fn test_zoom_tool() {
        let mut canvas = canvas_with(ToolKind::Zoom);
        let mut session = ToolSession::new();
        session.begin(&mut canvas, Point::new(0.0, 0.0), Modifiers::default());
        assert!((canvas.camera.zoom - 1.1).abs() < 1e-9);
        assert!(!session.is_active());

        let shift = Modifiers { shift: true, ..Default::default() };
        session.begin(&mut canvas, Point::new(0.0, 0.0), shift);
        assert!((canvas.camera.zoom - 1.1 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_pan_tool_uses_incremental_delta() {
        let mut canvas = canvas_with(ToolKind::Pan);
        let mut session = ToolSession::new();
        session.begin(&mut canvas, Point::new(10.0, 10.0), Modifiers::default());
        session.update(&mut canvas, Point::new(15.0, 12.0));
        session.update(&mut canvas, Point::new(20.0, 20.0));
        session.cancel();
        assert_eq!(canvas.camera.offset, Vec2::new(10.0, 10.0));
        assert!(canvas.document.is_empty());
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut session = ToolSession::new();
        session.end();
        session.cancel();
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(session.active_shape.is_none());
    }

    #[test]
    fn test_wheel() {
        let mut canvas = Canvas::new();
        let mut session = ToolSession::new();
        session.wheel(&mut canvas, WheelEvent {
            position: Point::ZERO,
            delta: Vec2::new(4.0, 10.0),
            modifiers: Modifiers::default(),
        });
        assert_eq!(canvas.camera.offset, Vec2::new(-4.0, -10.0));

        let ctrl = Modifiers { ctrl: true, ..Default::default() };
        session.wheel(&mut canvas, WheelEvent { position: Point::ZERO, delta: Vec2::new(0.0, -1.0), modifiers: ctrl });
        assert!((canvas.camera.zoom - 1.08).abs() < 1e-9);
        session.wheel(&mut canvas, WheelEvent { position: Point::ZERO, delta: Vec2::new(0.0, 1.0), modifiers: ctrl });
        assert!((canvas.camera.zoom - 1.08 * 0.92).abs() < 1e-9);
    }
}
