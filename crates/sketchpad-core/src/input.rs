//! Platform-neutral input events and routing.

use crate::canvas::Canvas;
use crate::tools::ToolSession;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button that triggered a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Primary,
    Middle,
    Secondary,
    Other(i16),
}

impl MouseButton {
    /// Map a DOM `button` code.
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => MouseButton::Primary,
            1 => MouseButton::Middle,
            2 => MouseButton::Secondary,
            other => MouseButton::Other(other),
        }
    }
}

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A pointer event in surface-relative screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: MouseButton,
    pub pointer_id: i32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Primary,
            pointer_id: 1,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// A wheel event; `delta` is in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub position: Point,
    pub delta: Vec2,
    pub modifiers: Modifiers,
}

/// Where a pointer-down ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Middle-button panning took the event.
    MiddlePan,
    /// The tool session handled it.
    Session,
}

/// Sits above the tool session and owns middle-button panning.
///
/// While a middle-button drag is live, moves pan the camera and never reach
/// the session, whatever the active tool.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    middle_pan: Option<Point>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_middle_panning(&self) -> bool {
        self.middle_pan.is_some()
    }

    pub fn pointer_down(
        &mut self,
        canvas: &mut Canvas,
        session: &mut ToolSession,
        event: &PointerEvent,
    ) -> Routed {
        if event.button == MouseButton::Middle {
            self.middle_pan = Some(event.position);
            return Routed::MiddlePan;
        }
        session.begin(canvas, event.position, event.modifiers);
        Routed::Session
    }

    pub fn pointer_move(&mut self, canvas: &mut Canvas, session: &mut ToolSession, event: &PointerEvent) {
        if let Some(prev) = self.middle_pan.as_mut() {
            let delta = event.position - *prev;
            *prev = event.position;
            canvas.pan_by(delta.x, delta.y);
            return;
        }
        session.update(canvas, event.position);
    }

    /// Pointer up or cancel.
    pub fn pointer_up(&mut self, session: &mut ToolSession) {
        if self.middle_pan.take().is_some() {
            return;
        }
        session.end();
    }

    pub fn wheel(&mut self, canvas: &mut Canvas, session: &mut ToolSession, event: WheelEvent) {
        session.wheel(canvas, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use crate::tools::ToolKind;

    #[test]
    fn test_dom_buttons() {
        assert_eq!(MouseButton::from_dom(0), MouseButton::Primary);
        assert_eq!(MouseButton::from_dom(1), MouseButton::Middle);
        assert_eq!(MouseButton::from_dom(4), MouseButton::Other(4));
    }

    #[test]
    fn test_middle_pan_bypasses_tool() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Rectangle);
        let mut session = ToolSession::new();
        let mut router = InputRouter::new();

        let down = PointerEvent::new(Point::new(100.0, 100.0)).with_button(MouseButton::Middle);
        assert_eq!(router.pointer_down(&mut canvas, &mut session, &down), Routed::MiddlePan);
        assert!(router.is_middle_panning());
        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(110.0, 95.0)));
        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(120.0, 100.0)));
        router.pointer_up(&mut session);

        assert_eq!(canvas.camera.offset, Vec2::new(20.0, 0.0));
        assert!(canvas.document.is_empty());
        assert!(!router.is_middle_panning());
        assert!(!session.is_active());
    }

    #[test]
    fn test_primary_reaches_session() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Line);
        let mut session = ToolSession::new();
        let mut router = InputRouter::new();

        let down = PointerEvent::new(Point::new(0.0, 0.0));
        assert_eq!(router.pointer_down(&mut canvas, &mut session, &down), Routed::Session);
        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(40.0, 0.0)));
        router.pointer_up(&mut session);

        assert_eq!(canvas.document.len(), 1);
        assert!(!session.is_active());
    }

    fn only_rect(canvas: &Canvas) -> crate::shapes::Rectangle {
        let shapes: Vec<&Shape> = canvas.document.shapes_ordered().collect();
        assert_eq!(shapes.len(), 1);
        match shapes[0] {
            Shape::Rectangle(rect) => rect.clone(),
            other => panic!("expected a rectangle, got {}", other.kind_name()),
        }
    }

    fn drag(router: &mut InputRouter, canvas: &mut Canvas, session: &mut ToolSession, from: Point, to: Point) {
        router.pointer_down(canvas, session, &PointerEvent::new(from));
        router.pointer_move(canvas, session, &PointerEvent::new(to));
        router.pointer_up(session);
    }

    #[test]
    fn test_hover_then_primary_drag() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Rectangle);
        let mut session = ToolSession::new();
        let mut router = InputRouter::new();

        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(0.0, 0.0)));
        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(5.0, 7.0)));
        assert!(!router.is_middle_panning());
        assert_eq!(canvas.camera.offset, Vec2::ZERO);

        drag(&mut router, &mut canvas, &mut session, Point::new(10.0, 10.0), Point::new(50.0, 40.0));

        let rect = only_rect(&canvas);
        assert!((rect.position.x - 10.0).abs() < 1e-9);
        assert!((rect.position.y - 10.0).abs() < 1e-9);
        assert!((rect.width - 40.0).abs() < 1e-9);
        assert!((rect.height - 30.0).abs() < 1e-9);
        assert_eq!(canvas.camera.offset, Vec2::ZERO);
        assert!(!session.is_active());
    }

    #[test]
    fn test_middle_pan_then_primary_drag() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Rectangle);
        let mut session = ToolSession::new();
        let mut router = InputRouter::new();

        let down = PointerEvent::new(Point::new(0.0, 0.0)).with_button(MouseButton::Middle);
        router.pointer_down(&mut canvas, &mut session, &down);
        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(20.0, 10.0)));
        router.pointer_up(&mut session);
        assert_eq!(canvas.camera.offset, Vec2::new(20.0, 10.0));

        // Hover after the pan must not pan again.
        router.pointer_move(&mut canvas, &mut session, &PointerEvent::new(Point::new(90.0, 90.0)));
        assert_eq!(canvas.camera.offset, Vec2::new(20.0, 10.0));

        drag(&mut router, &mut canvas, &mut session, Point::new(30.0, 20.0), Point::new(70.0, 50.0));

        // Screen (30,20)..(70,50) under offset (20,10) is world (10,10)..(50,40).
        let rect = only_rect(&canvas);
        assert!((rect.position.x - 10.0).abs() < 1e-9);
        assert!((rect.position.y - 10.0).abs() < 1e-9);
        assert!((rect.width - 40.0).abs() < 1e-9);
        assert!((rect.height - 30.0).abs() < 1e-9);
        assert_eq!(canvas.camera.offset, Vec2::new(20.0, 10.0));
        assert!(!session.is_active());
        assert!(!router.is_middle_panning());
    }
}
