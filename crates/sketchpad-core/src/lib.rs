//! Sketchpad Core Library
//!
//! Platform-agnostic document model, geometry and tool state machine for the
//! Sketchpad whiteboard. Nothing here draws; see `sketchpad-render`.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod geometry;
pub mod input;
pub mod shapes;
pub mod tools;

pub use camera::Camera;
pub use canvas::{Canvas, CanvasDocument, CanvasError, Page, UiSettings, UiSettingsPatch};
pub use config::{ConfigError, EngineConfig, RenderMode};
pub use input::{InputRouter, Modifiers, MouseButton, PointerEvent, Routed, WheelEvent};
pub use shapes::{SerializableColor, Shape, ShapeId, ShapeStyle, ShapeTrait};
pub use tools::{SessionPhase, ToolKind, ToolSession, WhiteboardActions};
