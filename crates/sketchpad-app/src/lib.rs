//! Sketchpad Application
//!
//! The whiteboard facade that ties the canvas model, tool session and
//! backend manager together, plus the browser shell on `wasm32`.

pub mod whiteboard;

pub use whiteboard::{
    COMMAND_ZOOM_IN, COMMAND_ZOOM_OUT, SharedBackend, Whiteboard, WhiteboardError, WhiteboardResult,
};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{Canvas2d, HtmlCanvasSurface, WebGpuFactory, WhiteboardHandle, mount};
