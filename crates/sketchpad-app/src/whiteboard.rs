//! The whiteboard facade.
//!
//! Owns the canvas state, the tool session, the input router and the backend
//! manager, and exposes the operations a host (the browser glue, or a test)
//! drives: input events, frames, mode switching, pages and styling.

use kurbo::Size;
use sketchpad_core::canvas::{Canvas, Page, UiSettingsPatch};
use sketchpad_core::config::{ConfigError, EngineConfig, RenderMode};
use sketchpad_core::input::{InputRouter, PointerEvent, Routed, WheelEvent};
use sketchpad_core::shapes::{Shape, ShapeId};
use sketchpad_core::tools::{ToolKind, ToolSession};
use sketchpad_render::backend::{self, BackendManager, EngineKind, InitOutcome};
use sketchpad_render::dispatch::{FrameOutcome, RenderLoop};
use sketchpad_render::gpu::{BoxFuture, GpuFactory};
use sketchpad_render::surface::Surface;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Zoom factor for the "zoom in" command.
pub const COMMAND_ZOOM_IN: f64 = 1.15;
/// Zoom factor for the "zoom out" command.
pub const COMMAND_ZOOM_OUT: f64 = 0.87;

/// Errors from host-facing string APIs.
#[derive(Debug, Error)]
pub enum WhiteboardError {
    #[error("Invalid settings patch: {0}")]
    InvalidSettings(#[from] serde_json::Error),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    InvalidMode(#[from] ConfigError),
}

pub type WhiteboardResult<T> = Result<T, WhiteboardError>;

/// Shared handle to the backend, cloned into pending mode switches.
pub type SharedBackend<S> = Rc<RefCell<BackendManager<S>>>;

pub struct Whiteboard<S: Surface + 'static> {
    canvas: Canvas,
    session: ToolSession,
    router: InputRouter,
    backend: SharedBackend<S>,
    render_loop: RenderLoop,
    initialized: bool,
}

impl<S: Surface + 'static> Whiteboard<S> {
    pub fn new(surface: S, factory: Box<dyn GpuFactory<S>>, config: EngineConfig) -> Self {
        Self {
            canvas: Canvas::new(),
            session: ToolSession::new(),
            router: InputRouter::new(),
            backend: Rc::new(RefCell::new(BackendManager::new(surface, factory, config))),
            render_loop: RenderLoop::new(),
            initialized: false,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn session(&self) -> &ToolSession {
        &self.session
    }

    pub fn backend(&self) -> SharedBackend<S> {
        self.backend.clone()
    }

    pub fn frames(&self) -> u64 {
        self.render_loop.frames()
    }

    /// Start the backend. Returns `None` after the first call.
    ///
    /// The returned future drives the initial GPU init, if any; frames can
    /// be drawn while it is pending.
    pub fn init(&mut self) -> Option<BoxFuture<'static, InitOutcome>> {
        if self.initialized {
            return None;
        }
        self.initialized = true;
        let css = self.backend.borrow().slot().surface().css_size();
        self.canvas.set_viewport_size(css.width, css.height);
        Some(Box::pin(backend::initialize(self.backend.clone())))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // --- Mode and engine ---

    pub fn mode(&self) -> RenderMode {
        self.backend.borrow().mode()
    }

    pub fn engine(&self) -> EngineKind {
        self.backend.borrow().engine()
    }

    pub fn auto_rotate(&self) -> bool {
        self.backend.borrow().auto_rotate()
    }

    pub fn is_trying_gpu(&self) -> bool {
        self.backend.borrow().is_trying_gpu()
    }

    pub fn set_mode(&self, mode: RenderMode) -> BoxFuture<'static, InitOutcome> {
        log::debug!("Mode switch requested: {mode}");
        Box::pin(backend::set_mode(self.backend.clone(), mode))
    }

    pub fn set_mode_by_name(&self, name: &str) -> WhiteboardResult<BoxFuture<'static, InitOutcome>> {
        let mode: RenderMode = name.parse()?;
        Ok(self.set_mode(mode))
    }

    pub fn reset_3d(&self) {
        self.backend.borrow_mut().reset_view();
    }

    pub fn toggle_auto_rotate_3d(&self) -> bool {
        self.backend.borrow_mut().toggle_auto_rotate()
    }

    // --- Input ---

    pub fn handle_pointer_down(&mut self, event: &PointerEvent) -> Routed {
        self.backend.borrow().capture_pointer(event.pointer_id);
        log::debug!(
            "Pointer down: tool {}, at ({:.1}, {:.1})",
            self.canvas.ui.tool.name(),
            event.position.x,
            event.position.y
        );
        self.router.pointer_down(&mut self.canvas, &mut self.session, event)
    }

    pub fn handle_pointer_move(&mut self, event: &PointerEvent) {
        self.router.pointer_move(&mut self.canvas, &mut self.session, event);
    }

    /// Pointer up or cancel.
    pub fn handle_pointer_up(&mut self) {
        self.router.pointer_up(&mut self.session);
    }

    pub fn handle_wheel(&mut self, event: WheelEvent) {
        self.router.wheel(&mut self.canvas, &mut self.session, event);
    }

    /// Re-measure the surface after a layout change.
    pub fn handle_resize(&mut self) {
        let css: Size = {
            let mut backend = self.backend.borrow_mut();
            backend.resize();
            backend.slot().metrics().css_size
        };
        self.canvas.set_viewport_size(css.width, css.height);
    }

    // --- Frames ---

    pub fn frame(&mut self) -> FrameOutcome {
        let outcome = self.backend.borrow_mut().frame(&self.canvas);
        self.render_loop.record(outcome);
        outcome
    }

    // --- Document, tools and styling ---

    pub fn tool(&self) -> ToolKind {
        self.canvas.ui.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.canvas.set_tool(tool);
    }

    pub fn set_tool_by_name(&mut self, name: &str) -> WhiteboardResult<()> {
        let tool = ToolKind::from_name(name).ok_or_else(|| WhiteboardError::UnknownTool(name.to_string()))?;
        self.set_tool(tool);
        Ok(())
    }

    pub fn set_ui_settings(&mut self, patch: UiSettingsPatch) {
        self.canvas.set_ui_settings(patch);
    }

    /// Merge a JSON-encoded [`UiSettingsPatch`].
    pub fn apply_settings_json(&mut self, json: &str) -> WhiteboardResult<()> {
        let patch: UiSettingsPatch = serde_json::from_str(json)?;
        self.set_ui_settings(patch);
        Ok(())
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.canvas.remove_shape(id)
    }

    pub fn clear_selection(&mut self) {
        self.canvas.clear_selection();
    }

    pub fn delete_selected(&mut self) {
        self.canvas.delete_selected();
    }

    pub fn zoom_at(&mut self, screen: kurbo::Point, factor: f64) {
        self.canvas.zoom_at(screen, factor);
    }

    pub fn zoom_in(&mut self) {
        let center = self.canvas.viewport_center();
        self.canvas.zoom_at(center, COMMAND_ZOOM_IN);
    }

    pub fn zoom_out(&mut self) {
        let center = self.canvas.viewport_center();
        self.canvas.zoom_at(center, COMMAND_ZOOM_OUT);
    }

    // --- Pages ---

    pub fn pages(&self) -> &[Page] {
        self.canvas.pages()
    }

    pub fn active_page_id(&self) -> &str {
        self.canvas.active_page_id()
    }

    pub fn active_title(&self) -> &str {
        self.canvas.active_title()
    }

    pub fn switch_to_page(&mut self, id: &str) -> bool {
        self.session.cancel();
        self.canvas.switch_to_page(id)
    }

    pub fn add_page(&mut self) -> String {
        self.session.cancel();
        self.canvas.add_page()
    }

    pub fn rename_active_page(&mut self, title: &str) {
        self.canvas.rename_active_page(title);
    }

    pub fn save_active_page_snapshot(&mut self) {
        self.canvas.save_active_page_snapshot();
    }
}
