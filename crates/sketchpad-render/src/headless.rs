//! Headless surface, recording raster context and scripted GPU factory.
//!
//! These stand in for the browser in tests and offscreen tooling. The
//! headless surface enforces the same binding rule as an HTML canvas: once a
//! context kind is bound, the other kind cannot be acquired.

use crate::gpu::{BoxFuture, GpuClient, GpuError, GpuFactory, GpuResult};
use crate::raster::RasterContext;
use crate::surface::{Surface, SurfaceError};
use kurbo::{Affine, BezPath, Point, Size, Stroke};
use peniko::Color;
use sketchpad_core::config::RenderMode;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

fn rgba(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// A recorded raster call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ResetTransform,
    Clear {
        pixel_size: Size,
    },
    Fill {
        transform: Affine,
        color: [u8; 4],
        path: BezPath,
    },
    Stroke {
        transform: Affine,
        color: [u8; 4],
        width: f64,
        dashes: Vec<f64>,
        path: BezPath,
    },
    Text {
        transform: Affine,
        text: String,
        origin: Point,
        font_size: f64,
        color: [u8; 4],
    },
}

impl DrawCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::ResetTransform => "reset",
            DrawCommand::Clear { .. } => "clear",
            DrawCommand::Fill { .. } => "fill",
            DrawCommand::Stroke { .. } => "stroke",
            DrawCommand::Text { .. } => "text",
        }
    }
}

/// Raster context that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of frames drawn, counted by clears.
    pub fn frames(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }
}

impl RasterContext for RecordingContext {
    fn reset_transform(&mut self) {
        self.commands.push(DrawCommand::ResetTransform);
    }

    fn clear(&mut self, pixel_size: Size) {
        self.commands.push(DrawCommand::Clear { pixel_size });
    }

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Fill {
            transform,
            color: rgba(color),
            path: path.clone(),
        });
    }

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Stroke {
            transform,
            color: rgba(color),
            width: style.width,
            dashes: style.dash_pattern.iter().copied().collect(),
            path: path.clone(),
        });
    }

    fn fill_text(&mut self, transform: Affine, text: &str, origin: Point, font_size: f64, color: Color) {
        self.commands.push(DrawCommand::Text {
            transform,
            text: text.to_string(),
            origin,
            font_size,
            color: rgba(color),
        });
    }
}

/// Which context kind a surface is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    #[default]
    Unbound,
    Raster,
    Gpu,
}

static NEXT_SURFACE_ID: AtomicU32 = AtomicU32::new(1);

/// In-memory surface with canvas-like binding rules.
#[derive(Debug)]
pub struct HeadlessSurface {
    id: u32,
    css_size: Size,
    dpr: f64,
    pixel_size: (u32, u32),
    binding: Cell<Binding>,
    connected: bool,
    capture_fails: bool,
    fail_recreate: bool,
    captured: RefCell<Vec<i32>>,
    raster_requests: Cell<u32>,
}

impl HeadlessSurface {
    pub fn new(css_size: Size, dpr: f64) -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            css_size,
            dpr,
            pixel_size: (300, 150),
            binding: Cell::new(Binding::Unbound),
            connected: true,
            capture_fails: false,
            fail_recreate: false,
            captured: RefCell::new(Vec::new()),
            raster_requests: Cell::new(0),
        }
    }

    /// Unique per surface instance, including recreated ones.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn binding(&self) -> Binding {
        self.binding.get()
    }

    /// Bind the GPU context, as a GPU module does on creation.
    pub fn bind_gpu(&self) -> Result<(), SurfaceError> {
        if self.binding.get() == Binding::Raster {
            return Err(SurfaceError::Context(
                "surface already carries a 2D context".to_string(),
            ));
        }
        self.binding.set(Binding::Gpu);
        Ok(())
    }

    pub fn set_css_size(&mut self, css_size: Size) {
        self.css_size = css_size;
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        self.dpr = dpr;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn set_capture_fails(&mut self, fails: bool) {
        self.capture_fails = fails;
    }

    pub fn set_fail_recreate(&mut self, fails: bool) {
        self.fail_recreate = fails;
    }

    pub fn captured(&self) -> Vec<i32> {
        self.captured.borrow().clone()
    }

    /// How many times a 2D context was requested.
    pub fn raster_requests(&self) -> u32 {
        self.raster_requests.get()
    }
}

impl Surface for HeadlessSurface {
    type Raster = RecordingContext;

    fn css_size(&self) -> Size {
        self.css_size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn pixel_size(&self) -> (u32, u32) {
        self.pixel_size
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.pixel_size = (width, height);
    }

    fn raster_context(&mut self) -> Result<RecordingContext, SurfaceError> {
        self.raster_requests.set(self.raster_requests.get() + 1);
        if self.binding.get() == Binding::Gpu {
            return Err(SurfaceError::Context("surface is bound to the GPU".to_string()));
        }
        self.binding.set(Binding::Raster);
        Ok(RecordingContext::new())
    }

    fn recreate(&self) -> Result<Self, SurfaceError> {
        if self.fail_recreate {
            return Err(SurfaceError::Recreate("host refused the new surface".to_string()));
        }
        let mut fresh = HeadlessSurface::new(self.css_size, self.dpr);
        fresh.pixel_size = self.pixel_size;
        Ok(fresh)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_pointer_capture(&self, pointer_id: i32) -> Result<(), SurfaceError> {
        if self.capture_fails {
            return Err(SurfaceError::PointerCapture("invalid pointer id".to_string()));
        }
        self.captured.borrow_mut().push(pointer_id);
        Ok(())
    }
}

/// A call received by a [`HeadlessGpu`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuCall {
    Draw,
    Resize(u32, u32),
    Free,
    Reset,
    AutoRotate(bool),
}

/// Shared log of `(client label, call)` pairs.
pub type GpuLog = Rc<RefCell<Vec<(String, GpuCall)>>>;

/// GPU client that only records what it is asked to do.
pub struct HeadlessGpu {
    label: String,
    log: GpuLog,
}

impl HeadlessGpu {
    pub fn new(label: impl Into<String>, log: GpuLog) -> Self {
        Self {
            label: label.into(),
            log,
        }
    }

    fn record(&self, call: GpuCall) {
        self.log.borrow_mut().push((self.label.clone(), call));
    }
}

impl GpuClient for HeadlessGpu {
    fn draw(&mut self) {
        self.record(GpuCall::Draw);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(GpuCall::Resize(width, height));
    }

    fn free(&mut self) {
        self.record(GpuCall::Free);
    }

    fn reset(&mut self) {
        self.record(GpuCall::Reset);
    }

    fn set_auto_rotate(&mut self, enabled: bool) {
        self.record(GpuCall::AutoRotate(enabled));
    }
}

#[derive(Default)]
struct Script {
    unavailable: bool,
    queue: VecDeque<BoxFuture<'static, GpuResult>>,
    requests: Vec<RenderMode>,
}

/// GPU factory that replays queued results in request order.
///
/// With an empty queue every request resolves to [`GpuError::NotSupported`].
/// Creation binds the headless surface to the GPU, so a surface that
/// already has a 2D context fails with [`GpuError::Surface`].
#[derive(Clone, Default)]
pub struct ScriptedGpuFactory {
    script: Rc<RefCell<Script>>,
}

impl ScriptedGpuFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory on a platform with no GPU capability.
    pub fn unavailable() -> Self {
        let factory = Self::default();
        factory.script.borrow_mut().unavailable = true;
        factory
    }

    /// Queue the future answering the next request.
    pub fn push(&self, result: BoxFuture<'static, GpuResult>) {
        self.script.borrow_mut().queue.push_back(result);
    }

    /// Queue an already resolved answer.
    pub fn push_ready(&self, result: GpuResult) {
        self.push(Box::pin(future::ready(result)));
    }

    /// Modes requested so far.
    pub fn requests(&self) -> Vec<RenderMode> {
        self.script.borrow().requests.clone()
    }
}

impl GpuFactory<HeadlessSurface> for ScriptedGpuFactory {
    fn is_available(&self) -> bool {
        !self.script.borrow().unavailable
    }

    fn create(&self, surface: &HeadlessSurface, mode: RenderMode) -> BoxFuture<'static, GpuResult> {
        let mut script = self.script.borrow_mut();
        script.requests.push(mode);
        if let Err(err) = surface.bind_gpu() {
            return Box::pin(future::ready(Err(GpuError::Surface(err.to_string()))));
        }
        script
            .queue
            .pop_front()
            .unwrap_or_else(|| Box::pin(future::ready(Err(GpuError::NotSupported))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_is_exclusive() {
        let mut surface = HeadlessSurface::new(Size::new(10.0, 10.0), 1.0);
        assert!(surface.raster_context().is_ok());
        assert!(surface.bind_gpu().is_err());

        let fresh = surface.recreate().unwrap();
        assert_eq!(fresh.binding(), Binding::Unbound);
        fresh.bind_gpu().unwrap();
        let mut fresh = fresh;
        assert!(fresh.raster_context().is_err());
    }

    #[test]
    fn test_scripted_factory_order() {
        let factory = ScriptedGpuFactory::new();
        let log = GpuLog::default();
        factory.push_ready(Ok(Box::new(HeadlessGpu::new("a", log.clone()))));

        let surface = HeadlessSurface::new(Size::new(10.0, 10.0), 1.0);
        let first = factory.create(&surface, RenderMode::ThreeD);
        let second = factory.create(&surface, RenderMode::ThreeD);
        assert_eq!(factory.requests(), vec![RenderMode::ThreeD, RenderMode::ThreeD]);
        drop(first);
        drop(second);
        assert_eq!(surface.binding(), Binding::Gpu);
    }
}
