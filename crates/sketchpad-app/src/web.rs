//! WebAssembly entry point and browser glue.
//!
//! Binds the whiteboard to an HTML canvas: a `CanvasRenderingContext2d`
//! raster context, a JS-provided GPU module loader, pointer/wheel/resize
//! listeners and a `requestAnimationFrame` loop.

use crate::whiteboard::Whiteboard;
use js_sys::{Array, Function, Promise, Reflect};
use kurbo::{Affine, BezPath, PathEl, Point, Size, Stroke, Vec2};
use peniko::Color;
use sketchpad_core::config::{EngineConfig, RenderMode};
use sketchpad_core::input::{Modifiers, MouseButton, PointerEvent, WheelEvent};
use sketchpad_core::shapes::ShapeId;
use sketchpad_render::gpu::{BoxFuture, GpuClient, GpuError, GpuFactory, GpuResult};
use sketchpad_render::raster::RasterContext;
use sketchpad_render::surface::{Surface, SurfaceError};
use std::cell::RefCell;
use std::future;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise, spawn_local};
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Element, EventTarget, HtmlCanvasElement,
};

type Board = Rc<RefCell<Whiteboard<HtmlCanvasSurface>>>;

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn css_color(color: Color) -> String {
    let c = color.to_rgba8();
    format!("rgba({}, {}, {}, {:.3})", c.r, c.g, c.b, f64::from(c.a) / 255.0)
}

// --- Surface ---

/// An HTML canvas element as a drawing surface.
pub struct HtmlCanvasSurface {
    canvas: HtmlCanvasElement,
}

impl HtmlCanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for HtmlCanvasSurface {
    type Raster = Canvas2d;

    fn css_size(&self) -> Size {
        let rect = self.canvas.get_bounding_client_rect();
        Size::new(rect.width(), rect.height())
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn raster_context(&mut self) -> Result<Canvas2d, SurfaceError> {
        let context = self
            .canvas
            .get_context("2d")
            .map_err(|e| SurfaceError::Context(describe(&e)))?
            .ok_or_else(|| SurfaceError::Context("canvas refused a 2d context".to_string()))?;
        let context = context
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|e| SurfaceError::Context(describe(&e)))?;
        Ok(Canvas2d { context })
    }

    fn recreate(&self) -> Result<Self, SurfaceError> {
        if !self.canvas.is_connected() {
            return Err(SurfaceError::Detached);
        }
        let fresh = self
            .canvas
            .clone_node()
            .map_err(|e| SurfaceError::Recreate(describe(&e)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|e| SurfaceError::Recreate(describe(&e)))?;
        fresh.set_width(self.canvas.width());
        fresh.set_height(self.canvas.height());
        self.canvas
            .replace_with_with_node_1(&fresh)
            .map_err(|e| SurfaceError::Recreate(describe(&e)))?;
        Ok(Self { canvas: fresh })
    }

    fn is_connected(&self) -> bool {
        self.canvas.is_connected()
    }

    fn set_pointer_capture(&self, pointer_id: i32) -> Result<(), SurfaceError> {
        self.canvas
            .set_pointer_capture(pointer_id)
            .map_err(|e| SurfaceError::PointerCapture(describe(&e)))
    }
}

// --- Raster context ---

/// `CanvasRenderingContext2d` behind the raster pipeline.
pub struct Canvas2d {
    context: CanvasRenderingContext2d,
}

impl Canvas2d {
    fn set_transform(&self, transform: Affine) {
        let [a, b, c, d, e, f] = transform.as_coeffs();
        let _ = self.context.set_transform(a, b, c, d, e, f);
    }

    fn trace(&self, path: &BezPath) {
        let ctx = &self.context;
        ctx.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
                PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
                PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
                PathEl::ClosePath => ctx.close_path(),
            }
        }
    }
}

impl RasterContext for Canvas2d {
    fn reset_transform(&mut self) {
        self.set_transform(Affine::IDENTITY);
    }

    fn clear(&mut self, pixel_size: Size) {
        self.set_transform(Affine::IDENTITY);
        self.context.clear_rect(0.0, 0.0, pixel_size.width, pixel_size.height);
    }

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath) {
        self.set_transform(transform);
        self.context.set_fill_style_str(&css_color(color));
        self.trace(path);
        self.context.fill();
    }

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        self.set_transform(transform);
        let dashes: Array = style.dash_pattern.iter().map(|d| JsValue::from_f64(*d)).collect();
        let _ = self.context.set_line_dash(&dashes);
        self.context.set_line_width(style.width);
        self.context.set_line_cap("round");
        self.context.set_line_join("round");
        self.context.set_stroke_style_str(&css_color(color));
        self.trace(path);
        self.context.stroke();
    }

    fn fill_text(&mut self, transform: Affine, text: &str, origin: Point, font_size: f64, color: Color) {
        self.set_transform(transform);
        self.context.set_font(&format!("{font_size}px sans-serif"));
        self.context.set_text_baseline("alphabetic");
        self.context.set_fill_style_str(&css_color(color));
        let _ = self.context.fill_text(text, origin.x, origin.y);
    }
}

// --- GPU module ---

/// Loads the GPU module through a JS function `(canvas, mode) => Promise<client>`.
pub struct WebGpuFactory {
    loader: Option<Function>,
}

impl WebGpuFactory {
    pub fn new(loader: Option<Function>) -> Self {
        Self { loader }
    }
}

impl GpuFactory<HtmlCanvasSurface> for WebGpuFactory {
    fn is_available(&self) -> bool {
        if self.loader.is_none() {
            return false;
        }
        let Some(window) = web_sys::window() else {
            return false;
        };
        Reflect::has(&window.navigator(), &JsValue::from_str("gpu")).unwrap_or(false)
    }

    fn create(&self, surface: &HtmlCanvasSurface, mode: RenderMode) -> BoxFuture<'static, GpuResult> {
        let Some(loader) = self.loader.as_ref() else {
            return Box::pin(future::ready(Err(GpuError::NotSupported)));
        };
        let started = loader.call2(
            &JsValue::NULL,
            surface.element().as_ref(),
            &JsValue::from_str(mode.as_str()),
        );
        let value = match started {
            Ok(value) => value,
            Err(err) => return Box::pin(future::ready(Err(GpuError::Init(describe(&err))))),
        };
        let promise = match value.dyn_into::<Promise>() {
            Ok(promise) => promise,
            Err(value) => Promise::resolve(&value),
        };
        Box::pin(async move {
            let client = JsFuture::from(promise)
                .await
                .map_err(|e| GpuError::Init(describe(&e)))?;
            if client.is_null() || client.is_undefined() {
                return Err(GpuError::NotSupported);
            }
            Ok(Box::new(JsGpuClient { client }) as Box<dyn GpuClient>)
        })
    }
}

/// A GPU client object from JS. Optional methods are called only when present.
struct JsGpuClient {
    client: JsValue,
}

impl JsGpuClient {
    fn call(&self, method: &str, args: &[JsValue]) {
        let Ok(func) = Reflect::get(&self.client, &JsValue::from_str(method)) else {
            return;
        };
        let Some(func) = func.dyn_ref::<Function>() else {
            return;
        };
        let args: Array = args.iter().collect();
        if let Err(err) = func.apply(&self.client, &args) {
            log::debug!("GPU client {method} failed: {}", describe(&err));
        }
    }
}

impl GpuClient for JsGpuClient {
    fn draw(&mut self) {
        self.call("draw", &[]);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.call("resize", &[JsValue::from(width), JsValue::from(height)]);
    }

    fn free(&mut self) {
        self.call("free", &[]);
    }

    fn reset(&mut self) {
        self.call("reset", &[]);
    }

    fn set_auto_rotate(&mut self, enabled: bool) {
        self.call("setAutoRotate", &[JsValue::from_bool(enabled)]);
    }
}

// --- Events ---

fn modifiers(event: &web_sys::MouseEvent) -> Modifiers {
    Modifiers {
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    }
}

fn surface_point(event: &web_sys::MouseEvent) -> Point {
    let Some(target) = event.current_target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return Point::new(f64::from(event.offset_x()), f64::from(event.offset_y()));
    };
    let rect = target.get_bounding_client_rect();
    Point::new(
        f64::from(event.client_x()) - rect.left(),
        f64::from(event.client_y()) - rect.top(),
    )
}

fn pointer_event(event: &web_sys::PointerEvent) -> PointerEvent {
    let mouse: &web_sys::MouseEvent = event.as_ref();
    let mut out = PointerEvent::new(surface_point(mouse))
        .with_button(MouseButton::from_dom(mouse.button()))
        .with_modifiers(modifiers(mouse));
    out.pointer_id = event.pointer_id();
    out
}

type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// Canvas listeners, moved to the replacement canvas on every recreation.
struct CanvasListeners {
    handlers: Vec<(&'static str, Listener)>,
}

impl CanvasListeners {
    fn new(board: &Board) -> Self {
        let mut handlers: Vec<(&'static str, Listener)> = Vec::new();

        let b = board.clone();
        handlers.push((
            "pointerdown",
            Closure::new(move |e: web_sys::Event| {
                if let Some(e) = e.dyn_ref::<web_sys::PointerEvent>() {
                    b.borrow_mut().handle_pointer_down(&pointer_event(e));
                }
            }),
        ));

        let b = board.clone();
        handlers.push((
            "pointermove",
            Closure::new(move |e: web_sys::Event| {
                if let Some(e) = e.dyn_ref::<web_sys::PointerEvent>() {
                    b.borrow_mut().handle_pointer_move(&pointer_event(e));
                }
            }),
        ));

        for name in ["pointerup", "pointercancel"] {
            let b = board.clone();
            handlers.push((
                name,
                Closure::new(move |_e: web_sys::Event| {
                    b.borrow_mut().handle_pointer_up();
                }),
            ));
        }

        let b = board.clone();
        handlers.push((
            "wheel",
            Closure::new(move |e: web_sys::Event| {
                let Some(wheel) = e.dyn_ref::<web_sys::WheelEvent>() else {
                    return;
                };
                e.prevent_default();
                let mouse: &web_sys::MouseEvent = wheel.as_ref();
                b.borrow_mut().handle_wheel(WheelEvent {
                    position: surface_point(mouse),
                    delta: Vec2::new(wheel.delta_x(), wheel.delta_y()),
                    modifiers: modifiers(mouse),
                });
            }),
        ));

        Self { handlers }
    }

    fn attach(&self, target: &EventTarget) {
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        for (name, handler) in &self.handlers {
            let callback = handler.as_ref().unchecked_ref();
            if let Err(err) =
                target.add_event_listener_with_callback_and_add_event_listener_options(name, callback, &options)
            {
                log::warn!("Failed to add {name} listener: {}", describe(&err));
            }
        }
    }

    fn detach(&self, target: &EventTarget) {
        for (name, handler) in &self.handlers {
            let _ = target.remove_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
        }
    }
}

fn read_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Some(location) = web_sys::window().map(|w| w.location()) {
        if let Ok(search) = location.search() {
            config.merge_query(&search);
        }
        if let Ok(hash) = location.hash() {
            config.merge_query(&hash);
        }
    }
    config
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(callback: &FrameCallback) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = callback.borrow();
    let Some(cb) = callback.as_ref() else {
        return;
    };
    if let Err(err) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
        log::warn!("requestAnimationFrame failed: {}", describe(&err));
    }
}

fn start_render_loop(board: Board) -> FrameCallback {
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let next = callback.clone();
    *callback.borrow_mut() = Some(Closure::new(move || {
        board.borrow_mut().frame();
        request_frame(&next);
    }));
    request_frame(&callback);
    callback
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// --- Exported API ---

/// Handle returned to JS by [`mount`].
#[wasm_bindgen]
pub struct WhiteboardHandle {
    board: Board,
    _listeners: Rc<CanvasListeners>,
    _resize: Closure<dyn FnMut()>,
    _frames: FrameCallback,
}

/// Mount a whiteboard on `canvas`.
///
/// `gpu_loader`, if given, is called as `(canvas, mode)` and must resolve to
/// an object with `draw()` and `resize(w, h)`, and optionally `free()`,
/// `reset()` and `setAutoRotate(bool)`.
#[wasm_bindgen]
pub fn mount(canvas: HtmlCanvasElement, gpu_loader: Option<Function>) -> Result<WhiteboardHandle, JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = read_config();
    log::info!(
        "Mounting whiteboard (mode: {}, gpu disabled: {})",
        config.initial_mode,
        config.gpu_disabled
    );

    let surface = HtmlCanvasSurface::new(canvas.clone());
    let factory = Box::new(WebGpuFactory::new(gpu_loader));
    let board: Board = Rc::new(RefCell::new(Whiteboard::new(surface, factory, config)));

    let listeners = Rc::new(CanvasListeners::new(&board));
    listeners.attach(canvas.as_ref());
    {
        let listeners = listeners.clone();
        let backend = board.borrow().backend();
        backend.borrow_mut().slot_mut().set_rebind_hook(Box::new(
            move |old: &HtmlCanvasSurface, new: &HtmlCanvasSurface| {
                listeners.detach(old.element().as_ref());
                listeners.attach(new.element().as_ref());
            },
        ));
    }

    let resize = {
        let board = board.clone();
        Closure::<dyn FnMut()>::new(move || board.borrow_mut().handle_resize())
    };
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;

    let init = board.borrow_mut().init();
    if let Some(init) = init {
        spawn_local(async move {
            let outcome = init.await;
            log::debug!("Initial backend outcome: {outcome:?}");
        });
    }

    let frames = start_render_loop(board.clone());

    Ok(WhiteboardHandle {
        board,
        _listeners: listeners,
        _resize: resize,
        _frames: frames,
    })
}

#[wasm_bindgen]
impl WhiteboardHandle {
    pub fn mode(&self) -> String {
        self.board.borrow().mode().as_str().to_string()
    }

    pub fn engine(&self) -> String {
        self.board.borrow().engine().as_str().to_string()
    }

    #[wasm_bindgen(js_name = autoRotate)]
    pub fn auto_rotate(&self) -> bool {
        self.board.borrow().auto_rotate()
    }

    #[wasm_bindgen(js_name = isTryingGpu)]
    pub fn is_trying_gpu(&self) -> bool {
        self.board.borrow().is_trying_gpu()
    }

    /// Resolves with the engine tag once the switch has settled.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: &str) -> Result<Promise, JsValue> {
        let pending = self.board.borrow().set_mode_by_name(mode).map_err(js_error)?;
        let board = self.board.clone();
        Ok(future_to_promise(async move {
            pending.await;
            let engine = board.borrow().engine();
            Ok(JsValue::from_str(engine.as_str()))
        }))
    }

    #[wasm_bindgen(js_name = reset3d)]
    pub fn reset_3d(&self) {
        self.board.borrow().reset_3d();
    }

    #[wasm_bindgen(js_name = toggleAutoRotate3d)]
    pub fn toggle_auto_rotate_3d(&self) -> bool {
        self.board.borrow().toggle_auto_rotate_3d()
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&self, tool: &str) -> Result<(), JsValue> {
        self.board.borrow_mut().set_tool_by_name(tool).map_err(js_error)
    }

    /// Merge a JSON settings patch; `"fill": null` clears the fill.
    #[wasm_bindgen(js_name = setUiSettings)]
    pub fn set_ui_settings(&self, patch: &str) -> Result<(), JsValue> {
        self.board.borrow_mut().apply_settings_json(patch).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeShape)]
    pub fn remove_shape(&self, id: &str) -> Result<bool, JsValue> {
        let id: ShapeId = id.parse().map_err(js_error)?;
        Ok(self.board.borrow_mut().remove_shape(id).is_some())
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.board.borrow_mut().clear_selection();
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&self) {
        self.board.borrow_mut().delete_selected();
    }

    #[wasm_bindgen(js_name = zoomAt)]
    pub fn zoom_at(&self, x: f64, y: f64, factor: f64) {
        self.board.borrow_mut().zoom_at(Point::new(x, y), factor);
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.board.borrow_mut().zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.board.borrow_mut().zoom_out();
    }

    /// `[{ id, name }]` in page order, as JSON.
    pub fn pages(&self) -> Result<String, JsValue> {
        let board = self.board.borrow();
        let pages: Vec<serde_json::Value> = board
            .pages()
            .iter()
            .map(|p| serde_json::json!({ "id": p.id, "name": p.name }))
            .collect();
        serde_json::to_string(&pages).map_err(js_error)
    }

    #[wasm_bindgen(js_name = activePageId)]
    pub fn active_page_id(&self) -> String {
        self.board.borrow().active_page_id().to_string()
    }

    #[wasm_bindgen(js_name = activeTitle)]
    pub fn active_title(&self) -> String {
        self.board.borrow().active_title().to_string()
    }

    #[wasm_bindgen(js_name = switchToPage)]
    pub fn switch_to_page(&self, id: &str) -> bool {
        self.board.borrow_mut().switch_to_page(id)
    }

    #[wasm_bindgen(js_name = addPage)]
    pub fn add_page(&self) -> String {
        self.board.borrow_mut().add_page()
    }

    #[wasm_bindgen(js_name = renameActivePage)]
    pub fn rename_active_page(&self, title: &str) {
        self.board.borrow_mut().rename_active_page(title);
    }

    #[wasm_bindgen(js_name = saveActivePageSnapshot)]
    pub fn save_active_page_snapshot(&self) {
        self.board.borrow_mut().save_active_page_snapshot();
    }

    /// The working document as JSON.
    #[wasm_bindgen(js_name = documentJson)]
    pub fn document_json(&self) -> Result<String, JsValue> {
        self.board.borrow().canvas().document.to_json().map_err(js_error)
    }
}
