//! Backend lifecycle: which renderer draws, and safe switching between them.
//!
//! GPU initialization is asynchronous and may be overtaken by a later mode
//! switch. Every request takes a ticket from a monotonic counter; a result is
//! applied only while its ticket is still the latest. Releasing the GPU also
//! advances the counter, so an init that was started before a switch back to
//! 2d is discarded when it lands.
//!
//! The synchronous halves (`begin_*` / [`BackendManager::finish_gpu_init`])
//! never await. The async drivers [`set_mode`] and [`initialize`] hold the
//! manager's `RefCell` borrow only between awaits, so input and frames keep
//! running while an init is pending.

use crate::dispatch::{FrameOutcome, dispatch_frame};
use crate::gpu::{BoxFuture, GpuClient, GpuError, GpuFactory, GpuResult};
use crate::renderer::RenderContext;
use crate::surface::{Surface, SurfaceSlot};
use kurbo::Size;
use sketchpad_core::canvas::Canvas;
use sketchpad_core::config::{EngineConfig, RenderMode};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Which renderer is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Raster pipeline on a 2D context.
    #[default]
    Fallback2d,
    /// GPU module drawing in 2d mode.
    Wasm2d,
    /// GPU module drawing in 3d mode.
    Wasm3d,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Fallback2d => "fallback-2d",
            EngineKind::Wasm2d => "wasm-2d",
            EngineKind::Wasm3d => "wasm-3d",
        }
    }

    pub fn is_gpu(self) -> bool {
        !matches!(self, EngineKind::Fallback2d)
    }

    fn for_mode(mode: RenderMode) -> Self {
        match mode {
            RenderMode::TwoD => EngineKind::Wasm2d,
            RenderMode::ThreeD => EngineKind::Wasm3d,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an initialization or mode switch settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Already in the requested mode.
    Unchanged,
    /// Drawing through the raster pipeline.
    Raster,
    /// A GPU client was installed.
    Gpu(EngineKind),
    /// A newer request superseded this one; nothing was applied.
    Stale,
}

/// A GPU init waiting to be awaited and passed back to
/// [`BackendManager::finish_gpu_init`].
pub struct PendingInit {
    pub ticket: u64,
    pub mode: RenderMode,
    pub future: BoxFuture<'static, GpuResult>,
}

/// Result of the synchronous half of a switch.
pub enum ModeSwitch {
    Settled(InitOutcome),
    Pending(PendingInit),
}

/// Owns the surface, the optional GPU client and the mode/engine state.
pub struct BackendManager<S: Surface> {
    slot: SurfaceSlot<S>,
    factory: Box<dyn GpuFactory<S>>,
    config: EngineConfig,
    mode: RenderMode,
    engine: EngineKind,
    gpu: Option<Box<dyn GpuClient>>,
    auto_rotate: bool,
    trying_gpu: bool,
    request: u64,
}

impl<S: Surface> BackendManager<S> {
    pub fn new(surface: S, factory: Box<dyn GpuFactory<S>>, config: EngineConfig) -> Self {
        Self {
            slot: SurfaceSlot::new(surface),
            factory,
            config,
            mode: RenderMode::TwoD,
            engine: EngineKind::Fallback2d,
            gpu: None,
            auto_rotate: true,
            trying_gpu: true,
            request: 0,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn is_trying_gpu(&self) -> bool {
        self.trying_gpu
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn slot(&self) -> &SurfaceSlot<S> {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut SurfaceSlot<S> {
        &mut self.slot
    }

    /// Free the GPU client, if any, and invalidate in-flight inits.
    pub fn release_gpu(&mut self) {
        self.request += 1;
        if let Some(mut client) = self.gpu.take() {
            client.free();
        }
    }

    fn fall_back(&mut self) {
        if let Some(mut client) = self.gpu.take() {
            client.free();
        }
        self.engine = EngineKind::Fallback2d;
        self.slot.ensure_raster_ready();
    }

    /// Start a GPU init for `mode`, or fall back right away when that cannot work.
    pub fn begin_gpu_init(&mut self, mode: RenderMode) -> Option<PendingInit> {
        self.request += 1;
        let ticket = self.request;
        if mode == RenderMode::TwoD || !self.factory.is_available() {
            self.trying_gpu = false;
            self.fall_back();
            return None;
        }
        let future = self.factory.create(self.slot.surface(), mode);
        Some(PendingInit {
            ticket,
            mode,
            future,
        })
    }

    /// Apply a finished init if its ticket is still current.
    pub fn finish_gpu_init(&mut self, ticket: u64, mode: RenderMode, result: GpuResult) -> InitOutcome {
        if ticket != self.request {
            if let Ok(mut stale) = result {
                stale.free();
            }
            return InitOutcome::Stale;
        }

        let outcome = match result {
            Ok(mut client) => {
                let (width, height) = self.slot.metrics().pixel_size;
                client.resize(width, height);
                if let Some(mut previous) = self.gpu.replace(client) {
                    previous.free();
                }
                self.engine = EngineKind::for_mode(mode);
                log::info!("GPU backend ready ({})", self.engine);
                InitOutcome::Gpu(self.engine)
            }
            Err(GpuError::NotSupported) => {
                log::debug!("GPU not supported, using raster backend");
                self.fall_back();
                InitOutcome::Raster
            }
            Err(err) => {
                log::warn!("{err}; falling back to raster backend");
                self.fall_back();
                InitOutcome::Raster
            }
        };
        self.trying_gpu = self.gpu.is_some();
        outcome
    }

    /// Synchronous half of the first initialization, using the startup config.
    pub fn begin_initial(&mut self) -> ModeSwitch {
        self.slot.resize();
        if self.config.gpu_disabled {
            self.trying_gpu = false;
            self.engine = EngineKind::Fallback2d;
            self.slot.ensure_raster();
            return ModeSwitch::Settled(InitOutcome::Raster);
        }

        self.mode = self.config.initial_mode;
        if self.mode == RenderMode::TwoD {
            self.trying_gpu = false;
            self.engine = EngineKind::Fallback2d;
            self.slot.ensure_raster();
            return ModeSwitch::Settled(InitOutcome::Raster);
        }

        self.trying_gpu = true;
        match self.begin_gpu_init(self.mode) {
            Some(pending) => ModeSwitch::Pending(pending),
            None => ModeSwitch::Settled(InitOutcome::Raster),
        }
    }

    /// Synchronous half of a mode switch.
    pub fn begin_set_mode(&mut self, next: RenderMode) -> ModeSwitch {
        if self.mode == next {
            return ModeSwitch::Settled(InitOutcome::Unchanged);
        }
        let previous = self.mode;
        let had_gpu = self.gpu.is_some();
        self.mode = next;

        if next == RenderMode::TwoD {
            self.release_gpu();
            self.trying_gpu = false;
            if previous == RenderMode::ThreeD || had_gpu {
                self.slot.recreate();
            }
            self.engine = EngineKind::Fallback2d;
            self.slot.resize();
            self.slot.ensure_raster_ready();
            log::info!("Switched to {} mode ({})", next, self.engine);
            return ModeSwitch::Settled(InitOutcome::Raster);
        }

        if self.config.gpu_disabled {
            self.trying_gpu = false;
            self.engine = EngineKind::Fallback2d;
            self.slot.ensure_raster();
            return ModeSwitch::Settled(InitOutcome::Raster);
        }

        self.trying_gpu = true;
        if self.slot.has_raster() {
            self.slot.recreate();
        }
        self.release_gpu();
        self.slot.resize();
        match self.begin_gpu_init(next) {
            Some(pending) => ModeSwitch::Pending(pending),
            None => ModeSwitch::Settled(InitOutcome::Raster),
        }
    }

    /// Reset the 3D view. Only forwarded in 3d mode.
    pub fn reset_view(&mut self) {
        if self.mode != RenderMode::ThreeD {
            return;
        }
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.reset();
        }
    }

    /// Flip auto-rotation. The flag always flips; the client only hears about it in 3d.
    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        if self.mode == RenderMode::ThreeD {
            if let Some(gpu) = self.gpu.as_mut() {
                gpu.set_auto_rotate(self.auto_rotate);
            }
        }
        self.auto_rotate
    }

    /// Re-measure the surface and resize the GPU client to match.
    pub fn resize(&mut self) {
        let metrics = self.slot.resize();
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(metrics.pixel_size.0, metrics.pixel_size.1);
        }
    }

    pub fn capture_pointer(&self, pointer_id: i32) {
        self.slot.capture_pointer(pointer_id);
    }

    /// Draw one frame of `canvas`.
    ///
    /// In 2d mode with nothing to draw with, a 2D context is recovered first.
    pub fn frame(&mut self, canvas: &Canvas) -> FrameOutcome {
        if self.mode == RenderMode::TwoD && self.gpu.is_none() && !self.slot.has_raster() {
            self.slot.ensure_raster_ready();
        }

        let metrics = self.slot.metrics();
        let dpr = metrics.dpr;
        let css = Size::new(
            f64::from(metrics.pixel_size.0) / dpr,
            f64::from(metrics.pixel_size.1) / dpr,
        );
        let ctx = RenderContext::new(canvas, css).with_scale_factor(dpr);
        dispatch_frame(self.gpu.as_deref_mut(), self.slot.raster_mut(), &ctx)
    }
}

/// Run the startup initialization to completion.
pub async fn initialize<S: Surface>(backend: Rc<RefCell<BackendManager<S>>>) -> InitOutcome {
    let switch = backend.borrow_mut().begin_initial();
    settle(&backend, switch).await
}

/// Switch to `mode`, awaiting a GPU init if one is needed.
pub async fn set_mode<S: Surface>(backend: Rc<RefCell<BackendManager<S>>>, mode: RenderMode) -> InitOutcome {
    let switch = backend.borrow_mut().begin_set_mode(mode);
    settle(&backend, switch).await
}

async fn settle<S: Surface>(backend: &RefCell<BackendManager<S>>, switch: ModeSwitch) -> InitOutcome {
    match switch {
        ModeSwitch::Settled(outcome) => outcome,
        ModeSwitch::Pending(PendingInit {
            ticket,
            mode,
            future,
        }) => {
            let result = future.await;
            backend.borrow_mut().finish_gpu_init(ticket, mode, result)
        }
    }
}
