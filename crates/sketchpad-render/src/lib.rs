//! Sketchpad Render Library
//!
//! Raster pipeline, drawing-surface adapter and the backend manager that
//! picks between the raster pipeline and an optional GPU module.

pub mod backend;
pub mod dispatch;
pub mod gpu;
pub mod headless;
pub mod raster;
mod renderer;
pub mod surface;

pub use backend::{BackendManager, EngineKind, InitOutcome, ModeSwitch, PendingInit, initialize, set_mode};
pub use dispatch::{FrameOutcome, RenderLoop, dispatch_frame};
pub use gpu::{BoxFuture, GpuClient, GpuError, GpuFactory, GpuResult};
pub use headless::{DrawCommand, HeadlessGpu, HeadlessSurface, RecordingContext, ScriptedGpuFactory};
pub use raster::{GridLine, RasterContext, SELECTION_DASHES, grid_lines, render_raster, render_shape};
pub use renderer::{GRID_COLOR, GRID_SIZE, RenderContext, SELECTION_COLOR};
pub use surface::{RebindHook, Surface, SurfaceError, SurfaceMetrics, SurfaceSlot, pixel_size_for};
