//! Per-frame dispatch between the GPU client and the raster pipeline.

use crate::gpu::GpuClient;
use crate::raster::{RasterContext, render_raster};
use crate::renderer::RenderContext;

/// What a frame ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Gpu,
    Raster,
    /// Nothing to draw with yet.
    Skipped,
}

/// Give the frame to the GPU if present, else the raster context, else skip.
pub fn dispatch_frame<R: RasterContext + ?Sized>(
    gpu: Option<&mut (dyn GpuClient + 'static)>,
    raster: Option<&mut R>,
    ctx: &RenderContext,
) -> FrameOutcome {
    if let Some(gpu) = gpu {
        gpu.draw();
        return FrameOutcome::Gpu;
    }
    if let Some(raster) = raster {
        render_raster(raster, ctx);
        return FrameOutcome::Raster;
    }
    FrameOutcome::Skipped
}

/// Frame counter that reports the first frame once.
#[derive(Debug, Clone, Default)]
pub struct RenderLoop {
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn record(&mut self, outcome: FrameOutcome) {
        if self.frames == 0 {
            log::info!(
                "Render loop started (gpu: {}, raster: {})",
                outcome == FrameOutcome::Gpu,
                outcome == FrameOutcome::Raster
            );
        }
        self.frames += 1;
    }
}
