//! GPU module seam.
//!
//! The GPU renderer is an opaque capability. The engine only needs to create
//! it for a surface, hand it frames, resize it and release it.

use crate::surface::Surface;
use sketchpad_core::config::RenderMode;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// A boxed future that is not required to be `Send` (wasm is single-threaded).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// GPU initialization errors.
#[derive(Debug, Error)]
pub enum GpuError {
    /// The platform has no GPU capability. Not worth a warning.
    #[error("GPU rendering is not supported here")]
    NotSupported,
    #[error("GPU initialization failed: {0}")]
    Init(String),
    #[error("GPU surface error: {0}")]
    Surface(String),
}

/// Result of a GPU client creation.
pub type GpuResult = Result<Box<dyn GpuClient>, GpuError>;

/// A live GPU renderer bound to one surface.
pub trait GpuClient {
    /// Render a whole frame.
    fn draw(&mut self);

    /// Backing store size in device pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Release GPU resources. Called exactly once before the client is dropped.
    fn free(&mut self) {}

    /// Reset the 3D view.
    fn reset(&mut self) {}

    fn set_auto_rotate(&mut self, enabled: bool) {
        let _ = enabled;
    }
}

/// Creates GPU clients for surfaces of type `S`.
pub trait GpuFactory<S: Surface> {
    /// Whether the platform exposes a GPU capability at all.
    fn is_available(&self) -> bool;

    /// Start creating a client for `surface`.
    ///
    /// The returned future must not borrow the surface; a slower request may
    /// still be running after the surface has been replaced.
    fn create(&self, surface: &S, mode: RenderMode) -> BoxFuture<'static, GpuResult>;
}
