//! Drawing surface adapter: sizing, 2D context caching and replacement.

use crate::raster::RasterContext;
use kurbo::Size;
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface is not attached")]
    Detached,
    #[error("Pointer capture failed: {0}")]
    PointerCapture(String),
    #[error("No 2D context: {0}")]
    Context(String),
    #[error("Surface recreation failed: {0}")]
    Recreate(String),
}

/// A platform drawing surface, such as an HTML canvas element.
///
/// A surface can carry either a 2D context or a GPU context, never both.
/// Going back to 2D after the GPU has bound requires [`Surface::recreate`].
pub trait Surface: Sized {
    type Raster: RasterContext;

    /// Layout size in CSS pixels.
    fn css_size(&self) -> Size;

    fn device_pixel_ratio(&self) -> f64;

    fn pixel_size(&self) -> (u32, u32);

    fn set_pixel_size(&mut self, width: u32, height: u32);

    /// Acquire (or re-acquire) the 2D context.
    fn raster_context(&mut self) -> Result<Self::Raster, SurfaceError>;

    /// Build a fresh unbound surface with the same pixel dimensions and put
    /// it in place of `self` in the host tree.
    fn recreate(&self) -> Result<Self, SurfaceError>;

    /// Whether the surface is still attached to its host.
    fn is_connected(&self) -> bool;

    fn set_pointer_capture(&self, pointer_id: i32) -> Result<(), SurfaceError>;
}

/// Device-pixel size for a CSS size: `max(1, floor(css * dpr))` per axis.
pub fn pixel_size_for(css: Size, dpr: f64) -> (u32, u32) {
    let axis = |v: f64| (v * dpr).floor().max(1.0) as u32;
    (axis(css.width), axis(css.height))
}

/// Sizes recorded at the last resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub css_size: Size,
    pub dpr: f64,
    pub pixel_size: (u32, u32),
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self {
            css_size: Size::ZERO,
            dpr: 1.0,
            pixel_size: (1, 1),
        }
    }
}

/// Called with `(old, new)` after a surface is swapped.
pub type RebindHook<S> = Box<dyn FnMut(&S, &S)>;

/// Owns the current surface and its cached 2D context.
pub struct SurfaceSlot<S: Surface> {
    surface: S,
    raster: Option<S::Raster>,
    metrics: SurfaceMetrics,
    rebind: Option<RebindHook<S>>,
}

impl<S: Surface> SurfaceSlot<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            raster: None,
            metrics: SurfaceMetrics::default(),
            rebind: None,
        }
    }

    /// Install the hook that moves listeners from an old surface to its replacement.
    pub fn set_rebind_hook(&mut self, hook: RebindHook<S>) {
        self.rebind = Some(hook);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    pub fn has_raster(&self) -> bool {
        self.raster.is_some()
    }

    pub fn raster(&self) -> Option<&S::Raster> {
        self.raster.as_ref()
    }

    pub fn raster_mut(&mut self) -> Option<&mut S::Raster> {
        self.raster.as_mut()
    }

    /// Match the backing store to the current layout size and pixel ratio.
    pub fn resize(&mut self) -> SurfaceMetrics {
        let css_size = self.surface.css_size();
        let dpr = self.surface.device_pixel_ratio();
        let pixel_size = pixel_size_for(css_size, dpr);
        self.surface.set_pixel_size(pixel_size.0, pixel_size.1);
        self.metrics = SurfaceMetrics {
            css_size,
            dpr,
            pixel_size,
        };
        log::debug!(
            "Surface resized: css {}x{}, dpr {}, pixels {}x{}",
            css_size.width,
            css_size.height,
            dpr,
            pixel_size.0,
            pixel_size.1
        );
        self.metrics
    }

    /// Acquire a 2D context if none is cached. Returns whether one is available.
    pub fn ensure_raster(&mut self) -> bool {
        if self.raster.is_some() {
            return true;
        }
        match self.surface.raster_context() {
            Ok(mut raster) => {
                raster.reset_transform();
                self.raster = Some(raster);
                true
            }
            Err(err) => {
                log::debug!("2D context unavailable: {err}");
                false
            }
        }
    }

    /// [`Self::ensure_raster`], retrying once on a fresh surface.
    pub fn ensure_raster_ready(&mut self) -> bool {
        if self.ensure_raster() {
            return true;
        }
        if !self.recreate() {
            return false;
        }
        self.resize();
        self.ensure_raster()
    }

    /// Swap in a fresh unbound surface and drop the cached 2D context.
    pub fn recreate(&mut self) -> bool {
        let fresh = match self.surface.recreate() {
            Ok(fresh) => fresh,
            Err(err) => {
                log::warn!("Could not recreate surface: {err}");
                return false;
            }
        };
        let old = std::mem::replace(&mut self.surface, fresh);
        self.raster = None;
        if let Some(rebind) = self.rebind.as_mut() {
            rebind(&old, &self.surface);
        }
        true
    }

    /// Capture the pointer; failures and detached surfaces are ignored.
    pub fn capture_pointer(&self, pointer_id: i32) {
        if !self.surface.is_connected() {
            return;
        }
        if let Err(err) = self.surface.set_pointer_capture(pointer_id) {
            log::debug!("Ignoring pointer capture failure: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DrawCommand, HeadlessSurface};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_pixel_size_for() {
        assert_eq!(pixel_size_for(Size::new(100.5, 50.2), 2.0), (201, 100));
        assert_eq!(pixel_size_for(Size::new(0.0, 0.3), 1.0), (1, 1));
        assert_eq!(pixel_size_for(Size::new(333.0, 10.0), 1.5), (499, 15));
    }

    #[test]
    fn test_resize_sets_backing_store() {
        let mut slot = SurfaceSlot::new(HeadlessSurface::new(Size::new(300.0, 200.0), 2.0));
        let metrics = slot.resize();
        assert_eq!(metrics.pixel_size, (600, 400));
        assert_eq!(slot.surface().pixel_size(), (600, 400));
    }

    #[test]
    fn test_ensure_raster_resets_transform_and_caches() {
        let mut slot = SurfaceSlot::new(HeadlessSurface::new(Size::new(10.0, 10.0), 1.0));
        assert!(slot.ensure_raster());
        assert!(slot.ensure_raster());
        let raster = slot.raster().unwrap();
        assert_eq!(raster.commands(), &[DrawCommand::ResetTransform]);
        assert_eq!(slot.surface().raster_requests(), 1);
    }

    #[test]
    fn test_recreate_rebinds_and_invalidates() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut slot = SurfaceSlot::new(HeadlessSurface::new(Size::new(40.0, 30.0), 1.0));
        slot.resize();
        let log = seen.clone();
        slot.set_rebind_hook(Box::new(move |old: &HeadlessSurface, new: &HeadlessSurface| {
            log.borrow_mut().push((old.id(), new.id()));
        }));
        assert!(slot.ensure_raster());
        let old_id = slot.surface().id();

        assert!(slot.recreate());
        assert!(!slot.has_raster());
        assert_ne!(slot.surface().id(), old_id);
        assert_eq!(slot.surface().pixel_size(), (40, 30));
        assert_eq!(seen.borrow().as_slice(), &[(old_id, slot.surface().id())]);
    }

    #[test]
    fn test_ensure_raster_ready_recovers_from_gpu_binding() {
        let mut slot = SurfaceSlot::new(HeadlessSurface::new(Size::new(40.0, 30.0), 1.0));
        slot.surface().bind_gpu().unwrap();
        assert!(!slot.ensure_raster());
        assert!(slot.ensure_raster_ready());
        assert!(slot.has_raster());
    }

    #[test]
    fn test_capture_pointer_is_safe() {
        let mut slot = SurfaceSlot::new(HeadlessSurface::new(Size::new(40.0, 30.0), 1.0));
        slot.surface_mut().set_capture_fails(true);
        slot.capture_pointer(3);
        assert!(slot.surface().captured().is_empty());

        slot.surface_mut().set_capture_fails(false);
        slot.surface_mut().set_connected(false);
        slot.capture_pointer(4);
        assert!(slot.surface().captured().is_empty());

        slot.surface_mut().set_connected(true);
        slot.capture_pointer(5);
        assert_eq!(slot.surface().captured(), vec![5]);
    }
}
