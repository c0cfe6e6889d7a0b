// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! The Surface trait abstracts the host drawing target the way an
//! adapter abstracts a rendering backend: the engine only ever talks
//! to this interface and the host decides what actually rasterizes.
//!
//! The engine never creates a real surface itself. Hosts hand one over
//! through a SurfaceProvider, and may hand over a fresh one after a
//! context loss. MemorySurface is an op-capturing target for tests and
//! headless runs; DetachedSurface is the zero-entity degraded mode
//! target used when no context can be acquired.

use crate::error::SplashError;
use crate::render::style::Rgba;
use crate::util::PointF32;

pub trait Surface {
    fn size(&self) -> (u32, u32);

    fn scale_factor(&self) -> f32 {
        1.0
    }

    /// Used only to shrink a destroyed scene's target to minimal size.
    /// Viewport changes recreate the surface through the provider
    /// instead of resizing in place.
    fn resize(&mut self, w: u32, h: u32);

    /// Translucent full-target fill; color.a is the fade strength.
    fn fade(&mut self, color: Rgba) -> Result<(), SplashError>;

    fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    ) -> Result<(), SplashError>;

    fn stroke_line(
        &mut self,
        a: PointF32,
        b: PointF32,
        width: f32,
        color: Rgba,
    ) -> Result<(), SplashError>;

    fn fill_circle(&mut self, center: PointF32, r: f32, color: Rgba) -> Result<(), SplashError>;

    fn fill_text(
        &mut self,
        ch: char,
        pos: PointF32,
        px: f32,
        color: Rgba,
    ) -> Result<(), SplashError>;
}

/// Hands surfaces to the orchestrator at startup, on viewport change
/// and on restoration after a loss.
pub trait SurfaceProvider {
    fn viewport(&self) -> (u32, u32);
    fn create(&mut self, w: u32, h: u32) -> Result<Box<dyn Surface>, SplashError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fade { color: Rgba },
    Rect { x: f32, y: f32, w: f32, h: f32, color: Rgba },
    Line { a: PointF32, b: PointF32, width: f32, color: Rgba },
    Circle { center: PointF32, r: f32, color: Rgba },
    Glyph { ch: char, pos: PointF32, px: f32, color: Rgba },
}

/// Records every draw op. Tests inspect the ops to assert what a frame
/// actually painted; take_ops() drains so long captures stay bounded.
pub struct MemorySurface {
    w: u32,
    h: u32,
    scale: f32,
    pub ops: Vec<DrawOp>,
}

impl MemorySurface {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            scale: 1.0,
            ops: Vec::new(),
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn line_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count()
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (u32, u32) {
        (self.w, self.h)
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn resize(&mut self, w: u32, h: u32) {
        self.w = w;
        self.h = h;
        self.ops.clear();
    }

    fn fade(&mut self, color: Rgba) -> Result<(), SplashError> {
        self.ops.push(DrawOp::Fade { color });
        Ok(())
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) -> Result<(), SplashError> {
        self.ops.push(DrawOp::Rect { x, y, w, h, color });
        Ok(())
    }

    fn stroke_line(
        &mut self,
        a: PointF32,
        b: PointF32,
        width: f32,
        color: Rgba,
    ) -> Result<(), SplashError> {
        self.ops.push(DrawOp::Line { a, b, width, color });
        Ok(())
    }

    fn fill_circle(&mut self, center: PointF32, r: f32, color: Rgba) -> Result<(), SplashError> {
        self.ops.push(DrawOp::Circle { center, r, color });
        Ok(())
    }

    fn fill_text(&mut self, ch: char, pos: PointF32, px: f32, color: Rgba) -> Result<(), SplashError> {
        self.ops.push(DrawOp::Glyph { ch, pos, px, color });
        Ok(())
    }
}

/// No-draw target for degraded mode: every op succeeds and paints
/// nothing, size stays minimal so nothing budgets entities against it.
pub struct DetachedSurface;

impl Surface for DetachedSurface {
    fn size(&self) -> (u32, u32) {
        (1, 1)
    }

    fn resize(&mut self, _w: u32, _h: u32) {}

    fn fade(&mut self, _color: Rgba) -> Result<(), SplashError> {
        Ok(())
    }

    fn fill_rect(
        &mut self,
        _x: f32,
        _y: f32,
        _w: f32,
        _h: f32,
        _color: Rgba,
    ) -> Result<(), SplashError> {
        Ok(())
    }

    fn stroke_line(
        &mut self,
        _a: PointF32,
        _b: PointF32,
        _width: f32,
        _color: Rgba,
    ) -> Result<(), SplashError> {
        Ok(())
    }

    fn fill_circle(&mut self, _center: PointF32, _r: f32, _color: Rgba) -> Result<(), SplashError> {
        Ok(())
    }

    fn fill_text(
        &mut self,
        _ch: char,
        _pos: PointF32,
        _px: f32,
        _color: Rgba,
    ) -> Result<(), SplashError> {
        Ok(())
    }
}

/// Provider over MemorySurface for tests and headless hosts.
pub struct MemoryProvider {
    pub w: u32,
    pub h: u32,
}

impl MemoryProvider {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

impl SurfaceProvider for MemoryProvider {
    fn viewport(&self) -> (u32, u32) {
        (self.w, self.h)
    }

    fn create(&mut self, w: u32, h: u32) -> Result<Box<dyn Surface>, SplashError> {
        Ok(Box::new(MemorySurface::new(w, h)))
    }
}

/// Provider that always fails; hosts without a drawing context get the
/// zero-entity degraded mode through this path.
pub struct UnavailableProvider;

impl SurfaceProvider for UnavailableProvider {
    fn viewport(&self) -> (u32, u32) {
        (0, 0)
    }

    fn create(&mut self, _w: u32, _h: u32) -> Result<Box<dyn Surface>, SplashError> {
        Err(SplashError::SurfaceUnavailable)
    }
}
