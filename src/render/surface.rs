use anyhow::Result;

use crate::geometry::Rect;
use crate::render::command::DrawCommand;

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Drawing target that render queues are decoded onto.
///
/// Calls occur on the thread that owns the surface; the page never retains a
/// reference beyond a single `paint`/`print` call.
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;

    /// Push the current drawing state (clip, transform).
    fn save_state(&mut self);

    /// Pop back to the state of the matching `save_state`.
    fn restore_state(&mut self);

    /// Intersect the current clip with `rect`.
    fn clip(&mut self, rect: Rect);

    fn draw(&mut self, command: &DrawCommand) -> Result<()>;
}

/// Double buffer owned by the page and kept in sync with the page size.
///
/// When a backbuffer is configured, queued frames are decoded into it and
/// only the requested region is flushed to the on-screen target. The
/// `CopyRegion` scroll blit relies on the buffer retaining its previous
/// contents between paints.
pub trait BackBuffer: Send {
    /// Bring the buffer to `width x height`. Returns `false` when the buffer
    /// had to be recreated and lost its contents; the caller must not decode
    /// incremental frames into it until a full repaint has been scheduled.
    fn validate(&mut self, width: i32, height: i32) -> bool;

    fn surface(&mut self) -> &mut dyn RenderSurface;

    /// Copy the finished region to the on-screen target.
    fn flush(&mut self, target: &mut dyn RenderSurface, rect: Rect) -> Result<()>;
}
