use anyhow::Result;

use crate::geometry::Rect;
use crate::render::command::DrawCommand;
use crate::render::surface::{RenderSurface, SurfaceSize};

/// Null surface that does not perform any rendering.
///
/// Useful as a placeholder target when a host wants the repaint pipeline to
/// run (dirty tracking, frame admission, backlog bounding) without producing
/// pixels.
pub struct NullSurface {
    size: SurfaceSize,
}

impl NullSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { size: SurfaceSize { width, height } }
    }
}

impl RenderSurface for NullSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn save_state(&mut self) {}

    fn restore_state(&mut self) {}

    fn clip(&mut self, _rect: Rect) {}

    fn draw(&mut self, _command: &DrawCommand) -> Result<()> {
        Ok(())
    }
}
