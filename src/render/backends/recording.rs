use anyhow::Result;

use crate::geometry::Rect;
use crate::render::command::DrawCommand;
use crate::render::surface::{RenderSurface, SurfaceSize};

/// One operation applied to a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    SaveState,
    RestoreState,
    Clip(Rect),
    Draw(DrawCommand),
}

/// Surface that records the operations decoded onto it instead of painting.
///
/// The recorded stream preserves decode order, which is what distinguishes a
/// correct frame replay from a spatially re-sorted one. Intended for tests
/// and paint-pipeline debugging.
#[derive(Debug)]
pub struct RecordingSurface {
    size: SurfaceSize,
    ops: Vec<RecordedOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { size: SurfaceSize { width, height }, ops: Vec::new() }
    }

    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// The draw commands alone, in decode order.
    pub fn commands(&self) -> Vec<&DrawCommand> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Draw(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn save_state(&mut self) {
        self.ops.push(RecordedOp::SaveState);
    }

    fn restore_state(&mut self) {
        self.ops.push(RecordedOp::RestoreState);
    }

    fn clip(&mut self, rect: Rect) {
        self.ops.push(RecordedOp::Clip(rect));
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<()> {
        self.ops.push(RecordedOp::Draw(command.clone()));
        Ok(())
    }
}
