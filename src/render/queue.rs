use log::warn;

use crate::geometry::Rect;
use crate::render::command::DrawCommand;
use crate::render::surface::RenderSurface;

/// Lifecycle of a render queue. A queue is built on the content thread,
/// sealed when it is attached to a frame, and then either decoded by exactly
/// one consumer or disposed unseen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueState {
    Building,
    Sealed,
    Decoded,
    Disposed,
}

/// An appendable batch of drawing commands scoped to one rectangular clip.
///
/// The `opaque` flag marks queues that fill their entire clip (background
/// fills); the frame queue uses it to prove that an older frame can never be
/// visible again. Queues are never shared between consumers: they move into
/// a [`RenderFrame`](crate::render::RenderFrame) and through the frame queue
/// by value.
#[derive(Debug)]
pub struct RenderQueue {
    clip: Rect,
    opaque: bool,
    state: QueueState,
    commands: Vec<DrawCommand>,
}

impl RenderQueue {
    pub fn new(clip: Rect, opaque: bool) -> Self {
        Self {
            clip,
            opaque,
            state: QueueState::Building,
            commands: Vec::new(),
        }
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Append one command. Ignored with a warning once the queue is sealed;
    /// a misbehaving engine must not mutate frames already handed off.
    pub fn push(&mut self, command: DrawCommand) {
        if self.state != QueueState::Building {
            warn!("push into a {:?} render queue ignored", self.state);
            return;
        }
        self.commands.push(command);
    }

    /// Close the queue for appends. No-op when already sealed.
    pub(crate) fn seal(&mut self) {
        if self.state == QueueState::Building {
            self.state = QueueState::Sealed;
        }
    }

    /// Replay the commands onto `surface`. Consumes the queue's content
    /// logically: a second decode is a logged no-op, never a double paint.
    pub fn decode(&mut self, surface: &mut dyn RenderSurface) -> anyhow::Result<()> {
        match self.state {
            QueueState::Sealed => {}
            state => {
                warn!("decode of a {:?} render queue ignored", state);
                return Ok(());
            }
        }
        self.state = QueueState::Decoded;
        for command in &self.commands {
            surface.draw(command)?;
        }
        Ok(())
    }

    /// Release the command storage. Safe to call at most once per queue;
    /// repeated disposal is a no-op.
    pub fn dispose(&mut self) {
        if self.state == QueueState::Disposed {
            return;
        }
        self.state = QueueState::Disposed;
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::recording::{RecordedOp, RecordingSurface};
    use crate::render::command::Color;

    fn cmd() -> DrawCommand {
        DrawCommand::Clear { color: Color::from_u8(0, 0, 0, 255) }
    }

    fn surface() -> RecordingSurface {
        RecordingSurface::new(10, 10)
    }

    #[test]
    fn push_after_seal_is_ignored() {
        let mut rq = RenderQueue::new(Rect::of_size(10, 10), true);
        rq.push(cmd());
        rq.seal();
        rq.push(cmd());
        assert_eq!(rq.commands.len(), 1);
    }

    #[test]
    fn decodes_exactly_once() {
        let mut rq = RenderQueue::new(Rect::of_size(10, 10), true);
        rq.push(cmd());
        rq.seal();

        let mut surface = surface();
        rq.decode(&mut surface).unwrap();
        rq.decode(&mut surface).unwrap(); // second decode must not repaint
        let draws = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Draw(_)))
            .count();
        assert_eq!(draws, 1);
    }

    #[test]
    fn unsealed_queue_does_not_decode() {
        let mut rq = RenderQueue::new(Rect::of_size(10, 10), true);
        rq.push(cmd());

        let mut surface = surface();
        rq.decode(&mut surface).unwrap();
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn dispose_clears_commands() {
        let mut rq = RenderQueue::new(Rect::of_size(10, 10), true);
        rq.push(cmd());
        rq.dispose();
        rq.dispose(); // idempotent
        assert!(rq.is_empty());
    }
}
