use crate::geometry::Rect;
use crate::render::queue::RenderQueue;

/// The render queues produced within one update cycle, plus the scroll delta
/// accumulated but not yet flushed during that cycle.
///
/// Queue order is generation order, not spatial order: later queues may
/// occlude earlier ones and must be decoded in order. A frame is built and
/// mutated on the content thread only, then moved into the frame queue; it
/// is never shared.
#[derive(Debug, Default)]
pub struct RenderFrame {
    queues: Vec<RenderQueue>,
    pub(crate) scroll_dx: i32,
    pub(crate) scroll_dy: i32,
    enclosing_rect: Rect,
}

impl RenderFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a queue, sealing it. Empty queues are discarded.
    pub fn add_render_queue(&mut self, mut rq: RenderQueue) {
        if rq.is_empty() {
            return;
        }
        rq.seal();
        let clip = rq.clip();
        if self.enclosing_rect.is_empty() {
            self.enclosing_rect = clip;
        } else if clip.is_empty() {
            // nothing to enclose
        } else {
            self.enclosing_rect = self.enclosing_rect.union(&clip);
        }
        self.queues.push(rq);
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn queues(&self) -> &[RenderQueue] {
        &self.queues
    }

    pub(crate) fn queues_mut(&mut self) -> &mut [RenderQueue] {
        &mut self.queues
    }

    /// Union of all attached queue clips.
    pub fn enclosing_rect(&self) -> Rect {
        self.enclosing_rect
    }

    pub fn scroll_delta(&self) -> (i32, i32) {
        (self.scroll_dx, self.scroll_dy)
    }

    /// Dispose every queue and reset to the empty state for reuse.
    pub fn drop_queues(&mut self) {
        for rq in &mut self.queues {
            rq.dispose();
        }
        self.queues.clear();
        self.enclosing_rect = Rect::EMPTY;
        self.scroll_dx = 0;
        self.scroll_dy = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::command::{Color, DrawCommand};

    fn queue_with_content(clip: Rect) -> RenderQueue {
        let mut rq = RenderQueue::new(clip, false);
        rq.push(DrawCommand::FillRect { rect: clip, color: Color::from_u8(255, 0, 0, 255) });
        rq
    }

    #[test]
    fn empty_queue_is_not_attached() {
        let mut frame = RenderFrame::new();
        frame.add_render_queue(RenderQueue::new(Rect::of_size(10, 10), false));
        assert!(frame.is_empty());
        assert!(frame.enclosing_rect().is_empty());
    }

    #[test]
    fn enclosing_rect_grows_with_queues() {
        let mut frame = RenderFrame::new();
        frame.add_render_queue(queue_with_content(Rect::new(0, 0, 10, 10)));
        assert_eq!(frame.enclosing_rect(), Rect::new(0, 0, 10, 10));

        frame.add_render_queue(queue_with_content(Rect::new(30, 0, 10, 10)));
        assert_eq!(frame.enclosing_rect(), Rect::new(0, 0, 40, 10));
    }

    #[test]
    fn drop_queues_resets_for_reuse() {
        let mut frame = RenderFrame::new();
        frame.add_render_queue(queue_with_content(Rect::new(0, 0, 10, 10)));
        frame.scroll_dx = 4;
        frame.scroll_dy = -2;

        frame.drop_queues();
        assert!(frame.is_empty());
        assert!(frame.enclosing_rect().is_empty());
        assert_eq!(frame.scroll_delta(), (0, 0));
    }
}
