use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::render::frame::RenderFrame;

/// Outcome of [`FrameQueue::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// The backlog exceeded its bound; every queued frame (including the one
    /// just admitted) was dropped. The producer must schedule a full repaint.
    Overflowed,
}

/// The bounded backlog of completed render frames awaiting the renderer.
///
/// Shared by the content thread (producer) and the render thread (consumer)
/// under its own mutex, deliberately distinct from the page-wide lock: the
/// render thread's drain must never wait out a long engine call.
pub struct FrameQueue {
    frames: Mutex<VecDeque<RenderFrame>>,
    capacity: usize,
    overflows: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::new()),
            capacity,
            overflows: AtomicU64::new(0),
        }
    }

    /// Queue a completed frame.
    ///
    /// Any already-queued frame whose enclosing rect is fully covered by an
    /// opaque queue of `frame` is dropped first; it can never be visible
    /// again. If the backlog then exceeds the bound, the whole queue is
    /// dropped instead of replayed.
    pub fn admit(&self, frame: RenderFrame) -> Admission {
        let mut frames = self.frames.lock();

        frames.retain_mut(|queued| {
            let occluded = frame
                .queues()
                .iter()
                .any(|rq| rq.is_opaque() && rq.clip().contains(&queued.enclosing_rect()));
            if occluded {
                trace!("dropping occluded frame enclosing {:?}", queued.enclosing_rect());
                queued.drop_queues();
            }
            !occluded
        });

        frames.push_back(frame);

        if frames.len() > self.capacity {
            debug!(
                "frame queue exceeded its bound of {}, clearing and requesting full repaint",
                self.capacity
            );
            for queued in frames.iter_mut() {
                queued.drop_queues();
            }
            frames.clear();
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return Admission::Overflowed;
        }

        Admission::Queued
    }

    /// Atomically remove and return every queued frame, oldest first.
    pub fn drain(&self) -> Vec<RenderFrame> {
        let mut frames = self.frames.lock();
        frames.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Dispose every queued frame without decoding it.
    pub fn drop_all(&self) {
        let mut frames = self.frames.lock();
        for queued in frames.iter_mut() {
            queued.drop_queues();
        }
        frames.clear();
    }

    /// How many times the backlog bound forced the full-repaint fallback.
    pub fn overflow_count(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::render::command::{Color, DrawCommand};
    use crate::render::queue::RenderQueue;

    fn frame_with_queue(clip: Rect, opaque: bool) -> RenderFrame {
        let mut rq = RenderQueue::new(clip, opaque);
        rq.push(DrawCommand::Clear { color: Color::from_u8(255, 255, 255, 255) });
        let mut frame = RenderFrame::new();
        frame.add_render_queue(rq);
        frame
    }

    #[test]
    fn admission_preserves_fifo_order() {
        let queue = FrameQueue::new(10);
        queue.admit(frame_with_queue(Rect::new(0, 0, 10, 10), false));
        queue.admit(frame_with_queue(Rect::new(20, 0, 10, 10), false));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].enclosing_rect(), Rect::new(0, 0, 10, 10));
        assert_eq!(drained[1].enclosing_rect(), Rect::new(20, 0, 10, 10));
        assert!(queue.is_empty());
    }

    #[test]
    fn opaque_cover_drops_older_frames() {
        let queue = FrameQueue::new(10);
        queue.admit(frame_with_queue(Rect::new(10, 10, 20, 20), false));
        queue.admit(frame_with_queue(Rect::new(0, 0, 100, 100), true));

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].enclosing_rect(), Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn translucent_cover_keeps_older_frames() {
        let queue = FrameQueue::new(10);
        queue.admit(frame_with_queue(Rect::new(10, 10, 20, 20), false));
        queue.admit(frame_with_queue(Rect::new(0, 0, 100, 100), false));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn overflow_drops_everything_and_counts() {
        let queue = FrameQueue::new(3);
        // Disjoint rects so occlusion pruning never kicks in.
        for i in 0..3 {
            let outcome = queue.admit(frame_with_queue(Rect::new(i * 20, 0, 10, 10), true));
            assert_eq!(outcome, Admission::Queued);
        }
        let outcome = queue.admit(frame_with_queue(Rect::new(500, 0, 10, 10), true));
        assert_eq!(outcome, Admission::Overflowed);
        assert!(queue.is_empty());
        assert_eq!(queue.overflow_count(), 1);
    }
}
