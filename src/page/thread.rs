use std::thread::{self, ThreadId};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::geometry::Rect;
use crate::render::RenderQueue;

/// Work posted to the content thread by other threads.
pub(crate) enum PageTask {
    /// Invalidate the entire visible area on the next update cycle. Posted
    /// by the render thread when the backbuffer fails to revalidate.
    RepaintAll,
    /// Build an engine-drawn queue for `clip` and hand it back through
    /// `reply`. The poster blocks on the reply channel; dropping `reply`
    /// unanswered releases it with an error.
    Print { clip: Rect, reply: Sender<RenderQueue> },
}

/// Identity of the content/event thread, plus its task mailbox.
///
/// The content thread drives native-engine callbacks, dirty-region
/// accumulation and frame construction. Live text/selection state is only
/// coherent there, so the queries that read it assert the role; everything
/// else merely posts work and lets the content thread pick it up on its next
/// update cycle.
pub(crate) struct ContentThread {
    id: ThreadId,
    tx: Sender<PageTask>,
    rx: Receiver<PageTask>,
}

impl ContentThread {
    /// Binds the calling thread as the content thread.
    pub(crate) fn bind_current() -> Self {
        let (tx, rx) = unbounded();
        Self { id: thread::current().id(), tx, rx }
    }

    pub(crate) fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Contract check for operations that read live engine state. A wrong
    /// thread here is a programming error that would observe inconsistent
    /// state, so it aborts the caller instead of returning garbage.
    pub(crate) fn ensure_current(&self, operation: &str) {
        assert!(
            self.is_current(),
            "{operation} must run on the content thread (bound: {:?}, caller: {:?})",
            self.id,
            thread::current().id()
        );
    }

    pub(crate) fn post(&self, task: PageTask) {
        // The receiver lives in this struct, so the send cannot fail while
        // the page is alive.
        let _ = self.tx.send(task);
    }

    pub(crate) fn try_next(&self) -> Option<PageTask> {
        self.rx.try_recv().ok()
    }

    /// Rendezvous channel for a posted job's completion.
    pub(crate) fn latch() -> (Sender<RenderQueue>, Receiver<RenderQueue>) {
        bounded(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread as std_thread;

    #[test]
    fn binds_the_calling_thread() {
        let content = ContentThread::bind_current();
        assert!(content.is_current());

        let handle = std_thread::spawn(move || content.is_current());
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn tasks_arrive_in_post_order() {
        let content = ContentThread::bind_current();
        content.post(PageTask::RepaintAll);
        let (reply, _keep) = ContentThread::latch();
        content.post(PageTask::Print { clip: Rect::of_size(1, 1), reply });

        assert!(matches!(content.try_next(), Some(PageTask::RepaintAll)));
        assert!(matches!(content.try_next(), Some(PageTask::Print { .. })));
        assert!(content.try_next().is_none());
    }
}
