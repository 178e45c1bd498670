use std::cell::RefCell;

use log::{debug, trace};
use uuid::Uuid;

use crate::config::PageConfig;
use crate::engine::{NativeEngine, PageCallbacks};
use crate::errors::PageError;
use crate::event::PageEvent;
use crate::geometry::Rect;
use crate::render::{
    Admission, BackBuffer, DrawCommand, FrameQueue, RenderFrame, RenderQueue, RenderSurface,
};

pub mod lock;

mod dirty;
mod thread;

use dirty::DirtyRegion;
use lock::{PageLock, PageLockGuard};
use thread::{ContentThread, PageTask};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Observable counters for one page.
#[derive(Debug, Clone, Copy)]
pub struct PageStats {
    /// Completed `update_content` cycles.
    pub update_cycles: u64,
    /// Times the frame backlog forced the full-repaint fallback.
    pub frame_queue_overflows: u64,
    /// Outermost page-lock acquisitions (nested re-entries excluded).
    pub outer_lock_acquisitions: u64,
}

// State owned by the content thread but guarded by the page lock so that
// entry points from other threads stay serialized against it.
struct PageState {
    width: i32,
    height: i32,
    disposed: bool,
    dirty: DirtyRegion,
    current_frame: RenderFrame,
    update_cycle_id: u64,
    backbuffer: Option<Box<dyn BackBuffer>>,
}

// Everything behind the reentrant page lock. The engine sits in its own cell:
// a nested entry point that would need the engine while the engine is already
// on the stack (e.g. update_content from inside a paint callback) is detected
// by the failed borrow and skipped instead of aliasing it.
struct Guarded {
    state: RefCell<PageState>,
    engine: RefCell<Box<dyn NativeEngine>>,
}

/// One embedded page: the bridge between a native page-rendering engine and
/// the host compositor.
///
/// The page accumulates invalidated regions reported by the engine, turns
/// them into render-queue batches on [`update_content`](Page::update_content)
/// (content thread), and hands completed frames to
/// [`paint`](Page::paint) (render thread) through a bounded frame queue.
/// Every entry point takes the page-wide reentrant lock first; the engine is
/// allowed to call back into the page while a locked call is still on the
/// stack.
///
/// The thread that creates the page becomes its content thread.
pub struct Page {
    id: PageId,
    config: PageConfig,
    guarded: PageLock<Guarded>,
    frame_queue: FrameQueue,
    content: ContentThread,
}

impl Page {
    /// Create a page around a native engine.
    ///
    /// If `config` is `None`, [`PageConfig::default`] is used. A `backbuffer`
    /// enables blit scrolling and the resize-race recovery; without one the
    /// page decodes straight into the surface handed to `paint`.
    pub fn new(
        config: Option<PageConfig>,
        engine: Box<dyn NativeEngine>,
        backbuffer: Option<Box<dyn BackBuffer>>,
    ) -> Self {
        let config = config.unwrap_or_default();
        Self {
            id: PageId::new(),
            frame_queue: FrameQueue::new(config.frame_queue_capacity),
            config,
            guarded: PageLock::new(Guarded {
                state: RefCell::new(PageState {
                    width: 0,
                    height: 0,
                    disposed: false,
                    dirty: DirtyRegion::default(),
                    current_frame: RenderFrame::new(),
                    update_cycle_id: 0,
                    backbuffer,
                }),
                engine: RefCell::new(engine),
            }),
            content: ContentThread::bind_current(),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.guarded.lock().state.borrow().disposed
    }

    pub fn size(&self) -> (i32, i32) {
        let guard = self.guarded.lock();
        let state = guard.state.borrow();
        (state.width, state.height)
    }

    /// Id of the current update cycle; bumped by every `update_content` call.
    pub fn update_cycle_id(&self) -> u64 {
        self.guarded.lock().state.borrow().update_cycle_id
    }

    pub fn stats(&self) -> PageStats {
        PageStats {
            update_cycles: self.update_cycle_id(),
            frame_queue_overflows: self.frame_queue.overflow_count(),
            outer_lock_acquisitions: self.guarded.outer_acquisitions(),
        }
    }

    /// Resize the page.
    ///
    /// In response the engine will issue repaint requests, some of which may
    /// carry coordinates computed against the old scroll offset; the page
    /// invalidates the entire visible area instead of trusting them.
    pub fn set_bounds(&self, width: i32, height: i32) {
        let guard = self.guarded.lock();
        debug!("Page[{:?}]: set_bounds {}x{}", self.id, width, height);
        if guard.state.borrow().disposed {
            debug!("Page[{:?}]: set_bounds on a disposed page", self.id);
            return;
        }
        {
            let mut state = guard.state.borrow_mut();
            state.width = width;
            state.height = height;
        }
        if let Ok(mut engine) = guard.engine.try_borrow_mut() {
            engine.set_bounds(self, width, height);
        }
        self.repaint_all_locked(&guard);
    }

    /// Whether any invalidated region is waiting for the next update cycle.
    pub fn is_dirty(&self) -> bool {
        let guard = self.guarded.lock();
        let state = guard.state.borrow();
        !state.dirty.is_empty()
    }

    /// Whether completed frames are waiting for the renderer.
    pub fn is_repaint_pending(&self) -> bool {
        let _guard = self.guarded.lock();
        !self.frame_queue.is_empty()
    }

    /// Build and queue a render frame for `clip` (default: the full page).
    ///
    /// Content-thread entry point; also runs any work other threads have
    /// posted to the content thread. A re-entrant call from inside an engine
    /// callback does not deadlock; it is detected and ignored, the outer
    /// cycle is still collecting the same dirty state.
    pub fn update_content(&self, clip: Option<Rect>) {
        let guard = self.guarded.lock();
        self.run_posted_tasks_locked(&guard);

        {
            let mut state = guard.state.borrow_mut();
            state.update_cycle_id += 1;
            if state.disposed {
                debug!("Page[{:?}]: update_content on a disposed page", self.id);
                return;
            }
        }
        trace!("Page[{:?}]: update_content {:?}", self.id, clip);

        let Ok(mut engine) = guard.engine.try_borrow_mut() else {
            trace!("Page[{:?}]: re-entrant update_content ignored", self.id);
            return;
        };
        self.update_dirty(&guard, &mut **engine, clip);
        engine.update_rendering(self);
    }

    fn update_dirty(
        &self,
        guard: &PageLockGuard<'_, Guarded>,
        engine: &mut dyn NativeEngine,
        clip: Option<Rect>,
    ) {
        let (pending, clip) = {
            let mut state = guard.state.borrow_mut();
            trace!(
                "Page[{:?}]: update_dirty, {} pending rects",
                self.id,
                state.dirty.rects().len()
            );
            if state.disposed || state.width <= 0 || state.height <= 0 {
                // Whatever is pending refers to dimensions that no longer
                // exist; forget it so the host stops seeing the page dirty.
                state.dirty.clear();
                return;
            }
            let clip = clip.unwrap_or_else(|| Rect::of_size(state.width, state.height));
            (state.dirty.take(), clip)
        };

        engine.begin_paint_pass();
        for rect in pending {
            let rect = rect.intersection(&clip);
            if rect.is_empty() {
                continue;
            }
            trace!("Page[{:?}]: updating {:?}", self.id, rect);
            let mut rq = RenderQueue::new(rect, true);
            engine.paint_contents(self, &mut rq, rect.inflated(self.config.repaint_margin));
            guard.state.borrow_mut().current_frame.add_render_queue(rq);
        }
        {
            // Post-paint pass over the whole clip, above the page content.
            let mut rq = RenderQueue::new(clip, false);
            engine.paint_overlay(self, &mut rq, clip);
            guard.state.borrow_mut().current_frame.add_render_queue(rq);
        }

        let frame = {
            let mut state = guard.state.borrow_mut();
            if state.current_frame.is_empty() {
                return;
            }
            std::mem::take(&mut state.current_frame)
        };
        trace!(
            "Page[{:?}]: queueing frame enclosing {:?}",
            self.id,
            frame.enclosing_rect()
        );
        if let Admission::Overflowed = self.frame_queue.admit(frame) {
            self.repaint_all_locked(guard);
        }
    }

    /// Drain and decode every queued frame onto `surface`.
    ///
    /// Render-thread entry point. Frames decode in FIFO order and queues in
    /// insertion order; drawing state is saved and the queue clip applied
    /// around each queue. With a backbuffer configured, decoding goes into
    /// the buffer and only `rect` is flushed to `surface`; if the buffer
    /// fails to revalidate after a resize, painting is deferred and a full
    /// repaint is scheduled on the content thread instead.
    pub fn paint(&self, surface: &mut dyn RenderSurface, rect: Rect) -> Result<(), PageError> {
        let guard = self.guarded.lock();
        let mut state = guard.state.borrow_mut();
        let (width, height) = (state.width, state.height);
        if let Some(backbuffer) = state.backbuffer.as_mut() {
            if !backbuffer.validate(width, height) {
                debug!(
                    "Page[{:?}]: backbuffer lost on resize, deferring to a full repaint",
                    self.id
                );
                self.content.post(PageTask::RepaintAll);
                return Ok(());
            }
            self.paint_frames(backbuffer.surface())?;
            backbuffer.flush(surface, rect)?;
        } else {
            self.paint_frames(surface)?;
        }
        Ok(())
    }

    fn paint_frames(&self, surface: &mut dyn RenderSurface) -> Result<(), PageError> {
        let mut frames = self.frame_queue.drain();
        trace!("Page[{:?}]: painting {} frames", self.id, frames.len());
        for frame in &mut frames {
            for rq in frame.queues_mut() {
                surface.save_state();
                surface.clip(rq.clip());
                let decoded = rq.decode(surface);
                surface.restore_state();
                decoded?;
            }
        }
        Ok(())
    }

    /// Paint `clip` synchronously, bypassing the incremental pipeline.
    ///
    /// The drawing commands are produced on the content thread (inline when
    /// already there, otherwise posted and awaited on a completion latch)
    /// and decoded onto `surface` on the calling thread. The wait is
    /// unbounded; it relies on the content thread eventually running its
    /// posted work.
    pub fn print(&self, surface: &mut dyn RenderSurface, clip: Rect) -> Result<(), PageError> {
        let queue = if self.content.is_current() {
            let guard = self.guarded.lock();
            self.build_print_queue_locked(&guard, clip)
        } else {
            {
                let guard = self.guarded.lock();
                if guard.state.borrow().disposed {
                    return Ok(());
                }
            }
            let (reply, done) = ContentThread::latch();
            self.content.post(PageTask::Print { clip, reply });
            // Block until the content thread has produced the queue. The
            // page lock is NOT held here, the posted job takes it itself.
            match done.recv() {
                Ok(queue) => Some(queue),
                Err(_) => return Err(PageError::ContentThreadGone),
            }
        };

        match queue {
            Some(mut queue) => {
                queue.decode(surface)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn build_print_queue_locked(
        &self,
        guard: &PageLockGuard<'_, Guarded>,
        clip: Rect,
    ) -> Option<RenderQueue> {
        if guard.state.borrow().disposed {
            return None;
        }
        let Ok(mut engine) = guard.engine.try_borrow_mut() else {
            debug!("Page[{:?}]: print during an engine call ignored", self.id);
            return None;
        };
        let mut rq = RenderQueue::new(clip, true);
        engine.paint_contents(self, &mut rq, clip);
        rq.seal();
        Some(rq)
    }

    /// Forward an input event to the engine. Returns whether the engine
    /// consumed it; a disposed page consumes nothing.
    pub fn dispatch_event(&self, event: PageEvent) -> bool {
        let guard = self.guarded.lock();
        if guard.state.borrow().disposed {
            debug!("Page[{:?}]: event for a disposed page", self.id);
            return false;
        }
        let Ok(mut engine) = guard.engine.try_borrow_mut() else {
            trace!("Page[{:?}]: re-entrant event dispatch ignored", self.id);
            return false;
        };
        trace!("Page[{:?}]: dispatch {:?}", self.id, event);
        engine.handle_event(self, event)
    }

    /// Run any work other threads have posted to the content thread.
    ///
    /// `update_content` does this implicitly; hosts whose content thread can
    /// go long without update cycles should call it from their event loop.
    pub fn pump_tasks(&self) {
        let guard = self.guarded.lock();
        self.run_posted_tasks_locked(&guard);
    }

    fn run_posted_tasks_locked(&self, guard: &PageLockGuard<'_, Guarded>) {
        if !self.content.is_current() {
            return;
        }
        // Mid-engine-call (nested entry point): leave the mailbox alone,
        // the outermost cycle will drain it.
        if guard.engine.try_borrow_mut().is_err() {
            return;
        }
        while let Some(task) = self.content.try_next() {
            match task {
                PageTask::RepaintAll => self.repaint_all_locked(guard),
                PageTask::Print { clip, reply } => {
                    let queue = self.build_print_queue_locked(guard, clip).unwrap_or_else(|| {
                        // Disposed mid-wait: answer with an empty queue so
                        // the printer unblocks and decodes nothing.
                        let mut rq = RenderQueue::new(clip, true);
                        rq.seal();
                        rq
                    });
                    let _ = reply.send(queue);
                }
            }
        }
    }

    /// Mark the entire visible area as needing repaint.
    pub fn repaint_all(&self) {
        let guard = self.guarded.lock();
        if guard.state.borrow().disposed {
            return;
        }
        self.repaint_all_locked(&guard);
    }

    fn repaint_all_locked(&self, guard: &PageLockGuard<'_, Guarded>) {
        let mut state = guard.state.borrow_mut();
        let full = Rect::of_size(state.width, state.height);
        state.dirty.clear();
        state.dirty.add(full);
    }

    /// Drop the current frame and every queued frame without decoding them.
    pub fn drop_render_frames(&self) {
        let guard = self.guarded.lock();
        guard.state.borrow_mut().current_frame.drop_queues();
        self.frame_queue.drop_all();
    }

    /// Tear the page down. Every entry point afterwards is a safe no-op;
    /// native callbacks are allowed to race teardown.
    pub fn dispose(&self) {
        let guard = self.guarded.lock();
        if guard.state.borrow().disposed {
            return;
        }
        debug!("Page[{:?}]: dispose", self.id);
        {
            let mut state = guard.state.borrow_mut();
            state.disposed = true;
            state.dirty.clear();
            state.current_frame.drop_queues();
        }
        self.frame_queue.drop_all();
        if let Ok(mut engine) = guard.engine.try_borrow_mut() {
            engine.dispose();
        };
    }

    /// Bounding rectangle of the character at `index` in the focused
    /// editable text.
    ///
    /// Panics off the content thread: the selection state it reads is only
    /// coherent there.
    pub fn text_location(&self, index: usize) -> Rect {
        let guard = self.guarded.lock();
        if guard.state.borrow().disposed {
            debug!("Page[{:?}]: text_location on a disposed page", self.id);
            return Rect::EMPTY;
        }
        self.content.ensure_current("text_location");
        let result = match guard.engine.try_borrow_mut() {
            Ok(mut engine) => engine.text_location(index),
            Err(_) => Rect::EMPTY,
        };
        result
    }

    /// Text offset of the insertion point nearest to `(x, y)`.
    ///
    /// Panics off the content thread, like [`text_location`](Page::text_location).
    pub fn insertion_point_offset(&self, x: i32, y: i32) -> usize {
        let guard = self.guarded.lock();
        if guard.state.borrow().disposed {
            debug!("Page[{:?}]: insertion_point_offset on a disposed page", self.id);
            return 0;
        }
        self.content.ensure_current("insertion_point_offset");
        let result = match guard.engine.try_borrow_mut() {
            Ok(mut engine) => engine.insertion_point_offset(x, y),
            Err(_) => 0,
        };
        result
    }

    /// The engine changed something inside `rect`; remember it for the next
    /// update cycle. Callable from inside engine callbacks (the page lock is
    /// reentrant) as well as by the host.
    pub fn invalidate(&self, rect: Rect) {
        let guard = self.guarded.lock();
        if guard.state.borrow().disposed {
            return;
        }
        trace!("Page[{:?}]: invalidate {:?}", self.id, rect);
        guard.state.borrow_mut().dirty.add(rect);
    }

    /// A sub-rectangle of the page scrolled by `(dx, dy)`.
    ///
    /// With a backbuffer, a scroll smaller than the scrolled region turns
    /// into a `CopyRegion` blit plus dirty strips for the exposed edges;
    /// without one, blit scrolling is off and the engine's own invalidation
    /// covers the move.
    pub fn scroll_region(&self, rect: Rect, dx: i32, dy: i32) {
        let guard = self.guarded.lock();
        let mut state = guard.state.borrow_mut();
        if state.disposed {
            return;
        }
        trace!("Page[{:?}]: scroll {:?} delta ({}, {})", self.id, rect, dx, dy);
        if state.backbuffer.is_none() {
            trace!("Page[{:?}]: blit scrolling is switched off", self.id);
            return;
        }
        Self::scroll_locked(&mut state, rect, dx, dy);
    }

    fn scroll_locked(state: &mut PageState, rect: Rect, dx: i32, dy: i32) {
        let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
        let dx = dx + state.current_frame.scroll_dx;
        let dy = dy + state.current_frame.scroll_dy;

        if dx.abs() < w && dy.abs() < h {
            let cx = if dx >= 0 { x } else { x - dx };
            let cy = if dy >= 0 { y } else { y - dy };
            let cw = if dx == 0 { w } else { w - dx.abs() };
            let ch = if dy == 0 { h } else { h - dy.abs() };

            let mut rq = RenderQueue::new(Rect::of_size(state.width, state.height), false);
            rq.push(DrawCommand::CopyRegion { rect: Rect::new(cx, cy, cw, ch), dx, dy });
            // Queues built before the scroll describe pre-scroll coordinates;
            // the blit supersedes them.
            state.current_frame.drop_queues();
            state.current_frame.add_render_queue(rq);
            state.current_frame.scroll_dx = dx;
            state.current_frame.scroll_dy = dy;
            // Pending damage inside the region has already moved with the
            // content.
            state.dirty.translate_contained(rect, dx, dy);
        }

        // The strips the scroll exposed.
        state.dirty.add(Rect::new(x, if dy >= 0 { y } else { y + h + dy }, w, dy.abs()));
        state
            .dirty
            .add(Rect::new(if dx >= 0 { x } else { x + w + dx }, y, dx.abs(), h - dy.abs()));
    }
}

impl PageCallbacks for Page {
    fn invalidate(&self, rect: Rect) {
        Page::invalidate(self, rect);
    }

    fn scroll_region(&self, rect: Rect, dx: i32, dy: i32) {
        Page::scroll_region(self, rect, dx, dy);
    }
}
