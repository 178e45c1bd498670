use crate::event::PageEvent;
use crate::geometry::Rect;
use crate::render::RenderQueue;

/// The embedded page-rendering engine, as the repaint core sees it.
///
/// Implementations are typically thin FFI shims over a native engine; the
/// core never depends on how commands are produced, only on the calls below.
/// All calls happen with the page lock held, on the content thread (with the
/// sole exception of `print`-driven `paint_contents`, which the page routes
/// to the content thread itself).
pub trait NativeEngine: Send {
    /// A paint pass is about to begin.
    fn begin_paint_pass(&mut self);

    /// Record drawing commands covering `rect` into `queue`.
    ///
    /// The engine may call back into `page` (invalidate, scroll) while
    /// recording; the page lock is reentrant for exactly this reason.
    fn paint_contents(&mut self, page: &dyn PageCallbacks, queue: &mut RenderQueue, rect: Rect);

    /// Record the post-paint overlay pass for `clip` (e.g. compositing
    /// overlays drawn above the page content).
    fn paint_overlay(&mut self, page: &dyn PageCallbacks, queue: &mut RenderQueue, clip: Rect);

    /// Advance engine-side rendering state at the end of an update cycle.
    fn update_rendering(&mut self, page: &dyn PageCallbacks);

    /// The page was resized by the host.
    fn set_bounds(&mut self, page: &dyn PageCallbacks, width: i32, height: i32);

    /// Process an input event; returns whether the engine consumed it.
    fn handle_event(&mut self, page: &dyn PageCallbacks, event: PageEvent) -> bool;

    /// Bounding rectangle of the character at `index` in the focused
    /// editable text. Reads live selection state: content thread only.
    fn text_location(&mut self, index: usize) -> Rect;

    /// Text offset of the insertion point nearest to the page-local point
    /// `(x, y)`. Reads live selection state: content thread only.
    fn insertion_point_offset(&mut self, x: i32, y: i32) -> usize;

    /// Release engine-side resources. Called once, from page teardown.
    fn dispose(&mut self);
}

/// The page as seen from inside a native-engine call.
///
/// These are the synchronous re-entry points the engine uses to report
/// damage while the page is already inside a locked section; both acquire
/// the (reentrant) page lock again.
pub trait PageCallbacks {
    /// The engine changed something inside `rect`; schedule a repaint.
    fn invalidate(&self, rect: Rect);

    /// A sub-rectangle of the page scrolled by `(dx, dy)`.
    fn scroll_region(&self, rect: Rect, dx: i32, dy: i32);
}
