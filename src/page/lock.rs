use std::cell::Cell;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// The page-wide reentrant lock.
///
/// Serializes page mutation between the content thread, the render thread
/// and arbitrary caller threads. The native engine is allowed to call back
/// into the page while the page is already inside a locked section, so every
/// entry point takes this lock and nested acquisition by the owning thread
/// is a cheap no-op beyond a depth increment. Only the outermost
/// acquire/release pair does real synchronization work; those are counted
/// separately so instrumentation can tell contention from nesting.
///
/// Each page owns one `PageLock`; there is no process-global lock state.
pub struct PageLock<T> {
    inner: ReentrantMutex<Held<T>>,
    outer_acquisitions: AtomicU64,
}

struct Held<T> {
    depth: Cell<usize>,
    data: T,
}

pub struct PageLockGuard<'a, T> {
    guard: ReentrantMutexGuard<'a, Held<T>>,
}

impl<T> PageLock<T> {
    pub fn new(data: T) -> Self {
        Self {
            inner: ReentrantMutex::new(Held { depth: Cell::new(0), data }),
            outer_acquisitions: AtomicU64::new(0),
        }
    }

    pub fn lock(&self) -> PageLockGuard<'_, T> {
        let guard = self.inner.lock();
        let depth = guard.depth.get();
        guard.depth.set(depth + 1);
        if depth == 0 {
            self.outer_acquisitions.fetch_add(1, Ordering::Relaxed);
        }
        PageLockGuard { guard }
    }

    /// How many times the lock went from free to held.
    pub fn outer_acquisitions(&self) -> u64 {
        self.outer_acquisitions.load(Ordering::Relaxed)
    }
}

impl<T> PageLockGuard<'_, T> {
    /// Current nesting depth on the owning thread, this guard included.
    pub fn hold_depth(&self) -> usize {
        self.guard.depth.get()
    }
}

impl<T> Deref for PageLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard.data
    }
}

impl<T> Drop for PageLockGuard<'_, T> {
    fn drop(&mut self) {
        self.guard.depth.set(self.guard.depth.get() - 1);
    }
}
