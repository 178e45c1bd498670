/// Tuning knobs for a page's repaint pipeline.
///
/// Both values trade incremental-paint fidelity against compositor latency;
/// the defaults match what desktop compositors tolerate well.
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// How many completed render frames may sit in the backlog before the
    /// page gives up on incremental catch-up and falls back to a full
    /// repaint. Decode cost is roughly linear in the queued command volume,
    /// so the backlog must degrade to O(1) full repaints, not O(n) replay.
    pub frame_queue_capacity: usize,
    /// How far an invalidated rectangle is expanded on each side before the
    /// engine repaints it. Guards against anti-aliasing seams at the edges.
    pub repaint_margin: i32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: 10,   // Backlog bound before full-repaint fallback
            repaint_margin: 1,          // One pixel on every side
        }
    }
}
