pub mod command;
pub mod frame;
pub mod frame_queue;
pub mod queue;
pub mod surface;

/// Rendering backends for the repaint pipeline.
pub mod backends {
    pub mod null;
    pub mod recording;
}

pub use command::{Color, DrawCommand};
pub use frame::RenderFrame;
pub use frame_queue::{Admission, FrameQueue};
pub use queue::RenderQueue;
pub use surface::{BackBuffer, RenderSurface, SurfaceSize};
