use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

bitflags! {
    pub struct Modifiers: u8 {
        const SHIFT   = 0b0001;
        const CONTROL = 0b0010;
        const ALT     = 0b0100;
        const META    = 0b1000;
    }
}

/// Input events forwarded to the native engine under the page lock.
///
/// Coordinates are page-local. Processing an event may cause the engine to
/// call back into the page (invalidate, scroll) before the dispatch returns.
#[derive(Debug, Clone)]
pub enum PageEvent {
    MouseMove { x: f32, y: f32 },
    MouseDown { button: MouseButton, x: f32, y: f32, modifiers: Modifiers },
    MouseUp { button: MouseButton, x: f32, y: f32, modifiers: Modifiers },
    Wheel { dx: f32, dy: f32, x: f32, y: f32 },
    KeyDown { key: String, modifiers: Modifiers },
    KeyUp { key: String, modifiers: Modifiers },
    InputChar { character: char },
}
