use ultraviolet::Vec2;

/// Pointer input on the viewer surface, positions in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Vec2 },
    PointerMove { pos: Vec2 },
    PointerUp { pos: Vec2 },
    /// Positive `delta` zooms out.
    Wheel { pos: Vec2, delta: f32 },
    Leave { pos: Vec2 },
}

impl InputEvent {
    pub fn pos(&self) -> Vec2 {
        match *self {
            InputEvent::PointerDown { pos }
            | InputEvent::PointerMove { pos }
            | InputEvent::PointerUp { pos }
            | InputEvent::Wheel { pos, .. }
            | InputEvent::Leave { pos } => pos,
        }
    }
}
