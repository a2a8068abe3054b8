use std::time::Instant;

use viewer_1d::InputEvent;

pub mod viewer_1d;

/// The interface a shell drives a viewer through. Time is passed in so
/// that redraw throttling does not depend on a real clock.
pub trait AppWindow {
    fn update(&mut self, now: Instant);

    fn on_event(&mut self, now: Instant, event: &InputEvent) -> bool;

    fn resize(
        &mut self,
        now: Instant,
        old_window_dims: [u32; 2],
        new_window_dims: [u32; 2],
    ) -> anyhow::Result<()>;

    fn render(&mut self, now: Instant) -> anyhow::Result<()>;
}
