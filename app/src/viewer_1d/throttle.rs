use std::time::{Duration, Instant};

use super::view::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    at: Instant,
    transform: Transform,
}

/// Rate limiter for redraws. At most one deferred redraw is pending at
/// any time; it always carries the latest requested transform.
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    min_interval: Duration,
    last_redraw: Option<Instant>,
    pending: Option<Pending>,
}

impl RedrawThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_redraw: None,
            pending: None,
        }
    }

    pub fn last_redraw(&self) -> Option<Instant> {
        self.last_redraw
    }

    /// Firing time of the pending redraw, if any.
    pub fn pending_at(&self) -> Option<Instant> {
        self.pending.map(|p| p.at)
    }

    /// Called when the transform changes. Returns the transform to
    /// render right away, or `None` if the redraw was deferred.
    pub fn request(
        &mut self,
        now: Instant,
        transform: Transform,
    ) -> Option<Transform> {
        let ready = match self.last_redraw {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };

        if ready {
            self.pending = None;
            self.last_redraw = Some(now);
            return Some(transform);
        }

        match self.pending.as_mut() {
            Some(pending) => {
                pending.transform = transform;
            }
            None => {
                // `ready` is false, so there is a previous redraw
                let last = self.last_redraw.unwrap_or(now);
                let at = last + self.min_interval;
                log::debug!("redraw deferred by {:?}", at.saturating_duration_since(now));
                self.pending = Some(Pending { at, transform });
            }
        }

        None
    }

    /// Fires the pending redraw once its time has come.
    pub fn poll(&mut self, now: Instant) -> Option<Transform> {
        let pending = self.pending?;
        if now < pending.at {
            return None;
        }

        self.pending = None;
        self.last_redraw = Some(now);
        Some(pending.transform)
    }

    /// Records a redraw that happened outside of the throttle, dropping
    /// any pending one.
    pub fn mark_redrawn(&mut self, now: Instant) {
        self.pending = None;
        self.last_redraw = Some(now);
    }
}
