//! Input events for the editing surface.

use serde::{Deserialize, Serialize};

use crate::Point;

/// Quiet period before a resize request is applied.
pub const RESIZE_DEBOUNCE_MS: u64 = 100;

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed (finger down).
    Down,
    /// Pointer dragged.
    Move,
    /// Button released (finger up).
    Up,
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position on the surface.
    pub x: f32,
    /// Y position on the surface.
    pub y: f32,
}

impl PointerEvent {
    /// Create a pointer event.
    #[must_use]
    pub const fn new(phase: PointerPhase, x: f32, y: f32) -> Self {
        Self { phase, x, y }
    }

    /// Screen position.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A resize request waiting for the quiet period to pass.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingResize {
    width: f32,
    height: f32,
    requested_at_ms: u64,
}

/// Coalesces bursts of container resize notifications.
///
/// Each request replaces the pending one; the last request is released once
/// no newer request has arrived for the quiet period. Timestamps come from
/// the caller so the debouncer works the same natively and in the browser.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet_ms: u64,
    pending: Option<PendingResize>,
}

impl ResizeDebouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            pending: None,
        }
    }

    /// Record a resize notification.
    pub fn request(&mut self, width: f32, height: f32, at_ms: u64) {
        self.pending = Some(PendingResize {
            width,
            height,
            requested_at_ms: at_ms,
        });
    }

    /// Take the pending size if the quiet period has elapsed at `now_ms`.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<(f32, f32)> {
        let pending = self.pending?;
        if now_ms.saturating_sub(pending.requested_at_ms) < self.quiet_ms {
            return None;
        }
        self.pending = None;
        Some((pending.width, pending.height))
    }

    /// Whether a request is waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any waiting request.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_last_request() {
        let mut debouncer = ResizeDebouncer::default();
        debouncer.request(100.0, 100.0, 0);
        debouncer.request(200.0, 150.0, 30);
        debouncer.request(300.0, 200.0, 60);

        assert!(debouncer.take_ready(100).is_none());
        assert_eq!(debouncer.take_ready(160), Some((300.0, 200.0)));
        assert!(!debouncer.is_pending());
        assert!(debouncer.take_ready(500).is_none());
    }

    #[test]
    fn cancel_drops_pending() {
        let mut debouncer = ResizeDebouncer::new(10);
        debouncer.request(1.0, 1.0, 0);
        debouncer.cancel();
        assert!(debouncer.take_ready(100).is_none());
    }

    #[test]
    fn pointer_event_serde_shape() {
        let event = PointerEvent::new(PointerPhase::Move, 3.0, 4.0);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"phase\":\"move\""));
    }
}
