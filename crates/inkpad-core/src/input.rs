//! Pointer input and gesture arbitration.
//!
//! Raw [`PointerEvent`]s go through a [`GestureTracker`], which turns them
//! into taps, double-taps and pans. Timestamps travel with the events so the
//! arbitration is deterministic.

use crate::geometry::{distance_sq, is_finite_point, rect_contains};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Movement beyond this distance from the press turns it into a pan.
pub const TAP_SLOP: f64 = 10.0;

/// Maximum delay between two taps forming a double-tap.
pub const DOUBLE_TAP_TIME_MS: u64 = 300;

/// Maximum distance between two taps forming a double-tap.
pub const DOUBLE_TAP_DISTANCE: f64 = 15.0;

/// Pointer event for unified mouse/touch/stylus handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point, time_ms: u64 },
    Move { position: Point, time_ms: u64 },
    Up { position: Point, time_ms: u64 },
    /// The platform took the pointer away (e.g. a system gesture).
    Cancel { time_ms: u64 },
}

impl PointerEvent {
    pub fn time_ms(&self) -> u64 {
        match *self {
            PointerEvent::Down { time_ms, .. }
            | PointerEvent::Move { time_ms, .. }
            | PointerEvent::Up { time_ms, .. }
            | PointerEvent::Cancel { time_ms } => time_ms,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => Some(position),
            PointerEvent::Cancel { .. } => None,
        }
    }
}

/// A recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Tap { position: Point, time_ms: u64 },
    DoubleTap { position: Point, time_ms: u64 },
    PanStart { position: Point, time_ms: u64 },
    PanUpdate { position: Point, delta: Vec2, time_ms: u64 },
    PanEnd { position: Point, time_ms: u64 },
    PanCancel { time_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Contact {
    Idle,
    /// Pressed but not yet moved past the slop.
    Pressed { start: Point },
    Panning { last: Point },
    /// Started outside the page; swallowed until release.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTap {
    position: Point,
    time_ms: u64,
}

/// Tracks the current contact and the pending single tap.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    bounds: Option<Rect>,
    contact: Contact,
    pending_tap: Option<PendingTap>,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GestureTracker {
    /// Create a tracker. Presses outside `bounds` are ignored.
    pub fn new(bounds: Option<Rect>) -> Self {
        Self {
            bounds,
            contact: Contact::Idle,
            pending_tap: None,
        }
    }

    /// Whether a pan is in progress.
    pub fn is_panning(&self) -> bool {
        matches!(self.contact, Contact::Panning { .. })
    }

    /// Whether a single tap is waiting for a possible second tap.
    pub fn has_pending_tap(&self) -> bool {
        self.pending_tap.is_some()
    }

    /// Process a pointer event, appending recognized gestures to `out`.
    pub fn handle_pointer_event(&mut self, event: PointerEvent, out: &mut Vec<GestureEvent>) {
        if event.position().is_some_and(|p| !is_finite_point(p)) {
            log::trace!("dropping non-finite pointer event {event:?}");
            return;
        }

        match event {
            PointerEvent::Down { position, time_ms } => {
                if self.is_panning() {
                    // The previous contact never released
                    out.push(GestureEvent::PanCancel { time_ms });
                }
                self.expire_pending(time_ms, out);
                let inside = self.bounds.is_none_or(|b| rect_contains(b, position));
                self.contact = if inside {
                    Contact::Pressed { start: position }
                } else {
                    log::debug!("press at {position:?} is outside the page");
                    Contact::Ignored
                };
            }
            PointerEvent::Move { position, time_ms } => match self.contact {
                Contact::Pressed { start } => {
                    if distance_sq(start, position) > TAP_SLOP * TAP_SLOP {
                        // A pan means the pending tap cannot become a double-tap
                        self.flush_pending(out);
                        out.push(GestureEvent::PanStart { position: start, time_ms });
                        out.push(GestureEvent::PanUpdate { position, delta: position - start, time_ms });
                        self.contact = Contact::Panning { last: position };
                    }
                }
                Contact::Panning { last } => {
                    out.push(GestureEvent::PanUpdate { position, delta: position - last, time_ms });
                    self.contact = Contact::Panning { last: position };
                }
                Contact::Idle | Contact::Ignored => {}
            },
            PointerEvent::Up { position, time_ms } => {
                match self.contact {
                    Contact::Pressed { start } => self.register_tap(start, time_ms, out),
                    Contact::Panning { last } => {
                        if last != position {
                            out.push(GestureEvent::PanUpdate { position, delta: position - last, time_ms });
                        }
                        out.push(GestureEvent::PanEnd { position, time_ms });
                    }
                    Contact::Idle | Contact::Ignored => {}
                }
                self.contact = Contact::Idle;
            }
            PointerEvent::Cancel { time_ms } => {
                if self.is_panning() {
                    out.push(GestureEvent::PanCancel { time_ms });
                }
                self.contact = Contact::Idle;
            }
        }
    }

    /// Resolve a pending tap whose double-tap window has passed.
    pub fn poll(&mut self, now_ms: u64, out: &mut Vec<GestureEvent>) {
        self.expire_pending(now_ms, out);
    }

    fn register_tap(&mut self, position: Point, time_ms: u64, out: &mut Vec<GestureEvent>) {
        match self.pending_tap.take() {
            Some(first)
                if time_ms.saturating_sub(first.time_ms) <= DOUBLE_TAP_TIME_MS
                    && distance_sq(first.position, position) <= DOUBLE_TAP_DISTANCE * DOUBLE_TAP_DISTANCE =>
            {
                out.push(GestureEvent::DoubleTap { position, time_ms });
            }
            previous => {
                if let Some(first) = previous {
                    out.push(GestureEvent::Tap { position: first.position, time_ms: first.time_ms });
                }
                self.pending_tap = Some(PendingTap { position, time_ms });
            }
        }
    }

    fn expire_pending(&mut self, now_ms: u64, out: &mut Vec<GestureEvent>) {
        if let Some(pending) = self.pending_tap {
            if now_ms.saturating_sub(pending.time_ms) > DOUBLE_TAP_TIME_MS {
                self.flush_pending(out);
            }
        }
    }

    fn flush_pending(&mut self, out: &mut Vec<GestureEvent>) {
        if let Some(pending) = self.pending_tap.take() {
            out.push(GestureEvent::Tap { position: pending.position, time_ms: pending.time_ms });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tracker: &mut GestureTracker, events: &[PointerEvent]) -> Vec<GestureEvent> {
        let mut out = Vec::new();
        for e in events {
            tracker.handle_pointer_event(*e, &mut out);
        }
        out
    }

    fn down(x: f64, y: f64, t: u64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y), time_ms: t }
    }

    fn mv(x: f64, y: f64, t: u64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y), time_ms: t }
    }

    fn up(x: f64, y: f64, t: u64) -> PointerEvent {
        PointerEvent::Up { position: Point::new(x, y), time_ms: t }
    }

    #[test]
    fn test_tap_stays_pending_until_window_passes() {
        let mut tracker = GestureTracker::default();
        let out = run(&mut tracker, &[down(10.0, 10.0, 0), up(10.0, 10.0, 50)]);
        assert!(out.is_empty());
        assert!(tracker.has_pending_tap());

        let mut out = Vec::new();
        tracker.poll(300, &mut out);
        assert!(out.is_empty());
        tracker.poll(351, &mut out);
        assert_eq!(out, vec![GestureEvent::Tap { position: Point::new(10.0, 10.0), time_ms: 50 }]);
        assert!(!tracker.has_pending_tap());
    }

    #[test]
    fn test_double_tap() {
        let mut tracker = GestureTracker::default();
        let out = run(
            &mut tracker,
            &[down(10.0, 10.0, 0), up(10.0, 10.0, 40), down(14.0, 12.0, 150), up(14.0, 12.0, 200)],
        );
        assert_eq!(out, vec![GestureEvent::DoubleTap { position: Point::new(14.0, 12.0), time_ms: 200 }]);
        assert!(!tracker.has_pending_tap());
    }

    #[test]
    fn test_second_tap_too_far_is_two_taps() {
        let mut tracker = GestureTracker::default();
        let out = run(
            &mut tracker,
            &[down(10.0, 10.0, 0), up(10.0, 10.0, 40), down(60.0, 10.0, 150), up(60.0, 10.0, 200)],
        );
        assert_eq!(out, vec![GestureEvent::Tap { position: Point::new(10.0, 10.0), time_ms: 40 }]);
        assert!(tracker.has_pending_tap());
    }

    #[test]
    fn test_down_after_window_flushes_tap() {
        let mut tracker = GestureTracker::default();
        let out = run(&mut tracker, &[down(10.0, 10.0, 0), up(10.0, 10.0, 40), down(10.0, 10.0, 1000)]);
        assert_eq!(out, vec![GestureEvent::Tap { position: Point::new(10.0, 10.0), time_ms: 40 }]);
    }

    #[test]
    fn test_pan_after_slop() {
        let mut tracker = GestureTracker::default();
        let out = run(&mut tracker, &[down(0.0, 0.0, 0), mv(5.0, 0.0, 10), mv(20.0, 0.0, 20), mv(30.0, 0.0, 30), up(30.0, 0.0, 40)]);
        assert_eq!(
            out,
            vec![
                GestureEvent::PanStart { position: Point::new(0.0, 0.0), time_ms: 20 },
                GestureEvent::PanUpdate { position: Point::new(20.0, 0.0), delta: Vec2::new(20.0, 0.0), time_ms: 20 },
                GestureEvent::PanUpdate { position: Point::new(30.0, 0.0), delta: Vec2::new(10.0, 0.0), time_ms: 30 },
                GestureEvent::PanEnd { position: Point::new(30.0, 0.0), time_ms: 40 },
            ]
        );
        assert!(!tracker.is_panning());
    }

    #[test]
    fn test_small_wiggle_is_still_a_tap() {
        let mut tracker = GestureTracker::default();
        run(&mut tracker, &[down(0.0, 0.0, 0), mv(6.0, 6.0, 10), up(6.0, 6.0, 20)]);
        assert!(tracker.has_pending_tap());
    }

    #[test]
    fn test_cancel_during_pan() {
        let mut tracker = GestureTracker::default();
        let out = run(&mut tracker, &[down(0.0, 0.0, 0), mv(50.0, 0.0, 10), PointerEvent::Cancel { time_ms: 20 }]);
        assert_eq!(out.last(), Some(&GestureEvent::PanCancel { time_ms: 20 }));
        assert!(!tracker.is_panning());
    }

    #[test]
    fn test_down_during_pan_cancels_it() {
        let mut tracker = GestureTracker::default();
        let out = run(&mut tracker, &[down(0.0, 0.0, 0), mv(50.0, 0.0, 10), down(200.0, 200.0, 500)]);
        assert_eq!(out.last(), Some(&GestureEvent::PanCancel { time_ms: 500 }));
        assert!(!tracker.is_panning());

        let out = run(&mut tracker, &[up(200.0, 200.0, 510)]);
        assert!(out.is_empty());
        assert!(tracker.has_pending_tap());
    }

    #[test]
    fn test_press_outside_bounds_is_ignored() {
        let mut tracker = GestureTracker::new(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let out = run(&mut tracker, &[down(-5.0, 50.0, 0), mv(50.0, 50.0, 10), up(50.0, 50.0, 20)]);
        assert!(out.is_empty());
        assert!(!tracker.has_pending_tap());
    }

    #[test]
    fn test_non_finite_move_is_skipped() {
        let mut tracker = GestureTracker::default();
        let out = run(&mut tracker, &[down(0.0, 0.0, 0), mv(f64::NAN, 0.0, 5), mv(50.0, 0.0, 10)]);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], GestureEvent::PanStart { .. }));
    }

    #[test]
    fn test_pointer_event_json() {
        let json = r#"{"type":"down","position":{"x":1.0,"y":2.0},"time_ms":5}"#;
        let event: PointerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, down(1.0, 2.0, 5));
        assert_eq!(event.time_ms(), 5);
    }
}
