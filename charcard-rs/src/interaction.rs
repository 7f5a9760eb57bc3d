//! Pointer and zoom interaction: a small state machine over the view transform.

use std::time::{Duration, Instant};

use crate::config::ThrottleConfig;
use crate::model::{Offset, Size, TransformState};
use crate::transform::{self, ZOOM_STEP};

/// Input device class; touch input repaints less often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    #[default]
    Mouse,
    Touch,
}

impl DeviceClass {
    pub fn throttle_interval(&self, config: &ThrottleConfig) -> Duration {
        match self {
            DeviceClass::Mouse => Duration::from_millis(config.mouse_ms),
            DeviceClass::Touch => Duration::from_millis(config.touch_ms),
        }
    }
}

/// Interaction phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    /// Zoom and upload controls are enabled; pointer down starts a drag.
    Configuring,
    Dragging(DragSession),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Pointer position at drag start.
    pub anchor: Offset,
    /// Pan at drag start.
    pub start_pan: Offset,
}

impl DragSession {
    fn candidate(&self, pointer: Offset) -> Offset {
        self.start_pan + (pointer - self.anchor)
    }
}

/// Side effects requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    /// Lock (or unlock) page scrolling while a drag is active.
    ViewportLock(bool),
    /// Repaint with this transform.
    Repaint { transform: TransformState, force: bool },
}

/// Coalesces bursts of values to at most one per interval.
///
/// The first value after a quiet period passes immediately. Values arriving
/// inside the interval replace each other, and the latest one is released by
/// [`Throttle::poll`] once the interval has elapsed.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_fired
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Offer a value; returns it if it may fire now.
    pub fn submit(&mut self, value: T, now: Instant) -> Option<T> {
        if self.ready(now) {
            self.last_fired = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the trailing value once the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.ready(now) {
            self.last_fired = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Translates taps, drags and zoom buttons into transform changes.
#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    transform: TransformState,
    throttle: Throttle<TransformState>,
}

impl InteractionController {
    pub fn new(device: DeviceClass, config: &ThrottleConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            transform: TransformState::default(),
            throttle: Throttle::new(device.throttle_interval(config)),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// The committed transform.
    pub fn transform(&self) -> TransformState {
        self.transform
    }

    pub fn is_configuring(&self) -> bool {
        !matches!(self.state, InteractionState::Idle)
    }

    /// Forget zoom and pan, as when the portrait source changes.
    pub fn reset_transform(&mut self) {
        self.transform = TransformState::default();
        self.throttle.cancel();
    }

    /// Replace the committed transform, e.g. with one restored by the host.
    pub fn set_transform(&mut self, transform: TransformState) {
        self.transform = transform;
        self.throttle.cancel();
    }

    /// Replace the committed pan, e.g. with the pan a paint actually applied.
    pub fn settle_pan(&mut self, pan: Offset) {
        self.transform.pan = Some(pan);
    }

    /// First tap enables configuration.
    pub fn tap(&mut self) {
        if self.state == InteractionState::Idle {
            log::debug!("Entering configure mode");
            self.state = InteractionState::Configuring;
        }
    }

    /// Leave configuration, abandoning any drag.
    pub fn exit_configure(&mut self) -> Vec<InteractionEvent> {
        let was_dragging = matches!(self.state, InteractionState::Dragging(_));
        self.state = InteractionState::Idle;
        self.throttle.cancel();
        if was_dragging {
            vec![InteractionEvent::ViewportLock(false)]
        } else {
            Vec::new()
        }
    }

    /// Start a drag. Ignored unless configuring.
    pub fn pointer_down(&mut self, pointer: Offset) -> Vec<InteractionEvent> {
        if self.state != InteractionState::Configuring {
            return Vec::new();
        }
        self.state = InteractionState::Dragging(DragSession {
            anchor: pointer,
            start_pan: self.transform.pan.unwrap_or_default(),
        });
        vec![InteractionEvent::ViewportLock(true)]
    }

    /// Move during a drag; emits a throttled repaint with the candidate pan.
    pub fn pointer_move(&mut self, pointer: Offset, now: Instant) -> Option<InteractionEvent> {
        let InteractionState::Dragging(session) = self.state else {
            return None;
        };
        let candidate = TransformState {
            zoom: self.transform.zoom,
            pan: Some(session.candidate(pointer)),
        };
        self.throttle
            .submit(candidate, now)
            .map(|transform| InteractionEvent::Repaint {
                transform,
                force: false,
            })
    }

    /// Release the trailing throttled repaint, if due.
    pub fn poll(&mut self, now: Instant) -> Option<InteractionEvent> {
        self.throttle
            .poll(now)
            .map(|transform| InteractionEvent::Repaint {
                transform,
                force: false,
            })
    }

    /// End a drag and commit the pan, clamped to `freedom` on each axis.
    pub fn pointer_up(&mut self, pointer: Offset, freedom: Offset) -> Vec<InteractionEvent> {
        let InteractionState::Dragging(session) = self.state else {
            return Vec::new();
        };
        let candidate = session.candidate(pointer);
        let (fx, fy) = (freedom.x.abs(), freedom.y.abs());
        let pan = Offset::new(candidate.x.clamp(-fx, fx), candidate.y.clamp(-fy, fy));
        self.transform.pan = Some(pan);
        self.state = InteractionState::Configuring;
        self.throttle.cancel();
        vec![
            InteractionEvent::ViewportLock(false),
            InteractionEvent::Repaint {
                transform: self.transform,
                force: false,
            },
        ]
    }

    /// Pointer left the surface mid-drag. Commits exactly like a release at
    /// the last known position.
    pub fn pointer_leave(&mut self, pointer: Offset, freedom: Offset) -> Vec<InteractionEvent> {
        self.pointer_up(pointer, freedom)
    }

    /// Zoom in one step. Unbounded.
    pub fn zoom_in(&mut self) -> InteractionEvent {
        self.transform.zoom = transform::zoom_in(self.transform.zoom);
        self.repaint()
    }

    /// Zoom out one step, flooring at `min_zoom` if the rendered image would
    /// stop covering the viewport.
    pub fn zoom_out(&mut self, rendered: Size, viewport: Size, min_zoom: f32) -> InteractionEvent {
        self.transform.zoom = transform::zoom_out(self.transform.zoom, rendered, viewport, min_zoom);
        self.repaint()
    }

    /// Back to zoom 1, centered, with a forced repaint.
    pub fn reset(&mut self) -> InteractionEvent {
        self.reset_transform();
        InteractionEvent::Repaint {
            transform: self.transform,
            force: true,
        }
    }

    fn repaint(&self) -> InteractionEvent {
        log::debug!("Zoom level {:.4} (step {})", self.transform.zoom, ZOOM_STEP);
        InteractionEvent::Repaint {
            transform: self.transform,
            force: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn controller() -> InteractionController {
        InteractionController::new(DeviceClass::Mouse, &ThrottleConfig::default())
    }

    #[rstest]
    #[case(DeviceClass::Mouse, 17)]
    #[case(DeviceClass::Touch, 33)]
    fn test_throttle_interval(#[case] device: DeviceClass, #[case] ms: u64) {
        assert_eq!(
            device.throttle_interval(&ThrottleConfig::default()),
            Duration::from_millis(ms)
        );
    }

    #[test]
    fn test_throttle_leading_and_trailing_latest_wins() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(17));
        assert_eq!(throttle.submit(1, start), Some(1));
        assert_eq!(throttle.submit(2, start + Duration::from_millis(5)), None);
        assert_eq!(throttle.submit(3, start + Duration::from_millis(9)), None);
        assert_eq!(throttle.poll(start + Duration::from_millis(10)), None);
        assert_eq!(throttle.poll(start + Duration::from_millis(17)), Some(3));
        assert!(!throttle.has_pending());
        assert_eq!(throttle.poll(start + Duration::from_millis(40)), None);
    }

    #[test]
    fn test_drag_requires_configure() {
        let mut ctl = controller();
        assert!(ctl.pointer_down(Offset::new(1.0, 1.0)).is_empty());
        assert_eq!(ctl.state(), InteractionState::Idle);
        ctl.tap();
        assert_eq!(
            ctl.pointer_down(Offset::new(1.0, 1.0)),
            vec![InteractionEvent::ViewportLock(true)]
        );
        assert!(matches!(ctl.state(), InteractionState::Dragging(_)));
    }

    #[test]
    fn test_drag_produces_candidate_and_clamps_on_release() {
        let start = Instant::now();
        let mut ctl = controller();
        ctl.tap();
        ctl.pointer_down(Offset::new(100.0, 100.0));

        let first = ctl.pointer_move(Offset::new(110.0, 95.0), start);
        assert_eq!(
            first,
            Some(InteractionEvent::Repaint {
                transform: TransformState {
                    zoom: 1.0,
                    pan: Some(Offset::new(10.0, -5.0)),
                },
                force: false,
            })
        );
        assert!(ctl
            .pointer_move(Offset::new(120.0, 95.0), start + Duration::from_millis(1))
            .is_none());
        // committed transform is untouched until release
        assert_eq!(ctl.transform(), TransformState::default());

        let events = ctl.pointer_up(Offset::new(900.0, 95.0), Offset::new(235.0, 0.0));
        assert_eq!(events[0], InteractionEvent::ViewportLock(false));
        assert_eq!(ctl.transform().pan, Some(Offset::new(235.0, 0.0)));
        assert_eq!(ctl.state(), InteractionState::Configuring);
        assert!(ctl.poll(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_second_drag_continues_from_committed_pan() {
        let mut ctl = controller();
        ctl.tap();
        ctl.pointer_down(Offset::new(0.0, 0.0));
        ctl.pointer_up(Offset::new(-20.0, 0.0), Offset::new(100.0, 100.0));
        ctl.pointer_down(Offset::new(50.0, 50.0));
        ctl.pointer_up(Offset::new(40.0, 60.0), Offset::new(100.0, 100.0));
        assert_eq!(ctl.transform().pan, Some(Offset::new(-30.0, 10.0)));
    }

    #[test]
    fn test_leave_ends_drag_like_release() {
        let mut ctl = controller();
        assert!(ctl
            .pointer_leave(Offset::new(5.0, 5.0), Offset::new(10.0, 10.0))
            .is_empty());

        ctl.tap();
        ctl.pointer_down(Offset::new(0.0, 0.0));
        let events = ctl.pointer_leave(Offset::new(-40.0, 3.0), Offset::new(25.0, 10.0));
        assert_eq!(events[0], InteractionEvent::ViewportLock(false));
        assert_eq!(ctl.transform().pan, Some(Offset::new(-25.0, 3.0)));
        assert_eq!(ctl.state(), InteractionState::Configuring);
        // a later move without a new pointer down does nothing
        assert!(ctl.pointer_move(Offset::new(0.0, 0.0), Instant::now()).is_none());
    }

    #[test]
    fn test_exit_configure_unlocks_viewport() {
        let mut ctl = controller();
        ctl.tap();
        ctl.pointer_down(Offset::default());
        assert_eq!(
            ctl.exit_configure(),
            vec![InteractionEvent::ViewportLock(false)]
        );
        assert_eq!(ctl.state(), InteractionState::Idle);
        assert!(ctl.exit_configure().is_empty());
    }

    #[test]
    fn test_reset_restores_default_and_forces() {
        let mut ctl = controller();
        ctl.zoom_in();
        ctl.settle_pan(Offset::new(4.0, 4.0));
        let event = ctl.reset();
        assert_eq!(
            event,
            InteractionEvent::Repaint {
                transform: TransformState::default(),
                force: true,
            }
        );
        assert_eq!(ctl.transform(), TransformState::default());
    }

    #[test]
    fn test_zoom_in_then_out() {
        let mut ctl = controller();
        ctl.zoom_in();
        ctl.zoom_in();
        assert!((ctl.transform().zoom - ZOOM_STEP * ZOOM_STEP).abs() < 1e-6);
        ctl.zoom_out(
            Size::new(2000.0, 1000.0),
            Size::new(500.0, 485.0),
            1.0,
        );
        assert!((ctl.transform().zoom - ZOOM_STEP).abs() < 1e-5);
        ctl.zoom_out(Size::new(970.0, 485.0), Size::new(500.0, 485.0), 1.0);
        assert_eq!(ctl.transform().zoom, 1.0);
    }
}
