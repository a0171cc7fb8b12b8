//! Pointer bookkeeping.
//!
//! [`PointerTracker`] owns the live set of active pointers and a bounded
//! position history for each of them. It applies no policy: recognizers and the
//! orchestrator read from it, and only the orchestrator writes to it between
//! recognition steps.
//!
//! Updates and removals for unknown pointer ids are ignored. Platform layers
//! routinely deliver a trailing move or up after the engine already forgot a
//! pointer, so these must never be fatal.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Vector};
use crate::logging::targets;

/// Default time window used for velocity estimation.
pub const DEFAULT_VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Default number of samples retained per pointer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Identifier the platform assigns to a contact for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerId(pub u32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The physical device behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    #[default]
    Touch,
    Mouse,
    Stylus,
}

/// Phase of a raw pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Contact started.
    Down,
    /// Contact moved.
    Move,
    /// Contact lifted.
    Up,
    /// The platform aborted the contact.
    Cancel,
    /// A hovering pointer (no contact) moved. Leaving every view is reported by
    /// hovering outside of them or by a cancel.
    Hover,
}

/// A raw pointer event as delivered by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: PointerId,
    pub kind: PointerKind,
    pub phase: PointerPhase,
    pub position: Point,
    /// Time since an arbitrary, monotonic epoch shared by all events.
    pub timestamp: Duration,
    /// Normalized pressure in `0.0..=1.0` when the device reports one.
    #[serde(default)]
    pub force: Option<f32>,
}

impl PointerEvent {
    /// Create a touch event without force data.
    pub fn new(
        pointer_id: u32,
        phase: PointerPhase,
        x: f32,
        y: f32,
        timestamp: Duration,
    ) -> Self {
        Self {
            pointer_id: PointerId(pointer_id),
            kind: PointerKind::Touch,
            phase,
            position: Point::new(x, y),
            timestamp,
            force: None,
        }
    }

    /// Set the device kind.
    pub fn with_kind(mut self, kind: PointerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach a force reading.
    pub fn with_force(mut self, force: f32) -> Self {
        self.force = Some(force);
        self
    }
}

/// One entry of a pointer's position history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Point,
    pub timestamp: Duration,
}

/// A tracked pointer.
#[derive(Debug, Clone)]
pub struct Pointer {
    id: PointerId,
    kind: PointerKind,
    position: Point,
    start_position: Point,
    start_time: Duration,
    timestamp: Duration,
    force: Option<f32>,
    history: VecDeque<Sample>,
}

impl Pointer {
    fn from_event(event: &PointerEvent, capacity: usize) -> Self {
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(Sample {
            position: event.position,
            timestamp: event.timestamp,
        });
        Self {
            id: event.pointer_id,
            kind: event.kind,
            position: event.position,
            start_position: event.position,
            start_time: event.timestamp,
            timestamp: event.timestamp,
            force: event.force,
            history,
        }
    }

    fn record(&mut self, event: &PointerEvent, capacity: usize) {
        self.position = event.position;
        self.timestamp = event.timestamp;
        if event.force.is_some() {
            self.force = event.force;
        }
        if self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(Sample {
            position: event.position,
            timestamp: event.timestamp,
        });
    }

    pub fn id(&self) -> PointerId {
        self.id
    }

    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    /// Latest known position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Position at which the pointer went down.
    pub fn start_position(&self) -> Point {
        self.start_position
    }

    /// Timestamp of the down event.
    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    /// Timestamp of the latest event.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Latest force reading, if the device ever reported one.
    pub fn force(&self) -> Option<f32> {
        self.force
    }

    /// Recorded samples, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Sample> {
        self.history.iter()
    }

    /// Estimate velocity with a least-squares line fit over the samples that lie
    /// within `window` of the newest sample.
    pub fn velocity(&self, window: Duration) -> Vector {
        let Some(newest) = self.history.back() else {
            return Vector::ZERO;
        };
        let horizon = newest.timestamp.saturating_sub(window);
        let newest = *newest;
        let samples: Vec<Sample> = self
            .history
            .iter()
            .filter(|s| s.timestamp >= horizon && s.timestamp <= newest.timestamp)
            .copied()
            .collect();
        if samples.len() < 2 {
            return Vector::ZERO;
        }

        // Times relative to the newest sample keep the sums well conditioned.
        let rel = |s: &Sample| -> f64 {
            -((newest.timestamp - s.timestamp).as_secs_f64())
        };
        let n = samples.len() as f64;
        let mean_t = samples.iter().map(|s| rel(s)).sum::<f64>() / n;
        let mean_x = samples.iter().map(|s| s.position.x as f64).sum::<f64>() / n;
        let mean_y = samples.iter().map(|s| s.position.y as f64).sum::<f64>() / n;

        let mut var_t = 0.0;
        let mut cov_x = 0.0;
        let mut cov_y = 0.0;
        for s in &samples {
            let dt = rel(s) - mean_t;
            var_t += dt * dt;
            cov_x += dt * (s.position.x as f64 - mean_x);
            cov_y += dt * (s.position.y as f64 - mean_y);
        }
        if var_t <= f64::EPSILON {
            return Vector::ZERO;
        }
        Vector::new((cov_x / var_t) as f32, (cov_y / var_t) as f32)
    }
}

/// A cheap copy of a tracked pointer without its history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSnapshot {
    pub id: PointerId,
    pub kind: PointerKind,
    pub position: Point,
    pub start_position: Point,
    pub timestamp: Duration,
    pub force: Option<f32>,
}

impl From<&Pointer> for PointerSnapshot {
    fn from(p: &Pointer) -> Self {
        Self {
            id: p.id,
            kind: p.kind,
            position: p.position,
            start_position: p.start_position,
            timestamp: p.timestamp,
            force: p.force,
        }
    }
}

/// Tracks active pointers in the order they went down.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    pointers: Vec<Pointer>,
    velocity_window: Duration,
    history_capacity: usize,
}

impl PointerTracker {
    /// Create a tracker with the default velocity window and history capacity.
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_VELOCITY_WINDOW, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a tracker with explicit settings. A capacity below two is raised
    /// to two so velocity can still be estimated.
    pub fn with_settings(velocity_window: Duration, history_capacity: usize) -> Self {
        Self {
            pointers: Vec::new(),
            velocity_window,
            history_capacity: history_capacity.max(2),
        }
    }

    /// Start tracking a pointer. A pointer already tracked is updated instead.
    ///
    /// Returns `true` if the pointer was not tracked before.
    pub fn add_pointer(&mut self, event: &PointerEvent) -> bool {
        let capacity = self.history_capacity;
        if let Some(p) = self.find_mut(event.pointer_id) {
            tracing::trace!(target: targets::TRACKER, id = %event.pointer_id, "duplicate add treated as update");
            p.record(event, capacity);
            return false;
        }
        self.pointers.push(Pointer::from_event(event, capacity));
        true
    }

    /// Record a new position for a tracked pointer. Unknown ids are ignored.
    ///
    /// Returns `true` if the pointer was tracked.
    pub fn update_pointer(&mut self, event: &PointerEvent) -> bool {
        let capacity = self.history_capacity;
        match self.find_mut(event.pointer_id) {
            Some(p) => {
                p.record(event, capacity);
                true
            }
            None => {
                tracing::trace!(target: targets::TRACKER, id = %event.pointer_id, "update for unknown pointer ignored");
                false
            }
        }
    }

    /// Stop tracking a pointer. Unknown ids are ignored.
    pub fn remove_pointer(&mut self, id: PointerId) -> Option<Pointer> {
        let index = self.pointers.iter().position(|p| p.id == id)?;
        Some(self.pointers.remove(index))
    }

    /// Forget every pointer.
    pub fn clear(&mut self) {
        self.pointers.clear();
    }

    pub fn get(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.get(id).is_some()
    }

    /// Number of active pointers.
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Active pointers in down order.
    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> {
        self.pointers.iter()
    }

    /// Ids of active pointers in down order.
    pub fn ids(&self) -> impl Iterator<Item = PointerId> + '_ {
        self.pointers.iter().map(|p| p.id)
    }

    /// Ordered copies of the active pointers.
    pub fn snapshot(&self) -> Vec<PointerSnapshot> {
        self.pointers.iter().map(PointerSnapshot::from).collect()
    }

    /// Velocity of a pointer in units per second. Zero for unknown ids or when
    /// fewer than two samples fall inside the window.
    pub fn velocity(&self, id: PointerId) -> Vector {
        self.get(id)
            .map(|p| p.velocity(self.velocity_window))
            .unwrap_or(Vector::ZERO)
    }

    /// Focal point of all active pointers.
    pub fn centroid(&self) -> Option<Point> {
        Point::centroid(self.pointers.iter().map(|p| p.position))
    }

    /// Focal point of all active pointers except `excluded`.
    pub fn centroid_excluding(&self, excluded: PointerId) -> Option<Point> {
        Point::centroid(
            self.pointers
                .iter()
                .filter(|p| p.id != excluded)
                .map(|p| p.position),
        )
    }

    pub fn velocity_window(&self) -> Duration {
        self.velocity_window
    }

    fn find_mut(&mut self, id: PointerId) -> Option<&mut Pointer> {
        self.pointers.iter_mut().find(|p| p.id == id)
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(PointerTracker: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn make_event(id: u32, phase: PointerPhase, x: f32, y: f32, t: u64) -> PointerEvent {
        PointerEvent::new(id, phase, x, y, ms(t))
    }

    // ===== Bookkeeping Tests =====

    #[test]
    fn test_add_and_snapshot_order() {
        let mut tracker = PointerTracker::new();
        assert!(tracker.add_pointer(&make_event(7, PointerPhase::Down, 1.0, 1.0, 0)));
        assert!(tracker.add_pointer(&make_event(3, PointerPhase::Down, 2.0, 2.0, 5)));

        let ids: Vec<_> = tracker.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PointerId(7), PointerId(3)]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_duplicate_add_updates() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        assert!(!tracker.add_pointer(&make_event(1, PointerPhase::Down, 4.0, 0.0, 10)));
        assert_eq!(tracker.len(), 1);
        let p = tracker.get(PointerId(1)).unwrap();
        assert_eq!(p.position(), Point::new(4.0, 0.0));
        assert_eq!(p.start_position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut tracker = PointerTracker::new();
        assert!(!tracker.update_pointer(&make_event(9, PointerPhase::Move, 1.0, 1.0, 0)));
        assert!(tracker.remove_pointer(PointerId(9)).is_none());
        assert!(tracker.is_empty());
        assert_eq!(tracker.velocity(PointerId(9)), Vector::ZERO);
    }

    #[test]
    fn test_remove_pointer() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        tracker.add_pointer(&make_event(2, PointerPhase::Down, 10.0, 0.0, 0));
        let removed = tracker.remove_pointer(PointerId(1)).unwrap();
        assert_eq!(removed.id(), PointerId(1));
        assert_eq!(tracker.ids().collect::<Vec<_>>(), vec![PointerId(2)]);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut tracker = PointerTracker::with_settings(ms(100), 4);
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        for i in 1..10 {
            tracker.update_pointer(&make_event(1, PointerPhase::Move, i as f32, 0.0, i * 10));
        }
        assert_eq!(tracker.get(PointerId(1)).unwrap().history().count(), 4);
    }

    #[test]
    fn test_centroid() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        tracker.add_pointer(&make_event(2, PointerPhase::Down, 10.0, 20.0, 0));
        assert_eq!(tracker.centroid(), Some(Point::new(5.0, 10.0)));
        assert_eq!(
            tracker.centroid_excluding(PointerId(2)),
            Some(Point::new(0.0, 0.0))
        );
    }

    // ===== Velocity Tests =====

    #[test]
    fn test_velocity_two_samples() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        tracker.update_pointer(&make_event(1, PointerPhase::Move, 10.0, 0.0, 100));

        let v = tracker.velocity(PointerId(1));
        assert!((v.dx - 100.0).abs() < 0.01);
        assert!(v.dy.abs() < 0.01);
    }

    #[test]
    fn test_velocity_single_sample_is_zero() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 5.0, 5.0, 0));
        assert_eq!(tracker.velocity(PointerId(1)), Vector::ZERO);
    }

    #[test]
    fn test_velocity_discards_old_samples() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        // Fast early motion falls out of the window.
        tracker.update_pointer(&make_event(1, PointerPhase::Move, 500.0, 0.0, 50));
        tracker.update_pointer(&make_event(1, PointerPhase::Move, 500.0, 0.0, 400));
        tracker.update_pointer(&make_event(1, PointerPhase::Move, 500.0, 20.0, 500));

        let v = tracker.velocity(PointerId(1));
        assert!(v.dx.abs() < 0.01);
        assert!((v.dy - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_velocity_linear_motion() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 0));
        for i in 1..=5u64 {
            tracker.update_pointer(&make_event(
                1,
                PointerPhase::Move,
                0.0,
                -(i as f32) * 5.0,
                i * 10,
            ));
        }
        let v = tracker.velocity(PointerId(1));
        assert!((v.dy + 500.0).abs() < 0.1);
    }

    #[test]
    fn test_velocity_same_timestamp_is_zero() {
        let mut tracker = PointerTracker::new();
        tracker.add_pointer(&make_event(1, PointerPhase::Down, 0.0, 0.0, 10));
        tracker.update_pointer(&make_event(1, PointerPhase::Move, 50.0, 0.0, 10));
        assert_eq!(tracker.velocity(PointerId(1)), Vector::ZERO);
    }
}
