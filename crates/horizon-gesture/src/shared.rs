//! A thread-safe handle to an orchestrator.
//!
//! The engine itself is single-threaded: one dispatch pass must finish before
//! the next starts. [`SharedOrchestrator`] serializes passes behind one mutex so
//! input can arrive from one thread while another registers or drops handlers.
//! Listeners run with the lock held and must not call back into the handle.

use std::sync::Arc;
use std::time::Duration;

use horizon_gesture_core::{HandlerState, PointerEvent};
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

use crate::composition::Gesture;
use crate::error::Result;
use crate::event::GestureEvent;
use crate::handler::{HandlerConfig, HandlerTag};
use crate::hit_test::{HitTest, ViewId, ViewTree};
use crate::orchestrator::InteractionOrchestrator;
use crate::relation::RelationKind;

/// A cloneable, lock-guarded [`InteractionOrchestrator`].
pub struct SharedOrchestrator<H = ViewTree> {
    inner: Arc<Mutex<InteractionOrchestrator<H>>>,
}

impl<H> Clone for SharedOrchestrator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: HitTest> SharedOrchestrator<H> {
    pub fn new(orchestrator: InteractionOrchestrator<H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(orchestrator)),
        }
    }

    /// Lock the orchestrator for several operations in a row.
    pub fn lock(&self) -> MutexGuard<'_, InteractionOrchestrator<H>> {
        self.inner.lock()
    }

    pub fn create(&self, view: ViewId, config: HandlerConfig) -> Result<HandlerTag> {
        self.inner.lock().create(view, config)
    }

    pub fn update(&self, tag: HandlerTag, delta: &Value) -> Result<Vec<GestureEvent>> {
        self.inner.lock().update(tag, delta)
    }

    pub fn drop_handler(&self, tag: HandlerTag) -> Vec<GestureEvent> {
        self.inner.lock().drop_handler(tag)
    }

    pub fn add_relation(&self, from: HandlerTag, to: HandlerTag, kind: RelationKind) -> Result<()> {
        self.inner.lock().add_relation(from, to, kind)
    }

    pub fn apply_composition(&self, gesture: &Gesture) -> Result<()> {
        self.inner.lock().apply_composition(gesture)
    }

    pub fn set_listener(
        &self,
        tag: HandlerTag,
        listener: impl FnMut(&GestureEvent) + Send + 'static,
    ) -> Result<()> {
        self.inner.lock().set_listener(tag, listener)
    }

    pub fn on_pointer_event(&self, event: PointerEvent) -> Vec<GestureEvent> {
        self.inner.lock().on_pointer_event(event)
    }

    pub fn advance_time(&self, now: Duration) -> Vec<GestureEvent> {
        self.inner.lock().advance_time(now)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.lock().next_deadline()
    }

    pub fn state(&self, tag: HandlerTag) -> Option<HandlerState> {
        self.inner.lock().state(tag)
    }
}

static_assertions::assert_impl_all!(SharedOrchestrator: Send, Sync, Clone);
