//! The interaction orchestrator.
//!
//! [`InteractionOrchestrator`] owns every handler, the pointer-to-handler
//! routing and the relation graph. It is the only place handler state changes.
//! One call is one pass: the clock is advanced, the input is routed to the
//! handlers that own the pointer, waiting handlers are re-evaluated until
//! nothing changes, and the events of the pass are handed to listeners and
//! returned to the caller in emission order.
//!
//! The engine never reads wall-clock time. Pointer events carry their own
//! timestamps, and [`InteractionOrchestrator::advance_time`] lets the host fire
//! deadlines (tap timeouts, long-press activation) between events.

use std::collections::HashMap;
use std::mem;
use std::time::Duration;

use horizon_gesture_core::logging::{span_names, targets};
use horizon_gesture_core::{
    DeadlineQueue, EngineConfig, HandlerState, PerfSpan, Point, PointerEvent, PointerId, PointerPhase,
    PointerSnapshot, PointerTracker,
};
use serde_json::Value;
use slotmap::SlotMap;

use crate::composition::Gesture;
use crate::error::{GestureError, Result};
use crate::event::{GestureEvent, Listener, TouchEventKind};
use crate::handler::{
    BufferedInput, Decision, Handler, HandlerConfig, HandlerKind, HandlerTag, HitSlop,
    PointerAction, RecognizerConfig, StepContext,
};
use crate::hit_test::{HitTest, ViewId, ViewTree};
use crate::relation::{HandlerStates, Relation, RelationGraph, RelationKind, Verdict};

/// Episode states as seen by the relation graph.
struct Registry<'a>(&'a SlotMap<HandlerTag, Handler>);

impl HandlerStates for Registry<'_> {
    fn episode_state(&self, tag: HandlerTag) -> Option<HandlerState> {
        self.0
            .get(tag)
            .filter(|handler| handler.is_participating())
            .map(|handler| handler.state)
    }
}

fn touch_kind(action: PointerAction) -> Option<TouchEventKind> {
    match action {
        PointerAction::Down | PointerAction::Add => Some(TouchEventKind::Down),
        PointerAction::Move => Some(TouchEventKind::Move),
        PointerAction::Remove | PointerAction::Up => Some(TouchEventKind::Up),
        PointerAction::HoverEnter | PointerAction::HoverMove | PointerAction::HoverLeave => None,
    }
}

/// Routes pointer input to handlers and resolves their interactions.
pub struct InteractionOrchestrator<H = ViewTree> {
    config: EngineConfig,
    hit_tester: H,
    handlers: SlotMap<HandlerTag, Handler>,
    /// Handlers per view in registration order.
    by_view: HashMap<ViewId, Vec<HandlerTag>>,
    relations: RelationGraph,
    /// Every contact pointer currently down.
    tracker: PointerTracker,
    pointer_owners: HashMap<PointerId, Vec<HandlerTag>>,
    hover_owners: HashMap<PointerId, Vec<HandlerTag>>,
    deadlines: DeadlineQueue<HandlerTag>,
    listeners: HashMap<HandlerTag, Listener>,
    outbox: Vec<GestureEvent>,
    clock: Duration,
}

impl<H: HitTest> InteractionOrchestrator<H> {
    /// Create an orchestrator with the default engine configuration.
    pub fn new(hit_tester: H) -> Self {
        let config = EngineConfig::default();
        Self {
            tracker: config.tracker(),
            config,
            hit_tester,
            handlers: SlotMap::with_key(),
            by_view: HashMap::new(),
            relations: RelationGraph::new(),
            pointer_owners: HashMap::new(),
            hover_owners: HashMap::new(),
            deadlines: DeadlineQueue::new(),
            listeners: HashMap::new(),
            outbox: Vec::new(),
            clock: Duration::ZERO,
        }
    }

    /// Create an orchestrator with a validated engine configuration.
    pub fn with_config(hit_tester: H, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut orchestrator = Self::new(hit_tester);
        orchestrator.tracker = config.tracker();
        orchestrator.config = config;
        Ok(orchestrator)
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hit_tester(&self) -> &H {
        &self.hit_tester
    }

    /// Mutable access to the view layer, e.g. to move views between passes.
    pub fn hit_tester_mut(&mut self) -> &mut H {
        &mut self.hit_tester
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Attach a handler to `view`.
    pub fn create(&mut self, view: ViewId, config: HandlerConfig) -> Result<HandlerTag> {
        config.validate()?;
        let kind = config.kind();
        let tracker = self.config.tracker();
        let tag = self
            .handlers
            .insert_with_key(|tag| Handler::new(tag, view, config, tracker));
        self.by_view.entry(view).or_default().push(tag);
        tracing::debug!(target: targets::ORCHESTRATOR, %tag, %kind, %view, "handler created");
        Ok(tag)
    }

    /// Attach a handler described by a kind name and a camelCase JSON
    /// configuration object.
    pub fn create_from_json(&mut self, view: ViewId, kind: &str, config: &Value) -> Result<HandlerTag> {
        let kind: HandlerKind = kind.parse()?;
        let config = HandlerConfig::from_json(kind, config)?;
        self.create(view, config)
    }

    /// Merge a JSON delta into a handler's configuration.
    ///
    /// Unknown tags are ignored. Invalid deltas leave the handler unchanged.
    pub fn update(&mut self, tag: HandlerTag, delta: &Value) -> Result<Vec<GestureEvent>> {
        let Some(handler) = self.handlers.get(tag) else {
            tracing::warn!(target: targets::ORCHESTRATOR, %tag, "update for unknown handler ignored");
            return Ok(Vec::new());
        };
        let config = handler.config.merged(delta)?;
        self.set_config(tag, config)
    }

    /// Replace a handler's configuration. The recognizer keeps its in-flight
    /// accumulators; disabling a participating handler aborts it.
    pub fn set_config(&mut self, tag: HandlerTag, config: HandlerConfig) -> Result<Vec<GestureEvent>> {
        config.validate()?;
        let Some(handler) = self.handlers.get_mut(tag) else {
            tracing::warn!(target: targets::ORCHESTRATOR, %tag, "configuration for unknown handler ignored");
            return Ok(Vec::new());
        };
        handler.recognizer.reconfigure(&config.recognizer)?;
        let disabled = !config.common.enabled;
        handler.config = config;
        if disabled && handler.is_participating() {
            tracing::debug!(target: targets::ORCHESTRATOR, %tag, "handler disabled mid-gesture");
            self.abort(tag);
        }
        self.sync_deadline(tag);
        Ok(self.finish_pass())
    }

    /// Detach a handler, cancelling it first when it is mid-gesture.
    ///
    /// The handler's listener still receives the final events. Dropping an
    /// unknown or already dropped tag does nothing.
    pub fn drop_handler(&mut self, tag: HandlerTag) -> Vec<GestureEvent> {
        if !self.handlers.contains_key(tag) {
            tracing::warn!(target: targets::ORCHESTRATOR, %tag, "drop of unknown handler ignored");
            return Vec::new();
        }
        self.abort(tag);
        if let Some(handler) = self.handlers.remove(tag) {
            for pointer in &handler.owned {
                for owners in [&mut self.pointer_owners, &mut self.hover_owners] {
                    if let Some(tags) = owners.get_mut(pointer) {
                        tags.retain(|t| *t != tag);
                        if tags.is_empty() {
                            owners.remove(pointer);
                        }
                    }
                }
            }
            if let Some(id) = handler.deadline {
                self.deadlines.cancel(id);
            }
            if let Some(tags) = self.by_view.get_mut(&handler.view) {
                tags.retain(|t| *t != tag);
                if tags.is_empty() {
                    self.by_view.remove(&handler.view);
                }
            }
        }
        self.relations.remove_handler(tag);
        tracing::debug!(target: targets::ORCHESTRATOR, %tag, "handler dropped");

        let events = self.finish_pass();
        self.listeners.remove(&tag);
        events
    }

    fn ensure_exists(&self, tag: HandlerTag) -> Result<()> {
        if self.handlers.contains_key(tag) {
            Ok(())
        } else {
            Err(GestureError::UnknownHandler(tag))
        }
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Add one relation edge `from -kind-> to`.
    pub fn add_relation(&mut self, from: HandlerTag, to: HandlerTag, kind: RelationKind) -> Result<()> {
        self.ensure_exists(from)?;
        self.ensure_exists(to)?;
        self.relations.add_relation(Relation::new(from, to, kind))
    }

    /// Make every handler in `blocked` wait for `tag`.
    ///
    /// Either all edges are added or none.
    pub fn blocks_handlers(&mut self, tag: HandlerTag, blocked: &[HandlerTag]) -> Result<()> {
        self.ensure_exists(tag)?;
        let mut graph = self.relations.clone();
        for &other in blocked {
            self.ensure_exists(other)?;
            graph.add_relation(Relation::new(other, tag, RelationKind::WaitFor))?;
        }
        self.relations = graph;
        Ok(())
    }

    /// Install the relations a composition stands for.
    ///
    /// Either all edges are added or none.
    pub fn apply_composition(&mut self, gesture: &Gesture) -> Result<()> {
        for tag in gesture.handlers() {
            self.ensure_exists(tag)?;
        }
        let mut graph = self.relations.clone();
        for relation in gesture.relations() {
            graph.add_relation(relation)?;
        }
        self.relations = graph;
        Ok(())
    }

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Receive every event of `tag`, in emission order.
    pub fn set_listener(
        &mut self,
        tag: HandlerTag,
        listener: impl FnMut(&GestureEvent) + Send + 'static,
    ) -> Result<()> {
        self.ensure_exists(tag)?;
        self.listeners.insert(tag, Box::new(listener));
        Ok(())
    }

    pub fn remove_listener(&mut self, tag: HandlerTag) -> Option<Listener> {
        self.listeners.remove(&tag)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Process one pointer event.
    #[tracing::instrument(skip(self), target = "horizon_gesture::orchestrator", level = "trace")]
    pub fn on_pointer_event(&mut self, event: PointerEvent) -> Vec<GestureEvent> {
        let _perf = PerfSpan::new(span_names::DISPATCH);
        self.advance_clock(event.timestamp);
        self.settle();
        match event.phase {
            PointerPhase::Down => self.pointer_down(&event),
            PointerPhase::Move => self.pointer_move(&event),
            PointerPhase::Up => self.pointer_up(&event),
            PointerPhase::Cancel => self.pointer_cancel(&event),
            PointerPhase::Hover => self.hover(&event),
        }
        self.finish_pass()
    }

    pub fn on_pointer_down(&mut self, id: u32, x: f32, y: f32, timestamp: Duration) -> Vec<GestureEvent> {
        self.on_pointer_event(PointerEvent::new(id, PointerPhase::Down, x, y, timestamp))
    }

    pub fn on_pointer_move(&mut self, id: u32, x: f32, y: f32, timestamp: Duration) -> Vec<GestureEvent> {
        self.on_pointer_event(PointerEvent::new(id, PointerPhase::Move, x, y, timestamp))
    }

    pub fn on_pointer_up(&mut self, id: u32, x: f32, y: f32, timestamp: Duration) -> Vec<GestureEvent> {
        self.on_pointer_event(PointerEvent::new(id, PointerPhase::Up, x, y, timestamp))
    }

    /// Cancel a contact or hovering pointer at its last known position.
    pub fn on_pointer_cancel(&mut self, id: u32, timestamp: Duration) -> Vec<GestureEvent> {
        let id = PointerId(id);
        let position = self
            .tracker
            .get(id)
            .map(|p| p.position())
            .or_else(|| self.hover_position(id))
            .unwrap_or(Point::ZERO);
        self.on_pointer_event(PointerEvent::new(
            id.0,
            PointerPhase::Cancel,
            position.x,
            position.y,
            timestamp,
        ))
    }

    /// Hover pointers are tracked only by the handlers that own them.
    fn hover_position(&self, id: PointerId) -> Option<Point> {
        self.hover_owners.get(&id)?.iter().find_map(|tag| {
            self.handlers
                .get(*tag)?
                .tracker
                .get(id)
                .map(|p| p.position())
        })
    }

    /// A hovering pointer moved. A position outside every hover handler's
    /// view ends hovering for that pointer.
    pub fn on_hover(&mut self, id: u32, x: f32, y: f32, timestamp: Duration) -> Vec<GestureEvent> {
        self.on_pointer_event(PointerEvent::new(id, PointerPhase::Hover, x, y, timestamp))
    }

    /// Move the clock forward and fire the deadlines that came due.
    pub fn advance_time(&mut self, now: Duration) -> Vec<GestureEvent> {
        let _perf = PerfSpan::new(span_names::DEADLINES);
        self.advance_clock(now);
        self.finish_pass()
    }

    /// The earliest pending deadline, for hosts that schedule a wake-up.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.deadlines.next_deadline()
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    fn advance_clock(&mut self, now: Duration) {
        if now < self.clock {
            tracing::trace!(
                target: targets::ORCHESTRATOR,
                now = ?now,
                clock = ?self.clock,
                "timestamp behind the clock"
            );
        }
        self.clock = self.clock.max(now);
    }

    fn pointer_down(&mut self, event: &PointerEvent) {
        let id = event.pointer_id;
        if self.tracker.contains(id) {
            tracing::debug!(target: targets::ORCHESTRATOR, %id, "duplicate down treated as move");
            self.pointer_move(event);
            return;
        }
        if self.tracker.len() >= self.config.max_pointers {
            tracing::warn!(
                target: targets::ORCHESTRATOR,
                %id,
                max = self.config.max_pointers,
                "pointer limit reached, down ignored"
            );
            return;
        }
        self.tracker.add_pointer(event);

        let candidates = self.candidates(event.position, false);
        tracing::debug!(target: targets::ORCHESTRATOR, %id, ?candidates, "candidates");

        // Attach first so every candidate sees the others as participating.
        let mut deliveries = Vec::with_capacity(candidates.len());
        for tag in candidates {
            let Some(handler) = self.handlers.get_mut(tag) else {
                continue;
            };
            let action = if handler.owned.is_empty() {
                PointerAction::Down
            } else {
                PointerAction::Add
            };
            handler.owned.insert(id);
            handler.episode_pointers.insert(id);
            deliveries.push((tag, action));
        }
        if !deliveries.is_empty() {
            self.pointer_owners
                .insert(id, deliveries.iter().map(|(tag, _)| *tag).collect());
        }
        for (tag, action) in deliveries {
            self.deliver(tag, action, event);
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent) {
        if !self.tracker.update_pointer(event) {
            return;
        }
        let owners = self
            .pointer_owners
            .get(&event.pointer_id)
            .cloned()
            .unwrap_or_default();
        for tag in owners {
            self.deliver(tag, PointerAction::Move, event);
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent) {
        let id = event.pointer_id;
        if !self.tracker.update_pointer(event) {
            return;
        }
        let owners = self.pointer_owners.remove(&id).unwrap_or_default();
        for tag in owners {
            let Some(handler) = self.handlers.get_mut(tag) else {
                continue;
            };
            handler.owned.remove(&id);
            let action = if handler.owned.is_empty() {
                PointerAction::Up
            } else {
                PointerAction::Remove
            };
            self.deliver(tag, action, event);
        }
        self.tracker.remove_pointer(id);
    }

    fn pointer_cancel(&mut self, event: &PointerEvent) {
        let id = event.pointer_id;
        let contact = self.pointer_owners.remove(&id).unwrap_or_default();
        let hovering = self.hover_owners.remove(&id).unwrap_or_default();
        for tag in contact.into_iter().chain(hovering) {
            let Some(handler) = self.handlers.get_mut(tag) else {
                continue;
            };
            handler.owned.remove(&id);
            if handler.config.common.needs_pointer_data && !handler.state.is_finished() {
                if let Some(pointer) = self.tracker.get(id) {
                    let snapshot = vec![PointerSnapshot::from(pointer)];
                    self.outbox.push(GestureEvent::Touch {
                        tag,
                        kind: TouchEventKind::Cancelled,
                        changed: snapshot.clone(),
                        all: snapshot,
                        timestamp: self.clock,
                    });
                }
            }
            self.abort(tag);
        }
        self.tracker.remove_pointer(id);
    }

    fn hover(&mut self, event: &PointerEvent) {
        let id = event.pointer_id;
        let hits = self.candidates(event.position, true);
        let previous = self.hover_owners.remove(&id).unwrap_or_default();

        for &tag in previous.iter().filter(|tag| !hits.contains(tag)) {
            if let Some(handler) = self.handlers.get_mut(tag) {
                handler.owned.remove(&id);
            }
            self.deliver(tag, PointerAction::HoverLeave, event);
        }

        let mut current = Vec::with_capacity(hits.len());
        for tag in hits {
            let Some(handler) = self.handlers.get_mut(tag) else {
                continue;
            };
            let action = if previous.contains(&tag) {
                PointerAction::HoverMove
            } else {
                handler.owned.insert(id);
                handler.episode_pointers.insert(id);
                PointerAction::HoverEnter
            };
            current.push(tag);
            self.deliver(tag, action, event);
        }
        if !current.is_empty() {
            self.hover_owners.insert(id, current);
        }
    }

    /// Handlers a pointer at `position` attaches to: views from the hit test
    /// deepest first, then views only reached through a hit slop, each in
    /// registration order.
    fn candidates(&self, position: Point, hover: bool) -> Vec<HandlerTag> {
        let hits = self.hit_tester.hit_test(position);
        let mut slopped: Vec<ViewId> = self
            .by_view
            .keys()
            .filter(|view| !hits.contains(view))
            .copied()
            .collect();
        slopped.sort();

        let mut out = Vec::new();
        for view in hits.iter().copied().chain(slopped) {
            let inside = hits.contains(&view);
            let Some(tags) = self.by_view.get(&view) else {
                continue;
            };
            for &tag in tags {
                if self
                    .handlers
                    .get(tag)
                    .is_some_and(|handler| self.accepts(handler, position, inside, hover))
                {
                    out.push(tag);
                }
            }
        }
        out
    }

    fn accepts(&self, handler: &Handler, position: Point, inside: bool, hover: bool) -> bool {
        let common = &handler.config.common;
        if !common.enabled || handler.kind().is_hover() != hover || handler.state.is_finished() {
            return false;
        }
        if self.relations.has_predecessors(handler.tag) && !handler.armed {
            return false;
        }
        match &common.hit_slop {
            Some(slop) => self.within_slop(handler.view, slop, position),
            None => inside,
        }
    }

    fn within_slop(&self, view: ViewId, slop: &HitSlop, position: Point) -> bool {
        self.hit_tester
            .bounds(view)
            .is_some_and(|bounds| slop.apply(bounds).contains(position))
    }

    // =========================================================================
    // Recognition
    // =========================================================================

    fn deliver(&mut self, tag: HandlerTag, action: PointerAction, event: &PointerEvent) {
        let Some(handler) = self.handlers.get(tag) else {
            return;
        };
        if handler.state.is_finished() || !handler.config.common.enabled {
            return;
        }
        if handler.config.common.needs_pointer_data {
            if let Some(kind) = touch_kind(action) {
                self.emit_touch(tag, kind, event);
            }
        }

        if self.state(tag) == Some(HandlerState::Undetermined) {
            match self.relations.verdict(tag, &Registry(&self.handlers)) {
                Verdict::Wait => {
                    if let Some(handler) = self.handlers.get_mut(tag) {
                        handler.buffered.push(BufferedInput {
                            action,
                            event: *event,
                        });
                    }
                    tracing::debug!(target: targets::RELATION, %tag, ?action, "input buffered while waiting");
                    return;
                }
                Verdict::Fail => {
                    tracing::debug!(target: targets::RELATION, %tag, "blocking handler succeeded");
                    self.transition(tag, HandlerState::Failed);
                    return;
                }
                Verdict::Proceed => self.replay(tag),
            }
        }
        self.run_step(tag, action, event);
    }

    /// Run the input buffered while `tag` was waiting.
    fn replay(&mut self, tag: HandlerTag) {
        let Some(handler) = self.handlers.get_mut(tag) else {
            return;
        };
        let buffered = mem::take(&mut handler.buffered);
        if buffered.is_empty() {
            return;
        }
        tracing::debug!(target: targets::RELATION, %tag, count = buffered.len(), "replaying buffered input");
        for input in buffered {
            if self.state(tag).is_none_or(|state| state.is_finished()) {
                break;
            }
            self.run_step(tag, input.action, &input.event);
        }
    }

    fn run_step(&mut self, tag: HandlerTag, action: PointerAction, event: &PointerEvent) {
        let touch_slop = self.config.touch_slop;
        let Some((view, hit_slop)) = self
            .handlers
            .get(tag)
            .map(|handler| (handler.view, handler.config.common.hit_slop))
        else {
            return;
        };
        // The slop widens the view for the outside check as well.
        let inside = match &hit_slop {
            Some(slop) => self.within_slop(view, slop, event.position),
            None => self.hit_tester.contains(view, event.position),
        };

        let Some(handler) = self.handlers.get_mut(tag) else {
            return;
        };
        if action.is_press() {
            handler.tracker.add_pointer(event);
        } else {
            handler.tracker.update_pointer(event);
        }
        if handler.state == HandlerState::Undetermined {
            if !action.is_press() {
                tracing::trace!(target: targets::HANDLER, %tag, ?action, "input before begin ignored");
                return;
            }
            self.transition(tag, HandlerState::Began);
        }

        let Some(handler) = self.handlers.get_mut(tag) else {
            return;
        };
        let leaving = handler.config.common.should_cancel_when_outside
            && !inside
            && !action.is_release()
            && handler.state.is_in_progress();
        let was_active = handler.state == HandlerState::Active;
        let result = if leaving {
            tracing::debug!(target: targets::HANDLER, %tag, "pointer left the view");
            Ok(Decision::Fail)
        } else {
            let cx = StepContext {
                action,
                event,
                state: handler.state,
                tracker: &handler.tracker,
                touch_slop,
                inside,
            };
            handler.recognizer.step(&cx)
        };

        match result {
            Ok(decision) => {
                self.apply_decision(tag, decision);
                let moved = matches!(action, PointerAction::Move | PointerAction::HoverMove);
                if decision == Decision::Stay && was_active && moved {
                    self.emit_update(tag);
                }
            }
            Err(error) => {
                tracing::warn!(target: targets::HANDLER, %tag, %error, "recognizer step failed");
                self.outbox.push(GestureEvent::Error {
                    tag,
                    error,
                    timestamp: self.clock,
                });
                self.apply_decision(tag, Decision::Fail);
            }
        }

        if action.is_release() {
            if let Some(handler) = self.handlers.get_mut(tag) {
                handler.tracker.remove_pointer(event.pointer_id);
            }
        }
        self.sync_deadline(tag);
    }

    fn apply_decision(&mut self, tag: HandlerTag, decision: Decision) {
        let Some(handler) = self.handlers.get(tag) else {
            return;
        };
        let state = handler.state;
        let manual = handler.config.common.manual_activation;
        match decision {
            Decision::Stay => {}
            Decision::Activate | Decision::Complete => {
                let complete = decision == Decision::Complete;
                if state == HandlerState::Active {
                    if complete {
                        self.transition(tag, HandlerState::End);
                    }
                } else if manual {
                    tracing::trace!(target: targets::HANDLER, %tag, "activation left to the consumer");
                } else {
                    self.try_activate(tag, complete);
                }
            }
            Decision::End => match state {
                HandlerState::Active => self.transition(tag, HandlerState::End),
                HandlerState::Began | HandlerState::Undetermined => {
                    self.transition(tag, HandlerState::Failed)
                }
                _ => {}
            },
            Decision::Fail => match state {
                HandlerState::Active => self.transition(tag, HandlerState::Cancelled),
                HandlerState::Began | HandlerState::Undetermined => {
                    self.transition(tag, HandlerState::Failed)
                }
                _ => {}
            },
            Decision::Cancel => {
                if state.is_in_progress() {
                    self.transition(tag, HandlerState::Cancelled);
                }
            }
        }
    }

    fn try_activate(&mut self, tag: HandlerTag, complete: bool) {
        match self.relations.verdict(tag, &Registry(&self.handlers)) {
            Verdict::Fail => {
                tracing::debug!(target: targets::RELATION, %tag, "activation refused, blocking handler succeeded");
                self.transition(tag, HandlerState::Failed);
            }
            Verdict::Wait => {
                if let Some(handler) = self.handlers.get_mut(tag) {
                    let earlier = handler.pending_activation.unwrap_or(false);
                    handler.pending_activation = Some(earlier || complete);
                }
                tracing::debug!(target: targets::RELATION, %tag, "activation deferred");
            }
            Verdict::Proceed => self.commit_activation(tag, complete),
        }
    }

    fn commit_activation(&mut self, tag: HandlerTag, complete: bool) {
        let Some(handler) = self.handlers.get(tag) else {
            return;
        };
        if handler.state.is_finished() {
            return;
        }
        if let Some(blocker) = self.interruption_blocker(handler) {
            tracing::debug!(
                target: targets::ORCHESTRATOR,
                %tag,
                %blocker,
                "activation refused by a handler that disallows interruption"
            );
            self.transition(tag, HandlerState::Failed);
            return;
        }
        if handler.state == HandlerState::Undetermined {
            self.transition(tag, HandlerState::Began);
        }
        self.transition(tag, HandlerState::Active);
        self.cancel_competitors(tag);
        if complete {
            self.transition(tag, HandlerState::End);
        }
    }

    /// An active native handler on shared pointers that may not be interrupted.
    fn interruption_blocker(&self, handler: &Handler) -> Option<HandlerTag> {
        self.handlers
            .iter()
            .find(|(other_tag, other)| {
                *other_tag != handler.tag
                    && other.state == HandlerState::Active
                    && other.kind().is_hover() == handler.kind().is_hover()
                    && matches!(
                        &other.config.recognizer,
                        RecognizerConfig::Native(native) if native.disallow_interruption
                    )
                    && other.shares_pointers_with(handler)
                    && !self.relations.are_simultaneous(handler.tag, *other_tag)
            })
            .map(|(other_tag, _)| other_tag)
    }

    /// Fail or cancel every handler sharing pointers with the newly active
    /// `winner` that may not run alongside it.
    fn cancel_competitors(&mut self, winner: HandlerTag) {
        let Some(active) = self.handlers.get(winner) else {
            return;
        };
        let losers: Vec<(HandlerTag, HandlerState)> = self
            .handlers
            .iter()
            .filter(|(tag, other)| {
                *tag != winner
                    && other.is_participating()
                    && !other.state.is_finished()
                    && other.kind().is_hover() == active.kind().is_hover()
                    && other.shares_pointers_with(active)
                    && !self.relations.are_simultaneous(winner, *tag)
            })
            .map(|(tag, other)| (tag, other.state))
            .collect();

        for (loser, state) in losers {
            tracing::debug!(target: targets::ORCHESTRATOR, %winner, %loser, "exclusive activation");
            if state == HandlerState::Active {
                self.transition(loser, HandlerState::Cancelled);
            } else {
                self.transition(loser, HandlerState::Failed);
            }
        }
    }

    /// Commit a state change and emit its event.
    fn transition(&mut self, tag: HandlerTag, new_state: HandlerState) {
        let clock = self.clock;
        let Some(handler) = self.handlers.get_mut(tag) else {
            return;
        };
        let old_state = handler.state;
        if old_state == new_state {
            return;
        }
        if !old_state.can_transition_to(new_state) {
            tracing::warn!(
                target: targets::HANDLER,
                %tag,
                from = %old_state,
                to = %new_state,
                "illegal transition ignored"
            );
            return;
        }
        handler.state = new_state;
        tracing::trace!(target: targets::HANDLER, %tag, from = %old_state, to = %new_state, "state change");
        self.outbox.push(GestureEvent::StateChange {
            tag,
            old_state,
            new_state,
            timestamp: clock,
            number_of_pointers: handler.tracker.len(),
            payload: handler.recognizer.payload(&handler.tracker, clock),
        });

        if new_state.is_finished() {
            handler.pending_activation = None;
            handler.buffered.clear();
            if let Some(id) = handler.deadline.take() {
                self.deadlines.cancel(id);
            }
            if handler.config.common.needs_pointer_data && !handler.owned.is_empty() {
                let remaining: Vec<PointerSnapshot> = self
                    .tracker
                    .pointers()
                    .filter(|p| handler.owned.contains(&p.id()))
                    .map(PointerSnapshot::from)
                    .collect();
                if !remaining.is_empty() {
                    self.outbox.push(GestureEvent::Touch {
                        tag,
                        kind: TouchEventKind::Cancelled,
                        changed: remaining.clone(),
                        all: remaining,
                        timestamp: clock,
                    });
                }
            }
        }

        if new_state == HandlerState::End {
            for successor in self.relations.successors(tag) {
                if let Some(next) = self.handlers.get_mut(successor) {
                    next.armed = true;
                    tracing::debug!(target: targets::RELATION, %tag, %successor, "sequence armed");
                }
            }
        }

        if new_state.has_succeeded() {
            for dependent in self.relations.blocked_by(tag) {
                let waiting = self.handlers.get(dependent).is_some_and(|d| {
                    d.is_participating()
                        && matches!(d.state, HandlerState::Undetermined | HandlerState::Began)
                });
                if waiting {
                    tracing::debug!(target: targets::RELATION, %tag, %dependent, "blocking handler succeeded");
                    self.transition(dependent, HandlerState::Failed);
                }
            }
        }
    }

    /// Abort whatever `tag` is doing without a recognizer step.
    fn abort(&mut self, tag: HandlerTag) {
        match self.state(tag) {
            Some(HandlerState::Began | HandlerState::Active) => {
                self.transition(tag, HandlerState::Cancelled);
            }
            Some(HandlerState::Undetermined) => {
                if let Some(handler) = self.handlers.get_mut(tag) {
                    handler.reset();
                }
            }
            _ => {}
        }
    }

    fn emit_update(&mut self, tag: HandlerTag) {
        let Some(handler) = self.handlers.get(tag) else {
            return;
        };
        self.outbox.push(GestureEvent::Update {
            tag,
            state: handler.state,
            timestamp: self.clock,
            number_of_pointers: handler.tracker.len(),
            payload: handler.recognizer.payload(&handler.tracker, self.clock),
        });
    }

    fn emit_touch(&mut self, tag: HandlerTag, kind: TouchEventKind, event: &PointerEvent) {
        let Some(handler) = self.handlers.get(tag) else {
            return;
        };
        let Some(changed) = self.tracker.get(event.pointer_id).map(PointerSnapshot::from) else {
            return;
        };
        let all = self
            .tracker
            .pointers()
            .filter(|p| handler.owned.contains(&p.id()) || p.id() == event.pointer_id)
            .map(PointerSnapshot::from)
            .collect();
        self.outbox.push(GestureEvent::Touch {
            tag,
            kind,
            changed: vec![changed],
            all,
            timestamp: self.clock,
        });
    }

    /// Keep the queued deadline of `tag` in line with what its recognizer wants.
    fn sync_deadline(&mut self, tag: HandlerTag) {
        let Some(handler) = self.handlers.get_mut(tag) else {
            return;
        };
        let wanted = if handler.state.is_finished() {
            None
        } else {
            handler.recognizer.deadline()
        };
        if let Some(id) = handler.deadline {
            if wanted.is_some() && self.deadlines.fire_time(id) == wanted {
                return;
            }
            self.deadlines.cancel(id);
        }
        handler.deadline = wanted.map(|at| self.deadlines.schedule(at, tag));
    }

    // =========================================================================
    // Settling
    // =========================================================================

    /// Re-evaluate until no handler changes: fire due deadlines, release or
    /// fail handlers waiting on relations, and close episodes whose pointers
    /// are gone. Finished handlers without pointers then return to
    /// `UNDETERMINED`.
    fn settle(&mut self) {
        let _perf = PerfSpan::new(span_names::SETTLE);
        loop {
            let mut progressed = self.fire_deadlines();
            progressed |= self.resolve_waiting();
            progressed |= self.close_orphans();
            if !progressed {
                break;
            }
        }
        self.reset_idle();
    }

    fn fire_deadlines(&mut self) -> bool {
        let mut fired = false;
        loop {
            let expired = self.deadlines.pop_expired(self.clock);
            if expired.is_empty() {
                break;
            }
            for (id, at, tag) in expired {
                let Some(handler) = self.handlers.get_mut(tag) else {
                    continue;
                };
                if handler.deadline != Some(id) {
                    continue;
                }
                handler.deadline = None;
                let decision = handler.recognizer.on_deadline(at, handler.state);
                tracing::trace!(target: targets::DEADLINE, %tag, at = ?at, ?decision, "deadline fired");
                self.apply_decision(tag, decision);
                self.sync_deadline(tag);
                fired = true;
            }
        }
        fired
    }

    fn resolve_waiting(&mut self) -> bool {
        let waiting: Vec<HandlerTag> = self
            .handlers
            .iter()
            .filter(|(_, handler)| handler.is_blocked() || handler.pending_activation.is_some())
            .map(|(tag, _)| tag)
            .collect();
        if waiting.is_empty() {
            return false;
        }
        let resolution = self.relations.resolve(waiting, &Registry(&self.handlers));
        let mut progressed = false;

        for tag in resolution.must_fail {
            tracing::debug!(target: targets::RELATION, %tag, "blocking handler succeeded");
            self.transition(tag, HandlerState::Failed);
            progressed = true;
        }
        for tag in resolution.runnable {
            let Some(handler) = self.handlers.get_mut(tag) else {
                continue;
            };
            if handler.state.is_finished() {
                continue;
            }
            if handler.is_blocked() {
                self.replay(tag);
                progressed = true;
            } else if let Some(complete) = handler.pending_activation.take() {
                self.commit_activation(tag, complete);
                progressed = true;
            }
        }
        progressed
    }

    /// Handlers whose pointers all lifted without the recognizer closing the
    /// episode: a waiting `BEGAN` handler with nothing left to wait for fails,
    /// an `ACTIVE` one ends. An `ACTIVE` manual handler is left to the
    /// consumer.
    fn close_orphans(&mut self) -> bool {
        let orphans: Vec<(HandlerTag, HandlerState)> = self
            .handlers
            .iter()
            .filter(|(_, h)| {
                h.owned.is_empty() && h.buffered.is_empty() && !h.episode_pointers.is_empty()
            })
            .filter(|(_, h)| match h.state {
                HandlerState::Began => h.pending_activation.is_none() && h.deadline.is_none(),
                HandlerState::Active => h.kind() != HandlerKind::Manual,
                _ => false,
            })
            .map(|(tag, h)| (tag, h.state))
            .collect();

        for &(tag, state) in &orphans {
            tracing::debug!(target: targets::HANDLER, %tag, %state, "all pointers lifted");
            if state == HandlerState::Active {
                self.transition(tag, HandlerState::End);
            } else {
                self.transition(tag, HandlerState::Failed);
            }
        }
        !orphans.is_empty()
    }

    fn reset_idle(&mut self) {
        for (tag, handler) in self.handlers.iter_mut() {
            if !handler.owned.is_empty() || !handler.buffered.is_empty() {
                continue;
            }
            let finished = handler.state.is_finished();
            let stale = handler.state == HandlerState::Undetermined && !handler.episode_pointers.is_empty();
            if !finished && !stale {
                continue;
            }
            if finished && self.relations.has_predecessors(tag) {
                handler.armed = false;
            }
            tracing::trace!(target: targets::HANDLER, %tag, state = %handler.state, "handler reset");
            handler.reset();
        }
    }

    fn finish_pass(&mut self) -> Vec<GestureEvent> {
        self.settle();
        let events = mem::take(&mut self.outbox);
        for event in &events {
            if let Some(listener) = self.listeners.get_mut(&event.tag()) {
                listener(event);
            }
        }
        events
    }

    // =========================================================================
    // Manual state control
    // =========================================================================

    /// Move an `UNDETERMINED` handler to `BEGAN`.
    pub fn begin(&mut self, tag: HandlerTag) -> Vec<GestureEvent> {
        match self.state(tag) {
            None => return self.unknown(tag, "begin"),
            Some(HandlerState::Undetermined) => self.transition(tag, HandlerState::Began),
            Some(state) => {
                tracing::debug!(target: targets::HANDLER, %tag, %state, "begin ignored");
            }
        }
        self.finish_pass()
    }

    /// Request activation. Relations and exclusivity apply as for recognizer
    /// driven activation.
    pub fn activate(&mut self, tag: HandlerTag) -> Vec<GestureEvent> {
        match self.state(tag) {
            None => return self.unknown(tag, "activate"),
            Some(HandlerState::Undetermined | HandlerState::Began) => self.try_activate(tag, false),
            Some(state) => {
                tracing::debug!(target: targets::HANDLER, %tag, %state, "activate ignored");
            }
        }
        self.finish_pass()
    }

    /// Finish an `ACTIVE` handler. A `BEGAN` handler fails instead.
    pub fn end(&mut self, tag: HandlerTag) -> Vec<GestureEvent> {
        match self.state(tag) {
            None => return self.unknown(tag, "end"),
            Some(HandlerState::Active) => self.transition(tag, HandlerState::End),
            Some(HandlerState::Began) => self.transition(tag, HandlerState::Failed),
            Some(state) => {
                tracing::debug!(target: targets::HANDLER, %tag, %state, "end ignored");
            }
        }
        self.finish_pass()
    }

    /// Give up: `ACTIVE` handlers are cancelled, others fail.
    pub fn fail(&mut self, tag: HandlerTag) -> Vec<GestureEvent> {
        match self.state(tag) {
            None => return self.unknown(tag, "fail"),
            Some(HandlerState::Active) => self.transition(tag, HandlerState::Cancelled),
            Some(HandlerState::Undetermined | HandlerState::Began) => {
                self.transition(tag, HandlerState::Failed)
            }
            Some(state) => {
                tracing::debug!(target: targets::HANDLER, %tag, %state, "fail ignored");
            }
        }
        self.finish_pass()
    }

    fn unknown(&self, tag: HandlerTag, operation: &str) -> Vec<GestureEvent> {
        tracing::warn!(target: targets::ORCHESTRATOR, %tag, operation, "unknown handler");
        Vec::new()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self, tag: HandlerTag) -> Option<HandlerState> {
        self.handlers.get(tag).map(|handler| handler.state)
    }

    pub fn config(&self, tag: HandlerTag) -> Option<&HandlerConfig> {
        self.handlers.get(tag).map(|handler| &handler.config)
    }

    pub fn view(&self, tag: HandlerTag) -> Option<ViewId> {
        self.handlers.get(tag).map(|handler| handler.view)
    }

    pub fn contains(&self, tag: HandlerTag) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Handlers attached to `view`, in registration order.
    pub fn handlers_for_view(&self, view: ViewId) -> &[HandlerTag] {
        self.by_view.get(&view).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pointers attached to a handler.
    pub fn owned_pointers(&self, tag: HandlerTag) -> Vec<PointerId> {
        self.handlers
            .get(tag)
            .map(|handler| handler.owned.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Contact pointers currently down.
    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Plain-text table of every handler for debugging.
    pub fn debug_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{:<22} {:<11} {:<10} {:<13} pointers\n",
            "tag", "kind", "view", "state"
        ));
        for (tag, handler) in &self.handlers {
            let pointers: Vec<String> = handler.owned.iter().map(ToString::to_string).collect();
            output.push_str(&format!(
                "{:<22} {:<11} {:<10} {:<13} [{}]\n",
                tag.to_string(),
                handler.kind().name(),
                handler.view.to_string(),
                handler.state.name(),
                pointers.join(", ")
            ));
        }
        output
    }
}

impl Default for InteractionOrchestrator<ViewTree> {
    fn default() -> Self {
        Self::new(ViewTree::new())
    }
}

static_assertions::assert_impl_all!(InteractionOrchestrator: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::long_press::LongPressConfig;
    use crate::handler::pan::PanConfig;
    use crate::handler::tap::TapConfig;
    use horizon_gesture_core::{Rect, DEFAULT_MAX_POINTERS};
    use parking_lot::Mutex;
    use std::sync::Arc;

    const VIEW: ViewId = ViewId(1);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn make_orchestrator() -> InteractionOrchestrator {
        let mut tree = ViewTree::new();
        tree.insert(VIEW, None, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        InteractionOrchestrator::new(tree)
    }

    fn transitions(events: &[GestureEvent], tag: HandlerTag) -> Vec<HandlerState> {
        events
            .iter()
            .filter(|e| e.tag() == tag)
            .filter_map(GestureEvent::transition)
            .map(|(_, new)| new)
            .collect()
    }

    // ===== Dispatch Tests =====

    #[test]
    fn test_tap_lifecycle() {
        let mut orch = make_orchestrator();
        let tap = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();

        let down = orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        assert_eq!(transitions(&down, tap), vec![HandlerState::Began]);
        let up = orch.on_pointer_up(1, 11.0, 10.0, ms(50));
        assert_eq!(
            transitions(&up, tap),
            vec![HandlerState::Active, HandlerState::End]
        );
        assert_eq!(orch.state(tap), Some(HandlerState::Undetermined));
    }

    #[test]
    fn test_pointer_outside_views_reaches_nobody() {
        let mut orch = make_orchestrator();
        let tap = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        assert!(orch.on_pointer_down(1, 150.0, 10.0, ms(0)).is_empty());
        assert!(orch.on_pointer_up(1, 150.0, 10.0, ms(10)).is_empty());
        assert_eq!(orch.state(tap), Some(HandlerState::Undetermined));
    }

    #[test]
    fn test_unknown_pointer_ignored() {
        let mut orch = make_orchestrator();
        orch.create(VIEW, HandlerConfig::new(PanConfig::default())).unwrap();
        assert!(orch.on_pointer_move(7, 10.0, 10.0, ms(0)).is_empty());
        assert!(orch.on_pointer_up(7, 10.0, 10.0, ms(5)).is_empty());
        assert!(orch.on_pointer_cancel(7, ms(6)).is_empty());
        assert!(orch.tracker().is_empty());
    }

    #[test]
    fn test_duplicate_down_treated_as_move() {
        let mut orch = make_orchestrator();
        let pan = orch
            .create(VIEW, HandlerConfig::new(PanConfig::min_distance(10.0)))
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        let events = orch.on_pointer_down(1, 40.0, 10.0, ms(20));
        assert_eq!(transitions(&events, pan), vec![HandlerState::Active]);
        assert_eq!(orch.tracker().len(), 1);
    }

    #[test]
    fn test_pointer_limit() {
        let config = EngineConfig {
            max_pointers: 1,
            ..EngineConfig::default()
        };
        let mut tree = ViewTree::new();
        tree.insert(VIEW, None, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let mut orch = InteractionOrchestrator::with_config(tree, config).unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        orch.on_pointer_down(2, 20.0, 10.0, ms(5));
        assert_eq!(orch.tracker().len(), 1);
        assert_eq!(orch.engine_config().max_pointers, 1);
        assert_ne!(orch.engine_config().max_pointers, DEFAULT_MAX_POINTERS);
    }

    #[test]
    fn test_invalid_engine_config_rejected() {
        let config = EngineConfig {
            max_pointers: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            InteractionOrchestrator::with_config(ViewTree::new(), config),
            Err(GestureError::Engine(_))
        ));
    }

    // ===== Deadline Tests =====

    #[test]
    fn test_deadline_follows_recognizer() {
        let mut orch = make_orchestrator();
        orch.create(VIEW, HandlerConfig::new(LongPressConfig::default()))
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        assert_eq!(orch.next_deadline(), Some(ms(500)));
        orch.on_pointer_up(1, 10.0, 10.0, ms(100));
        assert_eq!(orch.next_deadline(), None);
    }

    #[test]
    fn test_advance_time_fires_long_press() {
        let mut orch = make_orchestrator();
        let press = orch
            .create(VIEW, HandlerConfig::new(LongPressConfig::default()))
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        assert!(orch.advance_time(ms(499)).is_empty());
        let fired = orch.advance_time(ms(500));
        assert_eq!(transitions(&fired, press), vec![HandlerState::Active]);
        assert_eq!(orch.clock(), ms(500));

        let up = orch.on_pointer_up(1, 10.0, 10.0, ms(700));
        assert_eq!(transitions(&up, press), vec![HandlerState::End]);
    }

    #[test]
    fn test_clock_never_goes_back() {
        let mut orch = make_orchestrator();
        orch.advance_time(ms(300));
        orch.advance_time(ms(100));
        assert_eq!(orch.clock(), ms(300));
    }

    // ===== Registration Tests =====

    #[test]
    fn test_create_from_json() {
        let mut orch = make_orchestrator();
        let tag = orch
            .create_from_json(VIEW, "TapGestureHandler", &serde_json::json!({ "numberOfTaps": 2 }))
            .unwrap();
        let Some(RecognizerConfig::Tap(config)) = orch.config(tag).map(|c| &c.recognizer) else {
            panic!("expected a tap configuration");
        };
        assert_eq!(config.number_of_taps, 2);
        assert_eq!(orch.handlers_for_view(VIEW), &[tag]);

        assert!(matches!(
            orch.create_from_json(VIEW, "swipe", &Value::Null),
            Err(GestureError::UnknownKind(_))
        ));
        assert_eq!(orch.len(), 1);
    }

    #[test]
    fn test_update_merges_delta() {
        let mut orch = make_orchestrator();
        let pan = orch.create(VIEW, HandlerConfig::new(PanConfig::default())).unwrap();
        orch.update(pan, &serde_json::json!({ "minDist": 25.0 })).unwrap();
        let Some(RecognizerConfig::Pan(config)) = orch.config(pan).map(|c| &c.recognizer) else {
            panic!("expected a pan configuration");
        };
        assert_eq!(config.min_dist, Some(25.0));
    }

    #[test]
    fn test_invalid_update_leaves_config() {
        let mut orch = make_orchestrator();
        let pan = orch
            .create(VIEW, HandlerConfig::new(PanConfig::min_distance(10.0)))
            .unwrap();
        let before = orch.config(pan).cloned();
        assert!(orch.update(pan, &serde_json::json!({ "minDist": -1.0 })).is_err());
        assert_eq!(orch.config(pan).cloned(), before);
    }

    #[test]
    fn test_update_unknown_tag_is_noop() {
        let mut orch = make_orchestrator();
        let tag = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        orch.drop_handler(tag);
        assert!(orch.update(tag, &serde_json::json!({})).unwrap().is_empty());
        assert!(orch.activate(tag).is_empty());
    }

    #[test]
    fn test_disable_mid_gesture_cancels() {
        let mut orch = make_orchestrator();
        let pan = orch
            .create(VIEW, HandlerConfig::new(PanConfig::min_distance(10.0)))
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        orch.on_pointer_move(1, 40.0, 10.0, ms(20));
        assert_eq!(orch.state(pan), Some(HandlerState::Active));

        let events = orch.update(pan, &serde_json::json!({ "enabled": false })).unwrap();
        assert_eq!(transitions(&events, pan), vec![HandlerState::Cancelled]);
        assert!(orch.on_pointer_move(1, 60.0, 10.0, ms(30)).is_empty());
    }

    #[test]
    fn test_hover_cancel_keeps_last_position() {
        let mut orch = make_orchestrator();
        let hover = orch
            .create(VIEW, HandlerConfig::default_for(HandlerKind::Hover))
            .unwrap();
        orch.on_hover(1, 30.0, 40.0, ms(0));
        assert_eq!(orch.state(hover), Some(HandlerState::Active));
        assert_eq!(orch.hover_position(PointerId(1)), Some(Point::new(30.0, 40.0)));

        let events = orch.on_pointer_cancel(1, ms(10));
        assert_eq!(transitions(&events, hover), vec![HandlerState::Cancelled]);
        let cancelled = events
            .iter()
            .find_map(|event| match event {
                GestureEvent::StateChange { tag, payload, .. } if *tag == hover => Some(payload.position()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cancelled, Point::new(30.0, 40.0));
        assert_eq!(orch.hover_position(PointerId(1)), None);
    }

    #[test]
    fn test_disabled_handler_not_a_candidate() {
        let mut orch = make_orchestrator();
        let tap = orch
            .create(VIEW, HandlerConfig::new(TapConfig::default()).enabled(false))
            .unwrap();
        assert!(orch.on_pointer_down(1, 10.0, 10.0, ms(0)).is_empty());
        assert!(orch.owned_pointers(tap).is_empty());
    }

    // ===== Relation Tests =====

    #[test]
    fn test_relation_to_unknown_handler() {
        let mut orch = make_orchestrator();
        let a = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        let b = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        orch.drop_handler(b);
        assert!(matches!(
            orch.add_relation(a, b, RelationKind::RequireToFail),
            Err(GestureError::UnknownHandler(tag)) if tag == b
        ));
        assert!(orch.relations().is_empty());
    }

    #[test]
    fn test_blocks_handlers_is_atomic() {
        let mut orch = make_orchestrator();
        let a = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        let b = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        let c = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        orch.add_relation(a, c, RelationKind::RequireToFail).unwrap();

        // c waiting on a would close a cycle, so b must not be installed either.
        let err = orch.blocks_handlers(a, &[b, c]).unwrap_err();
        assert!(matches!(err, GestureError::CyclicRelation { .. }));
        assert_eq!(orch.relations().len(), 1);

        orch.blocks_handlers(a, &[b]).unwrap();
        assert_eq!(orch.relations().blocked_by(a), vec![b]);
    }

    // ===== Manual Control Tests =====

    #[test]
    fn test_manual_handler_waits_for_consumer() {
        let mut orch = make_orchestrator();
        let manual = orch
            .create(VIEW, HandlerConfig::default_for(HandlerKind::Manual))
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        assert_eq!(orch.state(manual), Some(HandlerState::Began));

        let active = orch.activate(manual);
        assert_eq!(transitions(&active, manual), vec![HandlerState::Active]);

        assert!(transitions(&orch.on_pointer_up(1, 10.0, 10.0, ms(100)), manual).is_empty());
        assert_eq!(orch.state(manual), Some(HandlerState::Active));

        let ended = orch.end(manual);
        assert_eq!(transitions(&ended, manual), vec![HandlerState::End]);
        assert_eq!(orch.state(manual), Some(HandlerState::Undetermined));
    }

    #[test]
    fn test_manual_handler_fails_when_pointers_lift() {
        let mut orch = make_orchestrator();
        let manual = orch
            .create(VIEW, HandlerConfig::default_for(HandlerKind::Manual))
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        assert_eq!(orch.state(manual), Some(HandlerState::Began));

        let up = orch.on_pointer_up(1, 10.0, 10.0, ms(100));
        assert_eq!(transitions(&up, manual), vec![HandlerState::Failed]);
        assert_eq!(orch.state(manual), Some(HandlerState::Undetermined));

        let down = orch.on_pointer_down(1, 10.0, 10.0, ms(6000));
        assert_eq!(transitions(&down, manual), vec![HandlerState::Began]);
    }

    #[test]
    fn test_manual_activation_flag() {
        let mut orch = make_orchestrator();
        let pan = orch
            .create(
                VIEW,
                HandlerConfig::new(PanConfig::min_distance(10.0)).manual_activation(true),
            )
            .unwrap();
        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        orch.on_pointer_move(1, 60.0, 10.0, ms(20));
        assert_eq!(orch.state(pan), Some(HandlerState::Began));

        orch.activate(pan);
        assert_eq!(orch.state(pan), Some(HandlerState::Active));
        orch.fail(pan);
        assert_eq!(orch.state(pan), Some(HandlerState::Cancelled));
    }

    #[test]
    fn test_begin_only_from_undetermined() {
        let mut orch = make_orchestrator();
        let manual = orch
            .create(VIEW, HandlerConfig::default_for(HandlerKind::Manual))
            .unwrap();
        assert_eq!(transitions(&orch.begin(manual), manual), vec![HandlerState::Began]);
        assert!(orch.begin(manual).is_empty());
        let failed = orch.end(manual);
        assert_eq!(transitions(&failed, manual), vec![HandlerState::Failed]);
    }

    // ===== Output Tests =====

    #[test]
    fn test_listener_sees_events_in_order() {
        let mut orch = make_orchestrator();
        let tap = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        orch.set_listener(tap, move |event| {
            if let Some((_, new)) = event.transition() {
                sink.lock().push(new);
            }
        })
        .unwrap();

        orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        orch.on_pointer_up(1, 10.0, 10.0, ms(40));
        assert_eq!(
            *seen.lock(),
            vec![HandlerState::Began, HandlerState::Active, HandlerState::End]
        );
        assert!(orch.remove_listener(tap).is_some());
    }

    #[test]
    fn test_pointer_data_forwarded() {
        let mut orch = make_orchestrator();
        let pan = orch
            .create(
                VIEW,
                HandlerConfig::new(PanConfig::min_distance(10.0)).needs_pointer_data(true),
            )
            .unwrap();
        let down = orch.on_pointer_down(1, 10.0, 10.0, ms(0));
        assert!(matches!(
            down.first(),
            Some(GestureEvent::Touch { kind: TouchEventKind::Down, tag, .. }) if *tag == pan
        ));

        let cancel = orch.on_pointer_cancel(1, ms(10));
        assert!(cancel.iter().any(|e| matches!(
            e,
            GestureEvent::Touch { kind: TouchEventKind::Cancelled, .. }
        )));
        assert_eq!(transitions(&cancel, pan), vec![HandlerState::Cancelled]);
    }

    #[test]
    fn test_hit_slop_extends_region() {
        let mut orch = make_orchestrator();
        let tap = orch
            .create(
                VIEW,
                HandlerConfig::new(TapConfig::default()).hit_slop(HitSlop::uniform(20.0)),
            )
            .unwrap();
        let events = orch.on_pointer_down(1, 110.0, 50.0, ms(0));
        assert_eq!(transitions(&events, tap), vec![HandlerState::Began]);
        assert!(orch.on_pointer_down(2, 130.0, 50.0, ms(5)).is_empty());
    }

    #[test]
    fn test_hit_slop_counts_as_inside() {
        let mut orch = make_orchestrator();
        let config = HandlerConfig::new(TapConfig::default())
            .hit_slop(HitSlop::uniform(20.0))
            .should_cancel_when_outside(true);
        let tap = orch.create(VIEW, config).unwrap();

        let mut events = orch.on_pointer_down(1, 110.0, 50.0, ms(0));
        events.extend(orch.on_pointer_up(1, 110.0, 50.0, ms(50)));
        assert_eq!(
            transitions(&events, tap),
            vec![HandlerState::Began, HandlerState::Active, HandlerState::End]
        );
    }

    #[test]
    fn test_debug_table() {
        let mut orch = make_orchestrator();
        let tap = orch.create(VIEW, HandlerConfig::new(TapConfig::default())).unwrap();
        orch.on_pointer_down(3, 10.0, 10.0, ms(0));
        let table = orch.debug_table();
        assert!(table.starts_with("tag"));
        assert!(table.contains(&tap.to_string()));
        assert!(table.contains("BEGAN"));
        assert!(table.contains("#3"));
    }
}
