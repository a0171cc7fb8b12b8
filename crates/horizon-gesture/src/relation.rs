//! Relations between handlers and the verdicts derived from them.
//!
//! Relations are directed edges `from -kind-> to`:
//!
//! - `Simultaneous`: the two handlers may be ACTIVE together on shared
//!   pointers. Stored symmetrically.
//! - `RequireToFail`: `from` may not leave `UNDETERMINED` or activate until
//!   `to` has failed or been cancelled, and fails if `to` succeeds.
//! - `WaitFor`: the same verdict as `RequireToFail` under its own label.
//! - `After`: `from` is only a candidate once `to` has ended (sequences).
//!
//! Every edge except `Simultaneous` orders the two handlers, and the ordered
//! edges together must stay acyclic.

use std::collections::{HashMap, HashSet};
use std::fmt;

use horizon_gesture_core::logging::targets;
use horizon_gesture_core::HandlerState;

use crate::error::{GestureError, Result};
use crate::handler::HandlerTag;

/// The kind of a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Simultaneous,
    RequireToFail,
    WaitFor,
    After,
}

impl RelationKind {
    /// Whether the edge holds `from` back while `to` is unresolved.
    pub const fn is_blocking(self) -> bool {
        matches!(self, RelationKind::RequireToFail | RelationKind::WaitFor)
    }

    /// Whether the edge orders `from` after `to`.
    pub const fn is_ordered(self) -> bool {
        !matches!(self, RelationKind::Simultaneous)
    }

    pub const fn name(self) -> &'static str {
        match self {
            RelationKind::Simultaneous => "simultaneous",
            RelationKind::RequireToFail => "requireToFail",
            RelationKind::WaitFor => "waitFor",
            RelationKind::After => "after",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One directed relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub from: HandlerTag,
    pub to: HandlerTag,
    pub kind: RelationKind,
}

impl Relation {
    pub const fn new(from: HandlerTag, to: HandlerTag, kind: RelationKind) -> Self {
        Self { from, to, kind }
    }
}

/// What a handler may do right now given the state of the handlers it
/// depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every blocking target has given up (or is not taking part).
    Proceed,
    /// At least one blocking target is still undecided.
    Wait,
    /// A blocking target succeeded.
    Fail,
}

/// Partition of a set of handlers by [`Verdict`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub runnable: Vec<HandlerTag>,
    pub must_wait: Vec<HandlerTag>,
    pub must_fail: Vec<HandlerTag>,
}

/// Read access to handler states for verdict computation.
pub trait HandlerStates {
    /// The state of `tag` in the current episode, or `None` when the handler
    /// does not exist or is not taking part.
    fn episode_state(&self, tag: HandlerTag) -> Option<HandlerState>;
}

impl HandlerStates for HashMap<HandlerTag, HandlerState> {
    fn episode_state(&self, tag: HandlerTag) -> Option<HandlerState> {
        self.get(&tag).copied()
    }
}

/// Relation edges between handlers.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    /// Ordered edges keyed by their `from` handler.
    ordered: HashMap<HandlerTag, Vec<Relation>>,
    simultaneous: HashMap<HandlerTag, HashSet<HandlerTag>>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Adding an edge that already exists is a no-op.
    ///
    /// Fails on self relations and on ordered edges that would close a cycle;
    /// the graph is unchanged in that case.
    pub fn add_relation(&mut self, relation: Relation) -> Result<()> {
        let Relation { from, to, kind } = relation;
        if from == to {
            return Err(GestureError::SelfRelation { tag: from, kind });
        }
        if kind == RelationKind::Simultaneous {
            self.simultaneous.entry(from).or_default().insert(to);
            self.simultaneous.entry(to).or_default().insert(from);
            return Ok(());
        }
        if self.ordered.get(&from).is_some_and(|edges| edges.contains(&relation)) {
            return Ok(());
        }
        if self.reaches(to, from) {
            return Err(GestureError::CyclicRelation { from, to, kind });
        }
        self.ordered.entry(from).or_default().push(relation);
        tracing::debug!(
            target: targets::RELATION,
            %from,
            %to,
            %kind,
            "relation added"
        );
        Ok(())
    }

    /// Whether `target` is reachable from `start` along ordered edges.
    fn reaches(&self, start: HandlerTag, target: HandlerTag) -> bool {
        let mut stack = vec![start];
        let mut seen = HashSet::new();
        while let Some(tag) = stack.pop() {
            if tag == target {
                return true;
            }
            if !seen.insert(tag) {
                continue;
            }
            if let Some(edges) = self.ordered.get(&tag) {
                stack.extend(edges.iter().map(|edge| edge.to));
            }
        }
        false
    }

    /// Drop every edge touching `tag`.
    pub fn remove_handler(&mut self, tag: HandlerTag) {
        self.ordered.remove(&tag);
        for edges in self.ordered.values_mut() {
            edges.retain(|edge| edge.to != tag);
        }
        self.ordered.retain(|_, edges| !edges.is_empty());

        if let Some(peers) = self.simultaneous.remove(&tag) {
            for peer in peers {
                if let Some(set) = self.simultaneous.get_mut(&peer) {
                    set.remove(&tag);
                    if set.is_empty() {
                        self.simultaneous.remove(&peer);
                    }
                }
            }
        }
    }

    pub fn are_simultaneous(&self, a: HandlerTag, b: HandlerTag) -> bool {
        self.simultaneous.get(&a).is_some_and(|peers| peers.contains(&b))
    }

    /// Handlers `tag` must wait on.
    pub fn blocking_targets(&self, tag: HandlerTag) -> impl Iterator<Item = HandlerTag> + '_ {
        self.outgoing(tag)
            .filter(|edge| edge.kind.is_blocking())
            .map(|edge| edge.to)
    }

    /// Handlers waiting on `tag`.
    pub fn blocked_by(&self, tag: HandlerTag) -> Vec<HandlerTag> {
        self.ordered
            .values()
            .flatten()
            .filter(|edge| edge.kind.is_blocking() && edge.to == tag)
            .map(|edge| edge.from)
            .collect()
    }

    /// Sequence predecessors of `tag`.
    pub fn predecessors(&self, tag: HandlerTag) -> impl Iterator<Item = HandlerTag> + '_ {
        self.outgoing(tag)
            .filter(|edge| edge.kind == RelationKind::After)
            .map(|edge| edge.to)
    }

    /// Sequence successors of `tag`.
    pub fn successors(&self, tag: HandlerTag) -> Vec<HandlerTag> {
        self.ordered
            .values()
            .flatten()
            .filter(|edge| edge.kind == RelationKind::After && edge.to == tag)
            .map(|edge| edge.from)
            .collect()
    }

    pub fn has_predecessors(&self, tag: HandlerTag) -> bool {
        self.predecessors(tag).next().is_some()
    }

    fn outgoing(&self, tag: HandlerTag) -> impl Iterator<Item = &Relation> + '_ {
        self.ordered.get(&tag).into_iter().flatten()
    }

    /// All edges leaving `tag`, including simultaneous ones.
    pub fn relations_of(&self, tag: HandlerTag) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self.outgoing(tag).copied().collect();
        if let Some(peers) = self.simultaneous.get(&tag) {
            relations.extend(
                peers
                    .iter()
                    .map(|&peer| Relation::new(tag, peer, RelationKind::Simultaneous)),
            );
        }
        relations
    }

    /// Number of edges, counting each simultaneous pair once.
    pub fn len(&self) -> usize {
        let ordered: usize = self.ordered.values().map(Vec::len).sum();
        let simultaneous: usize = self.simultaneous.values().map(HashSet::len).sum();
        ordered + simultaneous / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verdict for `tag` from the states of its blocking targets. A target
    /// that succeeded dominates one that is still undecided.
    pub fn verdict(&self, tag: HandlerTag, states: &impl HandlerStates) -> Verdict {
        let mut verdict = Verdict::Proceed;
        for target in self.blocking_targets(tag) {
            match states.episode_state(target) {
                Some(HandlerState::Active | HandlerState::End) => return Verdict::Fail,
                Some(HandlerState::Undetermined | HandlerState::Began) => {
                    verdict = Verdict::Wait;
                }
                Some(HandlerState::Failed | HandlerState::Cancelled) | None => {}
            }
        }
        verdict
    }

    /// Partition `candidates` by their current verdict, keeping their order.
    pub fn resolve(
        &self,
        candidates: impl IntoIterator<Item = HandlerTag>,
        states: &impl HandlerStates,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        for tag in candidates {
            match self.verdict(tag, states) {
                Verdict::Proceed => resolution.runnable.push(tag),
                Verdict::Wait => resolution.must_wait.push(tag),
                Verdict::Fail => resolution.must_fail.push(tag),
            }
        }
        resolution
    }
}
