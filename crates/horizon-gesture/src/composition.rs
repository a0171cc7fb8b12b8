//! Declarative gesture composition.
//!
//! A [`Gesture`] tree is lowered into relation edges:
//!
//! - `Race`: no edges; the first child to activate cancels the others through
//!   ordinary exclusivity.
//! - `Simultaneous`: every handler may be active together with every handler
//!   of the other children.
//! - `Exclusive`: children are in priority order; each handler requires every
//!   handler of the earlier children to fail.
//! - `Sequence`: each child only becomes a candidate after the previous child
//!   ended.

use crate::handler::HandlerTag;
use crate::relation::{Relation, RelationKind};

/// A composition of handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Handler(HandlerTag),
    Race(Vec<Gesture>),
    Simultaneous(Vec<Gesture>),
    Exclusive(Vec<Gesture>),
    Sequence(Vec<Gesture>),
}

impl From<HandlerTag> for Gesture {
    fn from(tag: HandlerTag) -> Self {
        Gesture::Handler(tag)
    }
}

impl Gesture {
    pub fn race(children: impl IntoIterator<Item = impl Into<Gesture>>) -> Self {
        Gesture::Race(children.into_iter().map(Into::into).collect())
    }

    pub fn simultaneous(children: impl IntoIterator<Item = impl Into<Gesture>>) -> Self {
        Gesture::Simultaneous(children.into_iter().map(Into::into).collect())
    }

    pub fn exclusive(children: impl IntoIterator<Item = impl Into<Gesture>>) -> Self {
        Gesture::Exclusive(children.into_iter().map(Into::into).collect())
    }

    pub fn sequence(children: impl IntoIterator<Item = impl Into<Gesture>>) -> Self {
        Gesture::Sequence(children.into_iter().map(Into::into).collect())
    }

    /// Every handler in the tree, depth-first.
    pub fn handlers(&self) -> Vec<HandlerTag> {
        let mut out = Vec::new();
        self.collect_handlers(&mut out);
        out
    }

    fn collect_handlers(&self, out: &mut Vec<HandlerTag>) {
        match self {
            Gesture::Handler(tag) => out.push(*tag),
            Gesture::Race(children)
            | Gesture::Simultaneous(children)
            | Gesture::Exclusive(children)
            | Gesture::Sequence(children) => {
                for child in children {
                    child.collect_handlers(out);
                }
            }
        }
    }

    /// The relation edges this tree stands for.
    pub fn relations(&self) -> Vec<Relation> {
        let mut out = Vec::new();
        self.collect_relations(&mut out);
        out
    }

    fn collect_relations(&self, out: &mut Vec<Relation>) {
        let children = match self {
            Gesture::Handler(_) => return,
            Gesture::Race(children)
            | Gesture::Simultaneous(children)
            | Gesture::Exclusive(children)
            | Gesture::Sequence(children) => children,
        };
        for child in children {
            child.collect_relations(out);
        }
        let groups: Vec<Vec<HandlerTag>> = children.iter().map(Gesture::handlers).collect();

        match self {
            Gesture::Simultaneous(_) => {
                for (i, group) in groups.iter().enumerate() {
                    for other in &groups[i + 1..] {
                        for &a in group {
                            for &b in other {
                                out.push(Relation::new(a, b, RelationKind::Simultaneous));
                            }
                        }
                    }
                }
            }
            Gesture::Exclusive(_) => {
                for (i, group) in groups.iter().enumerate() {
                    for earlier in &groups[..i] {
                        for &a in group {
                            for &b in earlier {
                                out.push(Relation::new(a, b, RelationKind::RequireToFail));
                            }
                        }
                    }
                }
            }
            Gesture::Sequence(_) => {
                for pair in groups.windows(2) {
                    for &next in &pair[1] {
                        for &previous in &pair[0] {
                            out.push(Relation::new(next, previous, RelationKind::After));
                        }
                    }
                }
            }
            Gesture::Race(_) | Gesture::Handler(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn make_tags(n: usize) -> Vec<HandlerTag> {
        let mut arena: SlotMap<HandlerTag, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_race_has_no_edges() {
        let t = make_tags(3);
        let gesture = Gesture::race(t.clone());
        assert!(gesture.relations().is_empty());
        assert_eq!(gesture.handlers(), t);
    }

    #[test]
    fn test_exclusive_priority_order() {
        let t = make_tags(3);
        let relations = Gesture::exclusive(t.clone()).relations();
        assert_eq!(
            relations,
            vec![
                Relation::new(t[1], t[0], RelationKind::RequireToFail),
                Relation::new(t[2], t[0], RelationKind::RequireToFail),
                Relation::new(t[2], t[1], RelationKind::RequireToFail),
            ]
        );
    }

    #[test]
    fn test_simultaneous_pairs_across_children() {
        let t = make_tags(3);
        let gesture = Gesture::simultaneous([
            Gesture::race([t[0], t[1]]),
            Gesture::Handler(t[2]),
        ]);
        assert_eq!(
            gesture.relations(),
            vec![
                Relation::new(t[0], t[2], RelationKind::Simultaneous),
                Relation::new(t[1], t[2], RelationKind::Simultaneous),
            ]
        );
    }

    #[test]
    fn test_sequence_chains_neighbours() {
        let t = make_tags(3);
        assert_eq!(
            Gesture::sequence(t.clone()).relations(),
            vec![
                Relation::new(t[1], t[0], RelationKind::After),
                Relation::new(t[2], t[1], RelationKind::After),
            ]
        );
    }

    #[test]
    fn test_nested_relations_come_first() {
        let t = make_tags(3);
        let gesture = Gesture::exclusive([
            Gesture::simultaneous([t[0], t[1]]),
            Gesture::Handler(t[2]),
        ]);
        let relations = gesture.relations();
        assert_eq!(relations[0], Relation::new(t[0], t[1], RelationKind::Simultaneous));
        assert!(relations.contains(&Relation::new(t[2], t[0], RelationKind::RequireToFail)));
        assert!(relations.contains(&Relation::new(t[2], t[1], RelationKind::RequireToFail)));
        assert_eq!(relations.len(), 3);
    }
}
