//! Hit-testing seam between the engine and the host's view hierarchy.
//!
//! The engine does not own view geometry. It asks a [`HitTest`] implementation
//! which views cover a pointer-down position (deepest first) and where a view's
//! bounds are. [`ViewTree`] is a self-contained implementation for hosts that
//! have no scene graph of their own, and for tests.

use std::collections::HashMap;
use std::fmt;

use horizon_gesture_core::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{GestureError, Result};

/// Identifier of a view in the host's hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Geometry queries the orchestrator needs from the view layer.
pub trait HitTest {
    /// Views whose region contains `point`, deepest (innermost, topmost) first.
    fn hit_test(&self, point: Point) -> Vec<ViewId>;

    /// Bounds of a view in pointer-event coordinates.
    fn bounds(&self, view: ViewId) -> Option<Rect>;

    /// Whether `point` lies inside the view.
    fn contains(&self, view: ViewId, point: Point) -> bool {
        self.bounds(view).is_some_and(|b| b.contains(point))
    }
}

#[derive(Debug, Clone)]
struct ViewNode {
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    bounds: Rect,
    z_index: i32,
    pickable: bool,
}

/// A minimal view hierarchy with absolute bounds and sibling stacking.
///
/// Siblings are stacked by `z_index`, with later insertion on top among equal
/// indices. Children are not clipped by their parent.
#[derive(Debug, Clone, Default)]
pub struct ViewTree {
    nodes: HashMap<ViewId, ViewNode>,
    roots: Vec<ViewId>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a view under `parent` (or as a root).
    pub fn insert(&mut self, view: ViewId, parent: Option<ViewId>, bounds: Rect) -> Result<()> {
        if self.nodes.contains_key(&view) {
            return Err(GestureError::DuplicateView(view));
        }
        if let Some(parent) = parent {
            let Some(node) = self.nodes.get_mut(&parent) else {
                return Err(GestureError::UnknownView(parent));
            };
            node.children.push(view);
        } else {
            self.roots.push(view);
        }
        self.nodes.insert(
            view,
            ViewNode {
                parent,
                children: Vec::new(),
                bounds,
                z_index: 0,
                pickable: true,
            },
        );
        Ok(())
    }

    /// Remove a view and its whole subtree. Returns the removed ids.
    pub fn remove(&mut self, view: ViewId) -> Vec<ViewId> {
        let Some(parent) = self.nodes.get(&view).map(|n| n.parent) else {
            return Vec::new();
        };
        match parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.retain(|&c| c != view);
                }
            }
            None => self.roots.retain(|&r| r != view),
        }

        let mut removed = Vec::new();
        let mut stack = vec![view];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.children);
                removed.push(id);
            }
        }
        removed
    }

    /// Move a view under a new parent (or make it a root).
    pub fn set_parent(&mut self, view: ViewId, new_parent: Option<ViewId>) -> Result<()> {
        if !self.nodes.contains_key(&view) {
            return Err(GestureError::UnknownView(view));
        }
        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(&parent) {
                return Err(GestureError::UnknownView(parent));
            }
            if self.is_ancestor_of(view, parent) {
                return Err(GestureError::CircularViewParentage { view });
            }
        }

        let old_parent = self.nodes.get(&view).and_then(|n| n.parent);
        match old_parent {
            Some(old) => {
                if let Some(node) = self.nodes.get_mut(&old) {
                    node.children.retain(|&c| c != view);
                }
            }
            None => self.roots.retain(|&r| r != view),
        }

        if let Some(node) = self.nodes.get_mut(&view) {
            node.parent = new_parent;
        }
        match new_parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.push(view);
                }
            }
            None => self.roots.push(view),
        }
        Ok(())
    }

    pub fn set_bounds(&mut self, view: ViewId, bounds: Rect) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&view)
            .ok_or(GestureError::UnknownView(view))?;
        node.bounds = bounds;
        Ok(())
    }

    pub fn set_z_index(&mut self, view: ViewId, z_index: i32) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&view)
            .ok_or(GestureError::UnknownView(view))?;
        node.z_index = z_index;
        Ok(())
    }

    /// Non-pickable views are skipped by hit-testing, but their children are
    /// still visited.
    pub fn set_pickable(&mut self, view: ViewId, pickable: bool) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&view)
            .ok_or(GestureError::UnknownView(view))?;
        node.pickable = pickable;
        Ok(())
    }

    pub fn parent(&self, view: ViewId) -> Option<ViewId> {
        self.nodes.get(&view).and_then(|n| n.parent)
    }

    pub fn children(&self, view: ViewId) -> &[ViewId] {
        self.nodes
            .get(&view)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_view(&self, view: ViewId) -> bool {
        self.nodes.contains_key(&view)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn is_ancestor_of(&self, potential_ancestor: ViewId, view: ViewId) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            if id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Siblings from topmost to bottommost.
    fn stacked(&self, siblings: &[ViewId]) -> Vec<ViewId> {
        let mut order: Vec<(usize, ViewId)> = siblings.iter().copied().enumerate().collect();
        order.sort_by(|(ia, a), (ib, b)| {
            let za = self.nodes.get(a).map_or(0, |n| n.z_index);
            let zb = self.nodes.get(b).map_or(0, |n| n.z_index);
            zb.cmp(&za).then(ib.cmp(ia))
        });
        order.into_iter().map(|(_, id)| id).collect()
    }

    fn collect_hits(&self, view: ViewId, point: Point, out: &mut Vec<ViewId>) {
        let Some(node) = self.nodes.get(&view) else {
            return;
        };
        for child in self.stacked(&node.children) {
            self.collect_hits(child, point, out);
        }
        if node.pickable && node.bounds.contains(point) {
            out.push(view);
        }
    }
}

impl HitTest for ViewTree {
    fn hit_test(&self, point: Point) -> Vec<ViewId> {
        let mut hits = Vec::new();
        for root in self.stacked(&self.roots) {
            self.collect_hits(root, point, &mut hits);
        }
        hits
    }

    fn bounds(&self, view: ViewId) -> Option<Rect> {
        self.nodes.get(&view).map(|n| n.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tree() -> ViewTree {
        // root (0,0,100,100)
        //   panel (10,10,50,50)
        //     button (20,20,10,10)
        //   overlay (40,40,40,40)
        let mut tree = ViewTree::new();
        tree.insert(ViewId(1), None, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        tree.insert(ViewId(2), Some(ViewId(1)), Rect::new(10.0, 10.0, 50.0, 50.0))
            .unwrap();
        tree.insert(ViewId(3), Some(ViewId(2)), Rect::new(20.0, 20.0, 10.0, 10.0))
            .unwrap();
        tree.insert(ViewId(4), Some(ViewId(1)), Rect::new(40.0, 40.0, 40.0, 40.0))
            .unwrap();
        tree
    }

    #[test]
    fn test_deepest_first() {
        let tree = make_tree();
        assert_eq!(
            tree.hit_test(Point::new(25.0, 25.0)),
            vec![ViewId(3), ViewId(2), ViewId(1)]
        );
    }

    #[test]
    fn test_later_sibling_on_top() {
        let tree = make_tree();
        assert_eq!(
            tree.hit_test(Point::new(45.0, 45.0)),
            vec![ViewId(4), ViewId(2), ViewId(1)]
        );
    }

    #[test]
    fn test_z_index_reorders_siblings() {
        let mut tree = make_tree();
        tree.set_z_index(ViewId(2), 5).unwrap();
        assert_eq!(
            tree.hit_test(Point::new(45.0, 45.0)),
            vec![ViewId(2), ViewId(4), ViewId(1)]
        );
    }

    #[test]
    fn test_miss() {
        let tree = make_tree();
        assert!(tree.hit_test(Point::new(150.0, 5.0)).is_empty());
    }

    #[test]
    fn test_not_pickable() {
        let mut tree = make_tree();
        tree.set_pickable(ViewId(2), false).unwrap();
        assert_eq!(
            tree.hit_test(Point::new(25.0, 25.0)),
            vec![ViewId(3), ViewId(1)]
        );
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = make_tree();
        let mut removed = tree.remove(ViewId(2));
        removed.sort();
        assert_eq!(removed, vec![ViewId(2), ViewId(3)]);
        assert_eq!(tree.children(ViewId(1)), &[ViewId(4)]);
        assert!(tree.remove(ViewId(2)).is_empty());
    }

    #[test]
    fn test_circular_parentage_rejected() {
        let mut tree = make_tree();
        let err = tree.set_parent(ViewId(1), Some(ViewId(3))).unwrap_err();
        assert!(matches!(err, GestureError::CircularViewParentage { .. }));
        tree.set_parent(ViewId(3), None).unwrap();
        assert_eq!(tree.parent(ViewId(3)), None);
    }

    #[test]
    fn test_duplicate_and_unknown() {
        let mut tree = make_tree();
        assert!(matches!(
            tree.insert(ViewId(1), None, Rect::default()),
            Err(GestureError::DuplicateView(_))
        ));
        assert!(matches!(
            tree.insert(ViewId(9), Some(ViewId(42)), Rect::default()),
            Err(GestureError::UnknownView(_))
        ));
        assert!(tree.set_bounds(ViewId(42), Rect::default()).is_err());
    }
}
