//! Arena-backed move tree.
//!
//! Every node owns two child links: `next` (the mainline continuation) and `other`
//! (an alternative to this node from the same position). `prev` points back along
//! whichever edge created the node and is only used for upward walks.
//!
//! Cutting a subtree frees its slots for later moves, so a `NodeId` taken from a cut
//! subtree is stale and may name an unrelated move afterwards.

use xiangqi_core::{Coords, Piece};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Clone, Default)]
pub struct MoveNode {
    /// `None` only for the root sentinel.
    pub coords: Option<Coords>,
    pub remark: String,
    /// Piece taken when the move was last applied.
    pub captured: Option<Piece>,
    /// Chinese notation, refreshed by a full renumbering walk.
    pub zh: String,
    /// Ply depth; siblings share it.
    pub next_no: usize,
    /// Variation nesting depth.
    pub other_no: usize,
    /// Column in the tabular layout.
    pub cc_col_no: usize,
    next: Option<NodeId>,
    other: Option<NodeId>,
    prev: Option<NodeId>,
    is_other: bool,
}

impl MoveNode {
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn other(&self) -> Option<NodeId> {
        self.other
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Whether this node hangs off its predecessor's `other` link.
    pub fn is_other(&self) -> bool {
        self.is_other
    }

    pub fn iccs(&self) -> String {
        self.coords.map(Coords::iccs).unwrap_or_default()
    }

    /// One-line debugging summary.
    pub fn summary(&self) -> String {
        let (coords, iccs) = match self.coords {
            Some(c) => (c.to_string(), c.iccs()),
            None => ("-----".to_string(), String::new()),
        };
        format!(
            "{coords}-{iccs:>4}:{:>4}@{} {{{}}} next:{} other:{} CC_Col:{}",
            self.zh,
            self.captured.map_or('-', |p| p.name()),
            self.remark,
            self.next_no,
            self.other_no,
            self.cc_col_no
        )
    }
}

#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<MoveNode>,
    free: Vec<NodeId>,
}

impl Default for MoveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveTree {
    pub fn new() -> Self {
        Self { nodes: vec![MoveNode::default()], free: Vec::new() }
    }

    /// Nodes in use, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &MoveNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut MoveNode {
        &mut self.nodes[id.0]
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).other
    }

    pub fn coords(&self, id: NodeId) -> Option<Coords> {
        self.node(id).coords
    }

    /// Appends `coords` as the mainline continuation of `id`, replacing any previous one.
    pub fn add_next(&mut self, id: NodeId, coords: Coords, remark: impl Into<String>) -> NodeId {
        let parent = self.node(id);
        let node = MoveNode {
            coords: Some(coords),
            remark: remark.into(),
            next_no: parent.next_no + 1,
            other_no: parent.other_no,
            prev: Some(id),
            ..MoveNode::default()
        };
        let new_id = self.push(node);
        self.node_mut(id).next = Some(new_id);
        new_id
    }

    /// Attaches `coords` as the variation of `id`, replacing any previous one.
    pub fn add_other(&mut self, id: NodeId, coords: Coords, remark: impl Into<String>) -> NodeId {
        let sibling = self.node(id);
        let node = MoveNode {
            coords: Some(coords),
            remark: remark.into(),
            next_no: sibling.next_no,
            other_no: sibling.other_no + 1,
            prev: Some(id),
            is_other: true,
            ..MoveNode::default()
        };
        let new_id = self.push(node);
        self.node_mut(id).other = Some(new_id);
        new_id
    }

    fn push(&mut self, node: MoveNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return id;
        }
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn release(&mut self, ids: Vec<NodeId>) {
        for id in ids {
            self.nodes[id.0] = MoveNode::default();
            self.free.push(id);
        }
    }

    /// Drops the mainline continuation of `id` with everything below it.
    pub fn cut_next(&mut self, id: NodeId) {
        if let Some(next) = self.node_mut(id).next.take() {
            let dead: Vec<NodeId> = self.preorder(next).collect();
            self.release(dead);
        }
    }

    /// Removes one level of variation: the variation's own variation takes its place.
    pub fn cut_other(&mut self, id: NodeId) {
        if let Some(other) = self.other(id) {
            let replacement = self.other(other);
            self.node_mut(id).other = replacement;
            if let Some(r) = replacement {
                self.node_mut(r).prev = Some(id);
            }
            let mut dead = vec![other];
            if let Some(next) = self.next(other) {
                dead.extend(self.preorder(next));
            }
            self.release(dead);
        }
    }

    /// The node after which `id` is played: skips back over sibling links first.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        while self.node(cur).is_other {
            cur = self.node(cur).prev?;
        }
        self.node(cur).prev
    }

    /// Moves from the first ply down to `id`, inclusive; empty for the root.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cur = id;
        while cur != NodeId::ROOT {
            path.push(cur);
            match self.parent(cur) {
                Some(p) => cur = p,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Pre-order walk from `start`: node, its `next` subtree, then its `other` subtree.
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        Preorder { tree: self, stack: vec![start] }
    }

    /// Every reachable move below the root.
    pub fn moves(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.next(NodeId::ROOT).into_iter().collect(),
        }
    }

    /// Remaps every move's squares.
    pub fn map_coords(&mut self, f: impl Fn(Coords) -> Coords) {
        let ids: Vec<NodeId> = self.moves().collect();
        for id in ids {
            let node = self.node_mut(id);
            node.coords = node.coords.map(&f);
        }
    }
}

pub struct Preorder<'a> {
    tree: &'a MoveTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.other);
        self.stack.extend(node.next);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xiangqi_core::Square;

    fn mv(f: i32, t: i32) -> Coords {
        Coords::new(Square::from_rowcol(f).unwrap(), Square::from_rowcol(t).unwrap())
    }

    #[test]
    fn test_numbering_on_insert() {
        let mut tree = MoveTree::new();
        let a = tree.add_next(tree.root(), mv(27, 24), "");
        let b = tree.add_next(a, mv(97, 76), "");
        let c = tree.add_other(b, mv(91, 92), "alt");
        assert_eq!(tree.node(b).next_no, 2);
        assert_eq!(tree.node(c).next_no, 2);
        assert_eq!(tree.node(c).other_no, 1);
        assert_eq!(tree.node(c).remark, "alt");
        assert!(tree.node(c).is_other());
    }

    #[test]
    fn test_parent_skips_siblings() {
        let mut tree = MoveTree::new();
        let a = tree.add_next(tree.root(), mv(27, 24), "");
        let b = tree.add_next(a, mv(97, 76), "");
        let c = tree.add_other(b, mv(91, 92), "");
        let d = tree.add_other(c, mv(77, 74), "");
        let e = tree.add_next(d, mv(7, 26), "");
        assert_eq!(tree.parent(d), Some(a));
        assert_eq!(tree.parent(e), Some(d));
        assert_eq!(tree.parent(a), Some(NodeId::ROOT));
        assert_eq!(tree.parent(NodeId::ROOT), None);
        assert_eq!(tree.path_to(e), vec![a, d, e]);
        assert!(tree.path_to(NodeId::ROOT).is_empty());
    }

    #[test]
    fn test_preorder() {
        let mut tree = MoveTree::new();
        let a = tree.add_next(tree.root(), mv(27, 24), "");
        let b = tree.add_next(a, mv(97, 76), "");
        let c = tree.add_other(a, mv(7, 26), "");
        let d = tree.add_next(c, mv(79, 77), "");
        let order: Vec<NodeId> = tree.moves().collect();
        assert_eq!(order, vec![a, b, c, d]);
    }

    #[test]
    fn test_cut() {
        let mut tree = MoveTree::new();
        let a = tree.add_next(tree.root(), mv(27, 24), "");
        let b = tree.add_other(a, mv(7, 26), "");
        let c = tree.add_other(b, mv(1, 22), "");
        tree.cut_other(a);
        assert_eq!(tree.other(a), Some(c));
        assert_eq!(tree.parent(c), Some(NodeId::ROOT));
        tree.cut_next(NodeId::ROOT);
        assert_eq!(tree.moves().count(), 0);
    }

    #[test]
    fn test_cut_slots_are_reused() {
        let mut tree = MoveTree::new();
        let a = tree.add_next(tree.root(), mv(27, 24), "");
        let b = tree.add_next(a, mv(97, 76), "");
        let c = tree.add_other(b, mv(77, 74), "");
        tree.add_next(c, mv(7, 26), "");
        tree.add_next(b, mv(7, 26), "");
        assert_eq!(tree.node_count(), 6);

        tree.cut_other(b);
        assert_eq!(tree.node_count(), 4);
        tree.cut_next(a);
        assert_eq!(tree.node_count(), 2);

        for _ in 0..10 {
            let b = tree.add_next(a, mv(97, 76), "again");
            tree.add_next(b, mv(7, 26), "");
            tree.cut_next(a);
        }
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.nodes.len(), 6);
        let b = tree.add_next(a, mv(97, 76), "kept");
        assert_eq!(tree.node(b).remark, "kept");
        assert_eq!(tree.moves().collect::<Vec<_>>(), vec![a, b]);
    }
}
