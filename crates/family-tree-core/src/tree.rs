//! Arena-backed family tree.
//!
//! Nodes are stored in a flat `Vec` in pre-order (root at index 0, children
//! left to right in ascending person id). Everything downstream - layout,
//! focus sets, rendering - addresses nodes by `NodeIdx` and walks the arena
//! iteratively, so arbitrarily deep lineages never touch the call stack.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use family_tree_types::{PersonId, PersonRecord, TreeNodeDto};
use serde::{Deserialize, Serialize};

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_usize(i: usize) -> Self {
        NodeIdx(i as u32)
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub person: PersonRecord,
    pub parent: Option<NodeIdx>,
    /// Ordered by ascending person id
    pub children: Vec<NodeIdx>,
    /// Root is depth 0
    pub depth: u32,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn person_id(&self) -> PersonId {
        self.person.id
    }
}

/// A single-rooted hierarchy of persons, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyTree {
    nodes: Vec<TreeNode>,
    by_person: HashMap<PersonId, NodeIdx>,
}

impl FamilyTree {
    /// Assemble from nodes already in pre-order with the root first.
    pub(crate) fn from_preorder(nodes: Vec<TreeNode>) -> Self {
        let by_person = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.person.id, NodeIdx::from_usize(i)))
            .collect();
        Self { nodes, by_person }
    }

    pub fn root(&self) -> NodeIdx {
        NodeIdx(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A built tree always has a root; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, idx: NodeIdx) -> bool {
        idx.index() < self.nodes.len()
    }

    pub fn get(&self, idx: NodeIdx) -> Option<&TreeNode> {
        self.nodes.get(idx.index())
    }

    /// Arena index of a person, if they were placed in the tree.
    pub fn find(&self, person_id: PersonId) -> Option<NodeIdx> {
        self.by_person.get(&person_id).copied()
    }

    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        self.get(idx).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.get(idx).and_then(|n| n.parent)
    }

    /// Iterate `(idx, node)` in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &TreeNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIdx::from_usize(i), n))
    }

    /// Parent chain from `idx` (exclusive) up to the root (inclusive).
    pub fn ancestors(&self, idx: NodeIdx) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(idx),
        }
    }

    /// Pre-order: the arena order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..self.nodes.len()).map(NodeIdx::from_usize)
    }

    /// Post-order with children left to right.
    pub fn postorder(&self) -> Vec<NodeIdx> {
        // Reverse of a pre-order that visits children right to left.
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![self.root()];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.children(idx).iter().copied());
        }
        out.reverse();
        out
    }

    /// `(parent, child)` pairs in pre-order of the child.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIdx, NodeIdx)> + '_ {
        self.iter()
            .filter_map(|(idx, node)| node.parent.map(|p| (p, idx)))
    }

    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Nested DTO for `GET /api/tree`, built bottom-up.
    pub fn to_dto(&self) -> TreeNodeDto {
        let mut built: Vec<Option<TreeNodeDto>> = vec![None; self.nodes.len()];
        for idx in self.postorder() {
            let node = &self[idx];
            let children = node
                .children
                .iter()
                .filter_map(|c| built[c.index()].take())
                .collect();
            built[idx.index()] = Some(TreeNodeDto {
                person: node.person.clone(),
                children,
            });
        }
        built
            .first_mut()
            .and_then(Option::take)
            .unwrap_or_else(|| TreeNodeDto {
                person: PersonRecord::new(0, "", None),
                children: Vec::new(),
            })
    }
}

impl Index<NodeIdx> for FamilyTree {
    type Output = TreeNode;

    fn index(&self, idx: NodeIdx) -> &TreeNode {
        &self.nodes[idx.index()]
    }
}

/// Iterator returned by [`FamilyTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a FamilyTree,
    next: Option<NodeIdx>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
