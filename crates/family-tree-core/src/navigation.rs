//! Navigation modes and the node/edge presentation they produce.
//!
//! - `Full`: everything visible and clickable.
//! - `Focused(n)`: `n`, its ancestors and its direct children stay visible;
//!   everything else is dimmed and not clickable.
//! - `Filtered(q)`: nodes whose name contains `q` (case-insensitive) are
//!   highlighted, the rest dimmed and not clickable; all edges are dimmed.
//!
//! The presentation is always recomputed from scratch for the new mode, so
//! switching focus between nodes never leaves stale dimming behind.

use crate::error::NavFault;
use crate::tree::{FamilyTree, NodeIdx};

pub const FOCUS_DIMMED_NODE_OPACITY: f32 = 0.07;
pub const FOCUS_DIMMED_EDGE_OPACITY: f32 = 0.04;
pub const FILTER_DIMMED_NODE_OPACITY: f32 = 0.12;
pub const FILTER_EDGE_OPACITY: f32 = 0.08;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavMode {
    #[default]
    Full,
    Focused(NodeIdx),
    /// Normalized (trimmed, lowercased) query
    Filtered(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub opacity: f32,
    pub interactive: bool,
}

impl NodeStyle {
    pub const VISIBLE: NodeStyle = NodeStyle {
        opacity: 1.0,
        interactive: true,
    };

    pub fn is_highlighted(&self) -> bool {
        self.opacity >= 1.0
    }
}

/// Per-node and per-edge styling for the current mode.
///
/// Edges are keyed by their child node: every non-root node has exactly one
/// incoming edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    nodes: Vec<NodeStyle>,
    edges: Vec<f32>,
}

impl Presentation {
    pub fn compute(tree: &FamilyTree, mode: &NavMode) -> Self {
        let n = tree.len();
        match mode {
            NavMode::Full => Self {
                nodes: vec![NodeStyle::VISIBLE; n],
                edges: vec![1.0; n],
            },
            NavMode::Focused(idx) => {
                let keep = focus_set(tree, *idx);
                let nodes = keep
                    .iter()
                    .map(|&k| {
                        if k {
                            NodeStyle::VISIBLE
                        } else {
                            NodeStyle {
                                opacity: FOCUS_DIMMED_NODE_OPACITY,
                                interactive: false,
                            }
                        }
                    })
                    .collect();
                let edges = tree
                    .iter()
                    .map(|(child, node)| match node.parent {
                        Some(p) if keep[p.index()] && keep[child.index()] => 1.0,
                        _ => FOCUS_DIMMED_EDGE_OPACITY,
                    })
                    .collect();
                Self { nodes, edges }
            }
            NavMode::Filtered(query) => {
                let nodes = tree
                    .iter()
                    .map(|(_, node)| {
                        if name_matches(&node.person.name, query) {
                            NodeStyle::VISIBLE
                        } else {
                            NodeStyle {
                                opacity: FILTER_DIMMED_NODE_OPACITY,
                                interactive: false,
                            }
                        }
                    })
                    .collect();
                Self {
                    nodes,
                    edges: vec![FILTER_EDGE_OPACITY; n],
                }
            }
        }
    }

    pub fn node(&self, idx: NodeIdx) -> NodeStyle {
        self.nodes
            .get(idx.index())
            .copied()
            .unwrap_or(NodeStyle::VISIBLE)
    }

    /// Opacity of the edge entering `child`.
    pub fn edge(&self, child: NodeIdx) -> f32 {
        self.edges.get(child.index()).copied().unwrap_or(1.0)
    }

    pub fn highlighted(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_highlighted())
            .map(|(i, _)| NodeIdx::from_usize(i))
    }

    pub fn highlighted_count(&self) -> usize {
        self.nodes.iter().filter(|s| s.is_highlighted()).count()
    }
}

/// `idx`, its ancestors and its direct children, as a mask over the arena.
pub fn focus_set(tree: &FamilyTree, idx: NodeIdx) -> Vec<bool> {
    let mut keep = vec![false; tree.len()];
    if !tree.contains(idx) {
        return keep;
    }
    keep[idx.index()] = true;
    for a in tree.ancestors(idx) {
        keep[a.index()] = true;
    }
    for c in tree.children(idx) {
        keep[c.index()] = true;
    }
    keep
}

/// Trim and lowercase; `None` when nothing is left.
pub fn normalize_query(raw: &str) -> Option<String> {
    let q = raw.trim().to_lowercase();
    (!q.is_empty()).then_some(q)
}

/// Case-insensitive substring match against an already-normalized query.
pub fn name_matches(name: &str, normalized_query: &str) -> bool {
    name.to_lowercase().contains(normalized_query)
}

/// Current mode plus its derived presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    mode: NavMode,
    presentation: Presentation,
}

impl NavigationState {
    pub fn new(tree: &FamilyTree) -> Self {
        Self {
            mode: NavMode::Full,
            presentation: Presentation::compute(tree, &NavMode::Full),
        }
    }

    pub fn mode(&self) -> &NavMode {
        &self.mode
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn focused(&self) -> Option<NodeIdx> {
        match self.mode {
            NavMode::Focused(idx) => Some(idx),
            _ => None,
        }
    }

    /// Focus on `idx`. Refused for unknown or dimmed nodes.
    pub fn select(&mut self, tree: &FamilyTree, idx: NodeIdx) -> Result<(), NavFault> {
        if !tree.contains(idx) {
            return Err(NavFault::UnknownNode(idx));
        }
        if !self.presentation.node(idx).interactive {
            return Err(NavFault::NodeNotInteractive(idx));
        }
        self.apply(tree, NavMode::Focused(idx));
        Ok(())
    }

    /// Filter by a raw query; an empty query resets to `Full`.
    /// Returns whether the mode changed.
    pub fn set_query(&mut self, tree: &FamilyTree, raw: &str) -> bool {
        let mode = match normalize_query(raw) {
            Some(q) => NavMode::Filtered(q),
            None => NavMode::Full,
        };
        self.apply(tree, mode)
    }

    /// Back to `Full`. Returns whether the mode changed.
    pub fn reset(&mut self, tree: &FamilyTree) -> bool {
        self.apply(tree, NavMode::Full)
    }

    fn apply(&mut self, tree: &FamilyTree, mode: NavMode) -> bool {
        if self.mode == mode {
            return false;
        }
        tracing::trace!(?mode, "navigation mode changed");
        self.presentation = Presentation::compute(tree, &mode);
        self.mode = mode;
        true
    }
}
