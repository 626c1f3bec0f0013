//! Tidy tree layout for the family tree
//!
//! Computes world positions for every node so the UI (or the SVG renderer)
//! only has to draw. Generations flow top to bottom; siblings are packed as
//! tightly as the separation rule allows while parents stay centred over
//! their children (Buchheim, Jünger & Leipert's linear-time variant of the
//! Reingold-Tilford algorithm).
//!
//! Both walks are driven by explicit orderings of the arena instead of
//! recursion, so a lineage thousands of generations deep lays out fine.

use family_tree_types::{BoundsDto, EdgeDto, PositionedNode, TreeLayoutResponse};
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};
use crate::tree::{FamilyTree, NodeIdx};

/// Layout configuration constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal distance of one separation unit
    pub node_width: f32,
    /// Vertical distance between generations
    pub level_height: f32,
    /// Separation (in units) between siblings
    pub sibling_separation: f32,
    /// Separation (in units) between adjacent nodes with different parents
    pub cousin_separation: f32,
    /// Rendered card size, used for bounds and hit testing
    pub card_width: f32,
    pub card_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 260.0,
            level_height: 210.0,
            sibling_separation: 1.3,
            cousin_separation: 1.6,
            card_width: 220.0,
            card_height: 168.0,
        }
    }
}

impl LayoutConfig {
    pub fn card_size(&self) -> Vec2 {
        Vec2::new(self.card_width, self.card_height)
    }
}

/// Positions indexed by `NodeIdx`, plus the world bounds of all cards.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    positions: Vec<Vec2>,
    /// Union of every card rectangle
    pub bounds: Rect,
}

impl TreeLayout {
    pub fn position(&self, idx: NodeIdx) -> Vec2 {
        self.positions.get(idx.index()).copied().unwrap_or(Vec2::ZERO)
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Flat, pre-positioned form returned by `GET /api/tree/layout`.
    pub fn to_response(&self, tree: &FamilyTree) -> TreeLayoutResponse {
        let nodes = tree
            .iter()
            .map(|(idx, node)| {
                let pos = self.position(idx);
                PositionedNode {
                    id: node.person.id,
                    name: node.person.name.clone(),
                    photo_url: node.person.photo().to_string(),
                    parent: node.parent.map(|p| tree[p].person.id),
                    depth: node.depth,
                    x: pos.x,
                    y: pos.y,
                }
            })
            .collect();
        let edges = tree
            .edges()
            .map(|(p, c)| EdgeDto {
                source: tree[p].person.id,
                target: tree[c].person.id,
            })
            .collect();
        let bounds = (!self.bounds.is_negative()).then(|| BoundsDto {
            min_x: self.bounds.min.x,
            min_y: self.bounds.min.y,
            max_x: self.bounds.max.x,
            max_y: self.bounds.max.y,
        });
        TreeLayoutResponse {
            nodes,
            edges,
            bounds,
        }
    }
}

/// Layout engine that computes node positions for a family tree
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn layout(&self, tree: &FamilyTree) -> TreeLayout {
        let mut walk = Walk::new(tree, &self.config);
        for v in tree.postorder() {
            walk.first_walk(v.index());
        }

        let n = tree.len();
        let mut x = vec![0.0f32; n];
        // Virtual parent of the root: shifts the root to x = 0.
        let root_mod = -walk.prelim.first().copied().unwrap_or(0.0);
        for v in tree.preorder() {
            let i = v.index();
            let parent_mod = match walk.parent(i) {
                Some(p) => walk.modifier[p],
                None => root_mod,
            };
            x[i] = walk.prelim[i] + parent_mod;
            walk.modifier[i] += parent_mod;
        }

        let card = self.config.card_size();
        let mut bounds = Rect::NOTHING;
        let positions: Vec<Vec2> = tree
            .iter()
            .map(|(idx, node)| {
                let p = Vec2::new(
                    x[idx.index()] * self.config.node_width,
                    node.depth as f32 * self.config.level_height,
                );
                bounds = bounds.union(Rect::from_center_size(p, card));
                p
            })
            .collect();

        tracing::debug!(
            nodes = positions.len(),
            width = bounds.width(),
            height = bounds.height(),
            "tree layout computed"
        );

        TreeLayout { positions, bounds }
    }
}

/// Per-node working state of the two walks, indexed by arena position.
struct Walk<'a> {
    tree: &'a FamilyTree,
    sibling_sep: f32,
    cousin_sep: f32,
    prelim: Vec<f32>,
    modifier: Vec<f32>,
    change: Vec<f32>,
    shift: Vec<f32>,
    thread: Vec<Option<usize>>,
    ancestor: Vec<usize>,
    /// Position among siblings
    number: Vec<usize>,
    /// Default ancestor carried between siblings, stored on their parent
    default_ancestor: Vec<Option<usize>>,
}

impl<'a> Walk<'a> {
    fn new(tree: &'a FamilyTree, config: &LayoutConfig) -> Self {
        let n = tree.len();
        let mut number = vec![0; n];
        for (_, node) in tree.iter() {
            for (i, c) in node.children.iter().enumerate() {
                number[c.index()] = i;
            }
        }
        Self {
            tree,
            sibling_sep: config.sibling_separation,
            cousin_sep: config.cousin_separation,
            prelim: vec![0.0; n],
            modifier: vec![0.0; n],
            change: vec![0.0; n],
            shift: vec![0.0; n],
            thread: vec![None; n],
            ancestor: (0..n).collect(),
            number,
            default_ancestor: vec![None; n],
        }
    }

    fn parent(&self, v: usize) -> Option<usize> {
        self.tree.parent(NodeIdx::from_usize(v)).map(NodeIdx::index)
    }

    fn children(&self, v: usize) -> &'a [NodeIdx] {
        self.tree.children(NodeIdx::from_usize(v))
    }

    fn separation(&self, a: usize, b: usize) -> f32 {
        if self.parent(a) == self.parent(b) {
            self.sibling_sep
        } else {
            self.cousin_sep
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.children(v).first().map(|c| c.index()).or(self.thread[v])
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.children(v).last().map(|c| c.index()).or(self.thread[v])
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let parent = self.parent(v)?;
        let n = self.number[v];
        (n > 0).then(|| self.children(parent)[n - 1].index())
    }

    fn first_walk(&mut self, v: usize) {
        let w = self.left_sibling(v);
        let children = self.children(v);
        if let (Some(first), Some(last)) = (children.first(), children.last()) {
            self.execute_shifts(v);
            let midpoint = (self.prelim[first.index()] + self.prelim[last.index()]) / 2.0;
            match w {
                Some(w) => {
                    self.prelim[v] = self.prelim[w] + self.separation(v, w);
                    self.modifier[v] = self.prelim[v] - midpoint;
                }
                None => self.prelim[v] = midpoint,
            }
        } else if let Some(w) = w {
            self.prelim[v] = self.prelim[w] + self.separation(v, w);
        }

        if let Some(parent) = self.parent(v) {
            let leftmost = self.children(parent)[0].index();
            let ancestor = self.default_ancestor[parent].unwrap_or(leftmost);
            self.default_ancestor[parent] = Some(self.apportion(v, w, ancestor, leftmost));
        }
    }

    /// Push the subtree at `v` right until it clears the contours of its left siblings.
    fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize, leftmost: usize) -> usize {
        let Some(w) = w else {
            return ancestor;
        };

        let (mut vip, mut vop, mut vim, mut vom) = (v, v, w, leftmost);
        let mut sip = self.modifier[vip];
        let mut sop = self.modifier[vop];
        let mut sim = self.modifier[vim];
        let mut som = self.modifier[vom];

        let (mut next_im, mut next_ip);
        loop {
            next_im = self.next_right(vim);
            next_ip = self.next_left(vip);
            let (Some(im), Some(ip)) = (next_im, next_ip) else {
                break;
            };
            let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
                break;
            };
            vim = im;
            vip = ip;
            vom = om;
            vop = op;

            self.ancestor[vop] = v;
            let shift = self.prelim[vim] + sim - self.prelim[vip] - sip + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.modifier[vim];
            sip += self.modifier[vip];
            som += self.modifier[vom];
            sop += self.modifier[vop];
        }

        if let Some(im) = next_im {
            if self.next_right(vop).is_none() {
                self.thread[vop] = Some(im);
                self.modifier[vop] += sim - sop;
            }
        }
        if let Some(ip) = next_ip {
            if self.next_left(vom).is_none() {
                self.thread[vom] = Some(ip);
                self.modifier[vom] += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.ancestor[vim];
        if self.parent(candidate) == self.parent(v) {
            candidate
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f32) {
        let subtrees = self.number[wp].saturating_sub(self.number[wm]).max(1) as f32;
        let change = shift / subtrees;
        self.change[wp] -= change;
        self.shift[wp] += shift;
        self.change[wm] += change;
        self.prelim[wp] += shift;
        self.modifier[wp] += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for c in self.children(v).iter().rev() {
            let w = c.index();
            self.prelim[w] += shift;
            self.modifier[w] += shift;
            change += self.change[w];
            shift += self.shift[w] + change;
        }
    }
}
