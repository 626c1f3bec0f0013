//! Spatial index over card rectangles for click hit testing.
//!
//! Uses an R-tree (via `rstar`) in world space. Callers invert screen points
//! through the current transform before querying.

use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::{Rect, Vec2};
use crate::layout::TreeLayout;
use crate::navigation::Presentation;
use crate::tree::NodeIdx;

/// One card's world-space rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct CardHit {
    pub node: NodeIdx,
    bounds: AABB<[f32; 2]>,
}

impl CardHit {
    pub fn new(node: NodeIdx, rect: Rect) -> Self {
        Self {
            node,
            bounds: AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]),
        }
    }
}

impl RTreeObject for CardHit {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl PointDistance for CardHit {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        Envelope::distance_2(&self.bounds, point)
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        Envelope::contains_point(&self.bounds, point)
    }
}

#[derive(Clone, Default)]
pub struct HitIndex {
    tree: RTree<CardHit>,
}

impl std::fmt::Debug for HitIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitIndex")
            .field("count", &self.tree.size())
            .finish()
    }
}

impl HitIndex {
    pub fn build(layout: &TreeLayout, card_size: Vec2) -> Self {
        let cards = layout
            .positions()
            .iter()
            .enumerate()
            .map(|(i, &p)| CardHit::new(NodeIdx(i as u32), Rect::from_center_size(p, card_size)))
            .collect();
        Self {
            tree: RTree::bulk_load(cards),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Interactive card under a world-space point.
    ///
    /// Cards never overlap, but if they touch the lower index wins.
    pub fn hit(&self, world: Vec2, presentation: &Presentation) -> Option<NodeIdx> {
        self.tree
            .locate_all_at_point(&[world.x, world.y])
            .map(|c| c.node)
            .filter(|&n| presentation.node(n).interactive)
            .min()
    }

    /// Nodes whose cards intersect a world-space rectangle.
    pub fn query_rect(&self, rect: Rect) -> Vec<NodeIdx> {
        let envelope = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        let mut nodes: Vec<NodeIdx> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|c| c.node)
            .collect();
        nodes.sort();
        nodes
    }
}
