//! Property tests for tree building, layout and focus visibility.

use std::collections::{BTreeMap, BTreeSet};

use family_tree_core::navigation::focus_set;
use family_tree_core::{build_tree, LayoutEngine, NavMode, NavigationState, NodeIdx};
use family_tree_types::{PersonId, PersonRecord};
use proptest::prelude::*;

// -- Strategy helpers --

/// Parent index for every position; position 0 is the root and every other
/// position points at an earlier one, so the shape is always a tree.
fn arb_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..60).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    (0..i).prop_map(Some).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

/// Ids run backwards so children usually have lower ids than their parents.
fn records_for(shape: &[Option<usize>]) -> Vec<PersonRecord> {
    let id_of = |i: usize| (shape.len() - i) as PersonId * 3;
    shape
        .iter()
        .enumerate()
        .map(|(i, p)| PersonRecord::new(id_of(i), format!("person {i}"), p.map(id_of)))
        .collect()
}

fn arb_records() -> impl Strategy<Value = Vec<PersonRecord>> {
    arb_shape()
        .prop_map(|shape| records_for(&shape))
        .prop_flat_map(|records| Just(records).prop_shuffle())
}

fn expected_children(records: &[PersonRecord]) -> BTreeMap<PersonId, Vec<PersonId>> {
    let mut map: BTreeMap<PersonId, Vec<PersonId>> = BTreeMap::new();
    for r in records {
        if let Some(p) = r.parent_id {
            map.entry(p).or_default().push(r.id);
        }
    }
    for children in map.values_mut() {
        children.sort();
    }
    map
}

proptest! {
    #[test]
    fn valid_records_build_a_complete_tree(records in arb_records()) {
        let tree = build_tree(records.clone()).unwrap().unwrap();
        prop_assert_eq!(tree.len(), records.len());

        let expected = expected_children(&records);
        for (_, node) in tree.iter() {
            let actual: Vec<PersonId> = node.children.iter().map(|&c| tree[c].person.id).collect();
            let want = expected.get(&node.person.id).cloned().unwrap_or_default();
            prop_assert_eq!(actual, want);
        }
    }

    #[test]
    fn orphans_never_appear(records in arb_records(), orphan_count in 1usize..8) {
        let base = records.len();
        let mut all = records;
        for k in 0..orphan_count {
            let id = 1_000_000 + k as PersonId;
            // Missing parent, plus a child hanging off the orphan.
            all.push(PersonRecord::new(id, "orphan", Some(-(id))));
            all.push(PersonRecord::new(id + 500_000, "orphan child", Some(id)));
        }
        let tree = build_tree(all).unwrap().unwrap();
        prop_assert_eq!(tree.len(), base);
        for (_, node) in tree.iter() {
            prop_assert!(node.person.id < 1_000_000);
        }
    }

    #[test]
    fn input_order_does_not_matter(records in arb_records()) {
        let mut sorted = records.clone();
        sorted.sort_by_key(|r| r.id);
        prop_assert_eq!(build_tree(records).unwrap(), build_tree(sorted).unwrap());
    }

    #[test]
    fn cards_never_overlap(records in arb_records()) {
        let tree = build_tree(records).unwrap().unwrap();
        let engine = LayoutEngine::default();
        let layout = engine.layout(&tree);
        let card_w = engine.config().card_width;

        let mut by_depth: BTreeMap<u32, Vec<f32>> = BTreeMap::new();
        for (idx, node) in tree.iter() {
            by_depth.entry(node.depth).or_default().push(layout.position(idx).x);
        }
        for xs in by_depth.values_mut() {
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.windows(2) {
                prop_assert!(pair[1] - pair[0] >= card_w, "{} and {} overlap", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn parents_are_centred_over_children(records in arb_records()) {
        let tree = build_tree(records).unwrap().unwrap();
        let layout = LayoutEngine::default().layout(&tree);
        prop_assert_eq!(layout.position(tree.root()).x, 0.0);
        for (idx, node) in tree.iter() {
            if let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) {
                let mid = (layout.position(first).x + layout.position(last).x) / 2.0;
                prop_assert!((layout.position(idx).x - mid).abs() < 0.5);
            }
        }
    }

    #[test]
    fn layout_is_deterministic(records in arb_records()) {
        let tree = build_tree(records).unwrap().unwrap();
        let engine = LayoutEngine::default();
        prop_assert_eq!(engine.layout(&tree), engine.layout(&tree));
    }

    #[test]
    fn focus_shows_exactly_lineage_and_children(records in arb_records(), pick in any::<prop::sample::Index>()) {
        let tree = build_tree(records).unwrap().unwrap();
        let idx = NodeIdx(pick.index(tree.len()) as u32);

        let mut expected: BTreeSet<NodeIdx> = tree.ancestors(idx).collect();
        expected.insert(idx);
        expected.extend(tree.children(idx).iter().copied());

        let mut nav = NavigationState::new(&tree);
        nav.select(&tree, idx).unwrap();
        prop_assert_eq!(nav.mode(), &NavMode::Focused(idx));

        let visible: BTreeSet<NodeIdx> = nav.presentation().highlighted().collect();
        prop_assert_eq!(&visible, &expected);

        let mask = focus_set(&tree, idx);
        prop_assert_eq!(mask.iter().filter(|&&k| k).count(), expected.len());

        for (child, node) in tree.iter() {
            if let Some(parent) = node.parent {
                let both = expected.contains(&parent) && expected.contains(&child);
                prop_assert_eq!(nav.presentation().edge(child) == 1.0, both);
            }
        }
    }

    #[test]
    fn reset_restores_full_visibility(records in arb_records(), pick in any::<prop::sample::Index>()) {
        let tree = build_tree(records).unwrap().unwrap();
        let mut nav = NavigationState::new(&tree);
        let fresh = nav.clone();
        nav.select(&tree, NodeIdx(pick.index(tree.len()) as u32)).unwrap();
        nav.reset(&tree);
        prop_assert_eq!(nav, fresh);
    }
}
