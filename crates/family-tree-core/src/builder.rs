//! Flat person records -> `FamilyTree`.
//!
//! Records are processed in ascending id order. The lowest-id record with no
//! parent becomes the root; other parentless records and anything whose
//! parent does not resolve are left out of the rendered tree (logged, not
//! fatal). Cycles and duplicate ids abort the build.

use std::collections::HashMap;

use family_tree_types::{PersonId, PersonRecord};

use crate::error::TreeError;
use crate::tree::{FamilyTree, NodeIdx, TreeNode};

/// What happened to the input during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub input: usize,
    pub placed: usize,
    /// Records whose parent id points at no existing record.
    pub orphans: usize,
    /// Parentless records other than the chosen root.
    pub extra_roots: usize,
}

impl BuildReport {
    /// Records excluded from the tree, including descendants of excluded records.
    pub fn dropped(&self) -> usize {
        self.input - self.placed
    }
}

/// Build with the default rules. `Ok(None)` means there were no records.
pub fn build_tree<I>(records: I) -> Result<Option<FamilyTree>, TreeError>
where
    I: IntoIterator<Item = PersonRecord>,
{
    build_tree_with_report(records).map(|(tree, _)| tree)
}

pub fn build_tree_with_report<I>(
    records: I,
) -> Result<(Option<FamilyTree>, BuildReport), TreeError>
where
    I: IntoIterator<Item = PersonRecord>,
{
    let mut records: Vec<PersonRecord> = records.into_iter().collect();
    records.sort_by_key(|r| r.id);

    let mut report = BuildReport {
        input: records.len(),
        ..Default::default()
    };

    if records.is_empty() {
        return Ok((None, report));
    }

    if let Some(pair) = records.windows(2).find(|w| w[0].id == w[1].id) {
        return Err(TreeError::DuplicateId(pair[0].id));
    }

    let position: HashMap<PersonId, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id, i))
        .collect();
    let parent_of: Vec<Option<usize>> = records
        .iter()
        .map(|r| r.parent_id.and_then(|p| position.get(&p).copied()))
        .collect();

    detect_cycles(&records, &parent_of)?;

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match (record.parent_id, parent_of[i]) {
            (None, _) => roots.push(i),
            (Some(_), Some(p)) => children[p].push(i),
            (Some(_), None) => report.orphans += 1,
        }
    }

    let Some(&root) = roots.first() else {
        return Err(TreeError::NoRoot {
            records: records.len(),
        });
    };
    report.extra_roots = roots.len() - 1;

    let mut slots: Vec<Option<PersonRecord>> = records.into_iter().map(Some).collect();
    let mut nodes: Vec<TreeNode> = Vec::new();
    let mut stack: Vec<(usize, Option<NodeIdx>, u32)> = vec![(root, None, 0)];

    while let Some((src, parent, depth)) = stack.pop() {
        let Some(person) = slots[src].take() else {
            continue;
        };
        let idx = NodeIdx::from_usize(nodes.len());
        nodes.push(TreeNode {
            person,
            parent,
            children: Vec::new(),
            depth,
        });
        if let Some(p) = parent {
            nodes[p.index()].children.push(idx);
        }
        // Reverse so the lowest id is popped first.
        for &child in children[src].iter().rev() {
            stack.push((child, Some(idx), depth + 1));
        }
    }

    report.placed = nodes.len();
    if report.dropped() > 0 {
        tracing::warn!(
            dropped = report.dropped(),
            orphans = report.orphans,
            extra_roots = report.extra_roots,
            "some person records are not reachable from the root"
        );
    } else {
        tracing::debug!(nodes = report.placed, "family tree built");
    }

    Ok((Some(FamilyTree::from_preorder(nodes)), report))
}

/// Walk every parent chain once; a revisit of a node on the current path is a cycle.
fn detect_cycles(records: &[PersonRecord], parent_of: &[Option<usize>]) -> Result<(), TreeError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; records.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..records.len() {
        path.clear();
        let mut cur = Some(start);
        while let Some(i) = cur {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    let from = path.iter().position(|&p| p == i).unwrap_or(0);
                    let mut chain: Vec<PersonId> =
                        path[from..].iter().map(|&p| records[p].id).collect();
                    chain.push(records[i].id);
                    return Err(TreeError::ParentCycle {
                        id: records[i].id,
                        chain,
                    });
                }
                Mark::Unvisited => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    cur = parent_of[i];
                }
            }
        }
        for &i in &path {
            marks[i] = Mark::Done;
        }
    }
    Ok(())
}
