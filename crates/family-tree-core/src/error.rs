//! Error types for tree construction and navigation.
//!
//! `TreeError` is the data-integrity class: the stored records cannot form a
//! tree and the build aborts. `NavFault` is recoverable: the event is refused
//! and the session state is left untouched.

use family_tree_types::PersonId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::NodeIdx;

/// The record set cannot be turned into a single-parent hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Two records share an identifier.
    #[error("duplicate person id {0}")]
    DuplicateId(PersonId),

    /// Following parent references from `id` returns to a record already on the path.
    #[error("parent cycle detected at person {id}: {}", format_chain(.chain))]
    ParentCycle { id: PersonId, chain: Vec<PersonId> },

    /// Records exist but none of them has a null parent.
    #[error("no root: none of the {records} records has an empty parent reference")]
    NoRoot { records: usize },
}

fn format_chain(chain: &[PersonId]) -> String {
    chain
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Navigation fault - a recoverable refusal of a session event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavFault {
    /// Node index outside the current tree.
    #[error("node {0} not found")]
    UnknownNode(NodeIdx),

    /// Node is dimmed by the active focus or filter.
    #[error("node {0} is not interactive in the current mode")]
    NodeNotInteractive(NodeIdx),

    /// No person with this id is part of the rendered tree.
    #[error("person {0} is not part of the rendered tree")]
    UnknownPerson(PersonId),
}

impl NavFault {
    /// Faults caused by clicking something that is dimmed can be ignored by the UI.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NavFault::NodeNotInteractive(_))
    }
}

/// Failure of a person-detail fetch, as reported back into the session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    #[error("person {0} not found")]
    NotFound(PersonId),

    #[error("request failed: {0}")]
    Transient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_shows_chain() {
        let err = TreeError::ParentCycle {
            id: 3,
            chain: vec![3, 4, 3],
        };
        assert_eq!(
            err.to_string(),
            "parent cycle detected at person 3: 3 -> 4 -> 3"
        );
    }

    #[test]
    fn only_dimmed_clicks_are_recoverable() {
        assert!(NavFault::NodeNotInteractive(NodeIdx(1)).is_recoverable());
        assert!(!NavFault::UnknownNode(NodeIdx(9)).is_recoverable());
    }
}
