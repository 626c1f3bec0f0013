//! Shared API Types for the family tree site
//!
//! This crate is the SINGLE SOURCE OF TRUTH for all types crossing HTTP boundaries.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────┐
//! │  Rust Server     │  JSON   │  Viewer          │
//! │  (Axum)          │ ◄─────► │  (egui)          │
//! └──────────────────┘         └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. All API types live here - no inline struct definitions in handlers
//! 2. Field names are stable: the viewer binds to them directly
//! 3. Person identifiers are SQLite rowids (`i64`)

pub mod cms;

use serde::{Deserialize, Serialize};

pub use cms::*;

/// Person identifier (SQLite rowid)
pub type PersonId = i64;

/// Image shown when a person has no photo
pub const PLACEHOLDER_PHOTO: &str = "/images/default.png";

/// Resolve an optional photo reference to something renderable
pub fn photo_or_placeholder(photo_url: Option<&str>) -> &str {
    match photo_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => PLACEHOLDER_PHOTO,
    }
}

// ============================================================================
// PERSONS
// ============================================================================

/// One row of the persons table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub name: String,
    /// Parent reference; `None` marks a root candidate
    #[serde(rename = "father_id", default)]
    pub parent_id: Option<PersonId>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub lineage: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PersonRecord {
    /// Minimal record with only a name and parent
    pub fn new(id: PersonId, name: impl Into<String>, parent_id: Option<PersonId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
            birth_date: None,
            job: None,
            lineage: None,
            photo_url: None,
            notes: None,
        }
    }

    pub fn photo(&self) -> &str {
        photo_or_placeholder(self.photo_url.as_deref())
    }
}

/// Nested tree returned by `GET /api/tree`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNodeDto {
    #[serde(flatten)]
    pub person: PersonRecord,
    #[serde(default)]
    pub children: Vec<TreeNodeDto>,
}

impl TreeNodeDto {
    /// Total number of people in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNodeDto::count).sum::<usize>()
    }
}

/// Child reference inside a person detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub id: PersonId,
    pub name: String,
}

/// Spouse name with its display order (1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpouseName {
    pub spouse_name: String,
    pub ord: i64,
}

/// Response of `GET /api/person/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetail {
    #[serde(flatten)]
    pub person: PersonRecord,
    #[serde(default)]
    pub children: Vec<ChildSummary>,
    #[serde(default)]
    pub spouses: Vec<SpouseName>,
}

/// Admin create/update payload for a person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInput {
    pub name: String,
    #[serde(default)]
    pub father_id: Option<PersonId>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub lineage: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Accepts a single string or a list, like a repeated form field
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub spouse_names: Vec<String>,
}

/// Row of the admin person table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminPersonRow {
    #[serde(flatten)]
    pub person: PersonRecord,
    pub father_name: Option<String>,
    /// Spouse names joined with `" | "` in display order
    pub spouses_text: Option<String>,
}

/// Data needed to render the admin person form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFormData {
    pub person: Option<PersonRecord>,
    /// Candidate fathers, ordered by name
    pub persons: Vec<ChildSummary>,
    pub spouse_names: Vec<String>,
}

/// Drop blank entries and trim the rest, keeping order
pub fn normalize_spouse_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Helper to deserialize a single string or a list of strings into a list
fn deserialize_one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct OneOrManyVisitor;

    impl<'de> de::Visitor<'de> for OneOrManyVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(vec![v])
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                out.push(item);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(OneOrManyVisitor)
}

// ============================================================================
// LAYOUT API
// ============================================================================

/// A laid-out person as returned by `GET /api/tree/layout`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: PersonId,
    pub name: String,
    pub photo_url: String,
    pub parent: Option<PersonId>,
    pub depth: u32,
    pub x: f32,
    pub y: f32,
}

impl PositionedNode {
    /// The tree-shaping part of the row; the viewer rebuilds its tree from these
    pub fn to_record(&self) -> PersonRecord {
        let mut record = PersonRecord::new(self.id, self.name.clone(), self.parent);
        if self.photo_url != PLACEHOLDER_PHOTO {
            record.photo_url = Some(self.photo_url.clone());
        }
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDto {
    pub source: PersonId,
    pub target: PersonId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsDto {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeLayoutResponse {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<EdgeDto>,
    pub bounds: Option<BoundsDto>,
}

/// Query of `GET /api/tree.svg`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvgParams {
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Render with this person focused
    pub focus: Option<PersonId>,
    /// Render with this name filter applied
    pub q: Option<String>,
}

// ============================================================================
// AUTH / MISC
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Error body for every non-2xx JSON response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn person_record_uses_father_id_on_the_wire() {
        let json = serde_json::json!({ "id": 2, "name": "يوسف", "father_id": 1 });
        let person: PersonRecord = serde_json::from_value(json).unwrap();
        assert_eq!(person.parent_id, Some(1));
        assert_eq!(person.birth_date, None);

        let back = serde_json::to_value(&person).unwrap();
        assert_eq!(back["father_id"], 1);
        assert!(back.get("parent_id").is_none());
    }

    #[test]
    fn tree_node_flattens_person_fields() {
        let node = TreeNodeDto {
            person: PersonRecord::new(1, "حسن", None),
            children: vec![TreeNodeDto {
                person: PersonRecord::new(2, "يوسف", Some(1)),
                children: vec![],
            }],
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["name"], "حسن");
        assert_eq!(json["children"][0]["father_id"], 1);
        assert_eq!(node.count(), 2);
    }

    #[test]
    fn spouse_names_accept_single_string_or_list() {
        let single: PersonInput =
            serde_json::from_value(serde_json::json!({ "name": "a", "spouse_names": "x" })).unwrap();
        assert_eq!(single.spouse_names, vec!["x".to_string()]);

        let many: PersonInput = serde_json::from_value(
            serde_json::json!({ "name": "a", "spouse_names": ["x", "y"] }),
        )
        .unwrap();
        assert_eq!(many.spouse_names.len(), 2);

        let missing: PersonInput = serde_json::from_value(serde_json::json!({ "name": "a" })).unwrap();
        assert!(missing.spouse_names.is_empty());
    }

    #[test]
    fn normalize_drops_blank_names() {
        let names = vec![" مريم ".to_string(), "".to_string(), "  ".to_string(), "سارة".to_string()];
        assert_eq!(
            normalize_spouse_names(&names),
            vec!["مريم".to_string(), "سارة".to_string()]
        );
    }

    #[test]
    fn missing_photo_resolves_to_placeholder() {
        assert_eq!(photo_or_placeholder(None), PLACEHOLDER_PHOTO);
        assert_eq!(photo_or_placeholder(Some("  ")), PLACEHOLDER_PHOTO);
        assert_eq!(photo_or_placeholder(Some("/uploads/a.png")), "/uploads/a.png");
    }

    #[test]
    fn positioned_node_drops_placeholder_photo() {
        let mut node = PositionedNode {
            id: 4,
            name: "حازم".into(),
            photo_url: PLACEHOLDER_PHOTO.into(),
            parent: Some(3),
            depth: 3,
            x: 0.0,
            y: 630.0,
        };
        assert_eq!(node.to_record(), PersonRecord::new(4, "حازم", Some(3)));
        node.photo_url = "/uploads/1-a.png".into();
        assert_eq!(node.to_record().photo_url.as_deref(), Some("/uploads/1-a.png"));
    }
}
