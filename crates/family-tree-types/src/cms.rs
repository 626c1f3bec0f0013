//! CMS API types: static pages, honor list, support messages

use serde::{Deserialize, Serialize};

/// Slugs seeded on startup
pub const PAGE_SLUGS: [&str; 3] = ["about", "support", "tree-pdf"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePage {
    pub slug: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HonorItem {
    pub id: i64,
    pub name: String,
    pub field: Option<String>,
    pub achievement: Option<String>,
    pub photo_url: Option<String>,
    pub ord: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HonorInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub achievement: String,
    #[serde(default)]
    pub photo_url: String,
    /// Display order, 1 when absent
    #[serde(default)]
    pub ord: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportMessage {
    pub id: i64,
    pub sender_name: Option<String>,
    pub phone: Option<String>,
    pub topic: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<String>,
}

/// Public support form body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportSubmission {
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub message: String,
}

impl SupportSubmission {
    /// Trimmed copy of the submission
    pub fn trimmed(&self) -> Self {
        Self {
            sender_name: self.sender_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            topic: self.topic.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Name and message are required
    pub fn is_complete(&self) -> bool {
        !self.sender_name.trim().is_empty() && !self.message.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_submission_requires_name_and_message() {
        let mut s = SupportSubmission {
            sender_name: " علي ".into(),
            message: "   ".into(),
            ..Default::default()
        };
        assert!(!s.is_complete());
        s.message = "شكرا".into();
        assert!(s.is_complete());
        assert_eq!(s.trimmed().sender_name, "علي");
    }

    #[test]
    fn honor_ord_is_optional() {
        let input: HonorInput = serde_json::from_value(serde_json::json!({ "name": "x" })).unwrap();
        assert_eq!(input.ord, None);
        assert_eq!(input.field, "");
    }
}
