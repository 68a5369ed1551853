//! Typed payload carried in a message's `fields` object.
//!
//! Only the parts the activity engine reads are typed. Unknown fields are
//! preserved via `#[serde(flatten)]` for forward compatibility, so a message
//! re-serializes to the shape it arrived in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::SubType;

/// The user that caused an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub user_id: u64,
    #[serde(default)]
    pub public_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Snapshot of a content item as carried by a message or returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub content_id: u64,
    pub content_type: String,
    #[serde(default)]
    pub workspace_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContentSnapshot {
    /// True when this content is a comment on another content.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.content_type == SubType::COMMENT
    }
}

/// One ancestor in a content's breadcrumb path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub content_id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Payload of a live message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_snapshot_keeps_unknown_fields() {
        let raw = json!({
            "content_id": 12,
            "content_type": "html-document",
            "workspace_id": 3,
            "label": "Roadmap",
            "modified": "2021-04-16T10:00:00Z",
            "current_revision_id": 40
        });
        let snapshot: ContentSnapshot = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(snapshot.content_id, 12);
        assert_eq!(snapshot.parent_id, None);
        assert_eq!(snapshot.extra.len(), 2);
        assert_eq!(serde_json::to_value(&snapshot).expect("serialize"), raw);
    }

    #[test]
    fn comment_detection_uses_content_type() {
        let snapshot: ContentSnapshot = serde_json::from_value(json!({
            "content_id": 20,
            "content_type": "comment",
            "parent_id": 12,
            "parent_content_type": "html-document"
        }))
        .expect("parse");
        assert!(snapshot.is_comment());
        assert_eq!(snapshot.workspace_id, 0);
    }

    #[test]
    fn fields_default_to_empty() {
        let fields: MessageFields = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(fields, MessageFields::default());
    }
}
