//! Live message model.
//!
//! A [`Message`] is one real-time notification as delivered by the server,
//! either over the live event stream (see [`stream`]) or from the paginated
//! message history. Messages are immutable once received.
//!
//! # Wire shape
//!
//! ```json
//! {
//!   "event_id": 42,
//!   "event_type": "content.created.comment",
//!   "created": "2021-04-16T10:00:00Z",
//!   "read": null,
//!   "fields": { "author": { ... }, "content": { ... }, "workspace": { ... } }
//! }
//! ```

pub mod fields;
pub mod stream;
pub mod types;

pub use fields::{Author, ContentSnapshot, MessageFields, PathEntry};
pub use types::{CoreEventType, EntityType, EventKind, SubType, UnknownEventType};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single live message.
///
/// `event_type` is kept in its wire form so that messages of entity types this
/// crate does not know about still deserialize (and are then ignored by the
/// classifier). Use [`Message::kind`] for the typed view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Globally ordered, monotonically increasing identifier.
    pub event_id: u64,

    /// Dotted `entity.core[.sub]` event type.
    pub event_type: String,

    /// Typed payload.
    #[serde(default)]
    pub fields: MessageFields,

    /// When the server produced the event.
    pub created: DateTime<Utc>,

    /// When the recipient marked the message as read, if they did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<DateTime<Utc>>,
}

impl Message {
    /// Parse the event type into its typed form.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEventType`] when the entity or core segment is not
    /// part of the catalog.
    pub fn kind(&self) -> Result<EventKind, UnknownEventType> {
        self.event_type.parse()
    }

    /// True when the event type's sub-type is `comment`.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind().is_ok_and(|kind| kind.is_comment())
    }

    /// The content snapshot carried by the message, if any.
    #[must_use]
    pub const fn content(&self) -> Option<&ContentSnapshot> {
        self.fields.content.as_ref()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.event_id, self.event_type)?;
        if let Some(content) = self.content() {
            write!(f, " content={}", content.content_id)?;
        }
        Ok(())
    }
}
