//! Activity timeline model and reconciliation engine.
//!
//! An [`Activity`] groups every live message about the same entity (a content
//! item and its comments, or a single membership change) into one timeline
//! entry. This module owns the data types plus the two pure list operations:
//!
//! - [`sort_activity_list`]: newest first by `newest_message.event_id`.
//! - [`set_activity_event_list`]: replace one activity's event history.
//!
//! The message-driven operations live in submodules:
//!
//! - [`classify`]: message → [`ActivityKey`].
//! - [`build`]: key + messages → hydrated [`Activity`] (async, may drop).
//! - [`merge`]: fold a batch of older messages into a list.
//! - [`update`]: fold a single newer message into a list.
//!
//! # Copy-on-write
//!
//! Every list operation takes the list by value and returns the next
//! version. Nothing is mutated behind a shared reference; callers that need
//! the previous snapshot keep a clone.
//!
//! # Ordering contract
//!
//! Message batches are expected newest to oldest. This is not enforced; an
//! out-of-order batch produces a stale `newest_message`.

pub mod build;
pub mod classify;
pub mod merge;
pub mod update;

pub use build::{create_activity, create_content_activity, create_single_message_activity};
pub use classify::get_activity_key;
pub use merge::{MessageGroup, group_messages_by_activity, merge_with_activity_list};
pub use update::{add_message_to_activity_list, update_activity};

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{
    Author, ContentSnapshot, CoreEventType, EntityType, Message, PathEntry, SubType,
};

// ---------------------------------------------------------------------------
// ActivityKey
// ---------------------------------------------------------------------------

/// Grouping identifier of an activity.
///
/// Messages with equal keys belong to the same activity. Content keys carry
/// the content id (the parent's id for comments); shared-space keys carry the
/// message's own event id so those activities never group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityKey {
    Content(u64),
    SharedSpaceMember(u64),
    SharedSpaceSubscription(u64),
}

impl ActivityKey {
    /// Entity type the activity is about.
    #[must_use]
    pub const fn entity_type(self) -> EntityType {
        match self {
            Self::Content(_) => EntityType::Content,
            Self::SharedSpaceMember(_) => EntityType::SharedSpaceMember,
            Self::SharedSpaceSubscription(_) => EntityType::SharedSpaceSubscription,
        }
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(content_id) => write!(f, "{}-{content_id}", self.entity_type()),
            Self::SharedSpaceMember(event_id) | Self::SharedSpaceSubscription(event_id) => {
                write!(f, "{}-e{event_id}", self.entity_type())
            }
        }
    }
}

/// Error returned when an activity id string does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid activity id '{0}': expected content-<id>, workspace_member-e<id> or workspace_subscription-e<id>"
)]
pub struct InvalidActivityKey(pub String);

impl FromStr for ActivityKey {
    type Err = InvalidActivityKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidActivityKey(s.to_string());
        let (entity, id) = s.rsplit_once('-').ok_or_else(invalid)?;
        let entity: EntityType = entity.parse().map_err(|_| invalid())?;
        match entity {
            EntityType::Content => id.parse().map(Self::Content).map_err(|_| invalid()),
            EntityType::SharedSpaceMember => id
                .strip_prefix('e')
                .and_then(|n| n.parse().ok())
                .map(Self::SharedSpaceMember)
                .ok_or_else(invalid),
            EntityType::SharedSpaceSubscription => id
                .strip_prefix('e')
                .and_then(|n| n.parse().ok())
                .map(Self::SharedSpaceSubscription)
                .ok_or_else(invalid),
            EntityType::Mention
            | EntityType::Reaction
            | EntityType::SharedSpace
            | EntityType::User
            | EntityType::UserCall
            | EntityType::Tag
            | EntityType::ContentTag => Err(invalid()),
        }
    }
}

impl Serialize for ActivityKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActivityKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ActivityEvent
// ---------------------------------------------------------------------------

/// Human-normalized event label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityEventType {
    /// A plain core event on the entity (`created`, `modified`...).
    Core(CoreEventType),
    /// A comment was created.
    Commented,
    /// A comment was modified, deleted or undeleted.
    Comment(CoreEventType),
    /// The event type is not in the catalog; carries its raw label.
    Other(String),
}

impl fmt::Display for ActivityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(core) => write!(f, "{core}"),
            Self::Commented => f.write_str("commented"),
            Self::Comment(core) => write!(f, "comment {core}"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for ActivityEventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Display projection of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    pub event_id: u64,
    pub event_type: ActivityEventType,
    pub author: Option<Author>,
    pub created: DateTime<Utc>,
}

/// Project a message into an [`ActivityEvent`].
///
/// Independent of the classifier: any message projects, including ones the
/// classifier ignores.
#[must_use]
pub fn create_activity_event(message: &Message) -> ActivityEvent {
    let event_type = message.kind().map_or_else(
        |_| uncataloged_event_type(&message.event_type),
        |kind| match (kind.sub, kind.core) {
            (Some(SubType::Comment), CoreEventType::Created) => ActivityEventType::Commented,
            (Some(SubType::Comment), core) => ActivityEventType::Comment(core),
            (_, core) => ActivityEventType::Core(core),
        },
    );

    ActivityEvent {
        event_id: message.event_id,
        event_type,
        author: message.fields.author.clone(),
        created: message.created,
    }
}

/// Label for an event type outside the catalog: its core part, prefixed with
/// "comment" when the subtype is a comment.
fn uncataloged_event_type(raw: &str) -> ActivityEventType {
    let mut parts = raw.split('.').skip(1);
    let core = parts.next().unwrap_or_default();
    if parts.next() == Some(SubType::COMMENT) {
        ActivityEventType::Other(format!("comment {core}"))
    } else {
        ActivityEventType::Other(core.to_string())
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityKey,
    /// Event history, newest first.
    pub event_list: Vec<ActivityEvent>,
    /// Comments on the content, oldest first.
    pub comment_list: Vec<ContentSnapshot>,
    /// Most recent message folded into this activity; the sort key.
    pub newest_message: Message,
    /// Snapshot of the referenced content. `None` for shared-space activities.
    pub content: Option<Arc<ContentSnapshot>>,
    /// Breadcrumb of the content, root first.
    pub content_path: Option<Vec<PathEntry>>,
    /// Whether the content still resolved when the activity was built.
    pub content_available: bool,
}

impl Activity {
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.id.entity_type()
    }
}

/// Sort activities newest first by `newest_message.event_id`.
///
/// The sort is stable and returns a new list; the input is left untouched.
#[must_use]
pub fn sort_activity_list(activities: &[Activity]) -> Vec<Activity> {
    let mut sorted = activities.to_vec();
    sorted.sort_by_key(|activity| Reverse(activity.newest_message.event_id));
    sorted
}

/// Replace the event list of activity `activity_id` with `messages` projected
/// through [`create_activity_event`].
///
/// Returns the list unchanged if no activity has that id.
#[must_use]
pub fn set_activity_event_list(
    activity_id: ActivityKey,
    mut activities: Vec<Activity>,
    messages: &[Message],
) -> Vec<Activity> {
    if let Some(activity) = activities.iter_mut().find(|a| a.id == activity_id) {
        activity.event_list = messages.iter().map(create_activity_event).collect();
    }
    activities
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
