//! Message → [`ActivityKey`] classification.
//!
//! | Entity            | Key                                                   |
//! |-------------------|-------------------------------------------------------|
//! | `content`         | own content id; parent id for comments                |
//! | `content` comment | only `created` keys; edits and deletions are ignored  |
//! | `mention`         | the mentioned content (its parent if it is a comment) |
//! | `workspace_member`, `workspace_subscription` | the message's own event id |
//! | anything else     | ignored                                               |

use crate::message::{CoreEventType, EntityType, Message};

use super::ActivityKey;

/// Derive the activity a message belongs to.
///
/// Returns `None` for messages that never produce or update an activity,
/// including messages whose payload lacks the id the key needs.
#[must_use]
pub fn get_activity_key(message: &Message) -> Option<ActivityKey> {
    let kind = message.kind().ok()?;

    match kind.entity {
        EntityType::Content => {
            let is_comment = kind.is_comment();
            if is_comment && kind.core != CoreEventType::Created {
                return None;
            }
            let content = message.content()?;
            let content_id = if is_comment {
                content.parent_id?
            } else {
                content.content_id
            };
            Some(ActivityKey::Content(content_id))
        }
        EntityType::Mention => {
            let content = message.content()?;
            let content_id = if content.is_comment() {
                content.parent_id?
            } else {
                content.content_id
            };
            Some(ActivityKey::Content(content_id))
        }
        EntityType::SharedSpaceMember => Some(ActivityKey::SharedSpaceMember(message.event_id)),
        EntityType::SharedSpaceSubscription => {
            Some(ActivityKey::SharedSpaceSubscription(message.event_id))
        }
        EntityType::Reaction
        | EntityType::SharedSpace
        | EntityType::User
        | EntityType::UserCall
        | EntityType::Tag
        | EntityType::ContentTag => None,
    }
}
