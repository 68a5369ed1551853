//! Fold a single new message into an activity list.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::fetch::ContentApi;
use crate::message::{ContentSnapshot, EntityType, Message};

use super::{Activity, classify::get_activity_key, create_activity, create_activity_event};

/// Add `message` to `activities`.
///
/// - Unclassifiable message: list returned unchanged.
/// - No activity for its key: a new activity is built and prepended (new
///   messages are assumed newest). If the build yields nothing the list is
///   unchanged.
/// - Otherwise the matching activity is replaced by [`update_activity`] at
///   the same position. The list is not re-sorted.
pub async fn add_message_to_activity_list<A>(
    message: &Message,
    mut activities: Vec<Activity>,
    api: &A,
) -> Vec<Activity>
where
    A: ContentApi + ?Sized,
{
    let Some(key) = get_activity_key(message) else {
        trace!(event_id = message.event_id, event_type = %message.event_type, "message ignored");
        return activities;
    };

    if let Some(activity) = activities.iter_mut().find(|activity| activity.id == key) {
        *activity = update_activity(message, activity);
        return activities;
    }

    if let Some(activity) = create_activity(key, std::slice::from_ref(message), api).await {
        activities.insert(0, activity);
    }
    activities
}

/// Return `activity` with `message` folded in.
///
/// The event is prepended to the history, comments are appended to the
/// comment list, and `newest_message` becomes `message`. The content snapshot
/// is kept when the message is a comment or a mention inside a comment,
/// since neither can change the parent content.
#[must_use]
pub fn update_activity(message: &Message, activity: &Activity) -> Activity {
    if message.event_id < activity.newest_message.event_id {
        warn!(
            activity = %activity.id,
            event_id = message.event_id,
            newest_event_id = activity.newest_message.event_id,
            "folding a message older than the activity's newest message"
        );
    }

    let is_comment = message.is_comment();
    let is_mention_on_comment = message
        .kind()
        .is_ok_and(|kind| kind.entity == EntityType::Mention)
        && message.content().is_some_and(ContentSnapshot::is_comment);

    let mut event_list = Vec::with_capacity(activity.event_list.len() + 1);
    event_list.push(create_activity_event(message));
    event_list.extend(activity.event_list.iter().cloned());

    let mut comment_list = activity.comment_list.clone();
    if is_comment {
        comment_list.extend(message.content().cloned());
    }

    let content = if is_comment || is_mention_on_comment {
        activity.content.clone()
    } else {
        message
            .content()
            .cloned()
            .map(Arc::new)
            .or_else(|| activity.content.clone())
    };

    Activity {
        id: activity.id,
        event_list,
        comment_list,
        newest_message: message.clone(),
        content,
        content_path: activity.content_path.clone(),
        content_available: activity.content_available,
    }
}
