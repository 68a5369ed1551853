//! Activity hydration.
//!
//! Messages are history: by the time an activity is built, the content a
//! message points to may have been deleted, moved to another shared space, or
//! made inaccessible. The builder therefore never fails. Content it cannot
//! resolve drops the candidate (`None`); comments it cannot list degrade to
//! an empty list.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::fetch::{ContentApi, FetchError, FetchResult};
use crate::message::{ContentSnapshot, Message};

use super::{Activity, ActivityKey};

/// Build the activity for `key` from its messages (newest first).
pub async fn create_activity<A>(key: ActivityKey, messages: &[Message], api: &A) -> Option<Activity>
where
    A: ContentApi + ?Sized,
{
    match key {
        ActivityKey::Content(_) => create_content_activity(key, messages, api).await,
        ActivityKey::SharedSpaceMember(_) | ActivityKey::SharedSpaceSubscription(_) => {
            create_single_message_activity(key, messages)
        }
    }
}

/// Wrap the newest message as-is. Event and comment lists start empty and are
/// filled on demand.
#[must_use]
pub fn create_single_message_activity(key: ActivityKey, messages: &[Message]) -> Option<Activity> {
    let newest = messages.first()?;
    Some(Activity {
        id: key,
        event_list: Vec::new(),
        comment_list: Vec::new(),
        newest_message: newest.clone(),
        content: None,
        content_path: None,
        content_available: false,
    })
}

/// Build a content activity, fetching the parent (for comments), the
/// breadcrumb and the comment list.
///
/// Returns `None` when the content is no longer reachable.
pub async fn create_content_activity<A>(
    key: ActivityKey,
    messages: &[Message],
    api: &A,
) -> Option<Activity>
where
    A: ContentApi + ?Sized,
{
    let newest = messages.first()?;
    let Some(snapshot) = newest.content() else {
        debug!(activity = %key, event_id = newest.event_id, "message carries no content");
        return None;
    };

    let content = if snapshot.is_comment() {
        // Comments produce an activity for their parent, not for themselves.
        let has_parent_type = snapshot.parent_content_type.is_some();
        let Some(parent_id) = snapshot.parent_id.filter(|_| has_parent_type) else {
            debug!(activity = %key, content_id = snapshot.content_id, "comment has no parent");
            return None;
        };
        succeeded("content", parent_id, api.get_content(parent_id).await)?
    } else {
        snapshot.clone()
    };

    let path = succeeded(
        "content path",
        content.content_id,
        api.get_content_path(content.content_id).await,
    )?
    .items;

    let comment_list = get_comment_list(&content, api).await;

    Some(Activity {
        id: key,
        event_list: Vec::new(),
        comment_list,
        newest_message: newest.clone(),
        content: Some(Arc::new(content)),
        content_path: Some(path),
        content_available: true,
    })
}

async fn get_comment_list<A>(content: &ContentSnapshot, api: &A) -> Vec<ContentSnapshot>
where
    A: ContentApi + ?Sized,
{
    let result = api
        .get_content_comments(content.workspace_id, content.content_id)
        .await;
    succeeded("comments", content.content_id, result)
        .map(|page| page.items)
        .unwrap_or_default()
}

fn succeeded<T>(
    what: &'static str,
    content_id: u64,
    result: Result<FetchResult<T>, FetchError>,
) -> Option<T> {
    match result {
        Ok(response) if response.is_success() => {
            let body = response.body;
            if body.is_none() {
                warn!(what, content_id, "successful response without body");
            }
            body
        }
        Ok(response) => {
            debug!(
                what,
                content_id,
                status = response.status,
                "content unavailable"
            );
            None
        }
        Err(err) => {
            warn!(what, content_id, error = %err, "fetch failed");
            None
        }
    }
}
