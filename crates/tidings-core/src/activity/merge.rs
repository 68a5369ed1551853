//! Merge a batch of older messages into an activity list.
//!
//! # Merge Semantics
//!
//! 1. Group the batch by [`ActivityKey`], in first-seen order. Messages the
//!    classifier rejects are dropped.
//! 2. Discard groups whose key already has an activity. Those messages are
//!    assumed represented; updating existing activities is the job of
//!    [`add_message_to_activity_list`](super::add_message_to_activity_list).
//! 3. Build one activity per remaining group. All builds run concurrently
//!    and are joined together; a build that yields `None` (unreachable
//!    content) is dropped without affecting its siblings.
//! 4. Append the new activities after the existing ones, in group order.
//!
//! The result is not re-sorted.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use tracing::debug;

use crate::fetch::ContentApi;
use crate::message::Message;

use super::{Activity, ActivityKey, classify::get_activity_key, create_activity};

/// Messages sharing one activity key, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageGroup {
    pub key: ActivityKey,
    pub messages: Vec<Message>,
}

/// Group messages by activity key, preserving first-seen order of keys and
/// input order within each group.
#[must_use]
pub fn group_messages_by_activity(messages: &[Message]) -> Vec<MessageGroup> {
    let mut groups: Vec<MessageGroup> = Vec::new();
    let mut index: HashMap<ActivityKey, usize> = HashMap::new();

    for message in messages {
        let Some(key) = get_activity_key(message) else {
            continue;
        };
        match index.entry(key) {
            Entry::Occupied(slot) => groups[*slot.get()].messages.push(message.clone()),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push(MessageGroup {
                    key,
                    messages: vec![message.clone()],
                });
            }
        }
    }

    groups
}

/// Merge `messages` (newest first, older than anything in `activities`) into
/// `activities`.
pub async fn merge_with_activity_list<A>(
    messages: &[Message],
    activities: Vec<Activity>,
    api: &A,
) -> Vec<Activity>
where
    A: ContentApi + ?Sized,
{
    let known: HashSet<ActivityKey> = activities.iter().map(|activity| activity.id).collect();
    let mut groups = group_messages_by_activity(messages);
    let grouped = groups.len();
    groups.retain(|group| !known.contains(&group.key));

    let built: Vec<Activity> = join_all(
        groups
            .iter()
            .map(|group| create_activity(group.key, &group.messages, api)),
    )
    .await
    .into_iter()
    .flatten()
    .collect();

    debug!(
        messages = messages.len(),
        groups = grouped,
        already_known = grouped - groups.len(),
        dropped = groups.len() - built.len(),
        added = built.len(),
        "merged message batch"
    );

    let mut merged = activities;
    merged.extend(built);
    merged
}
