//! `td show`: display one activity with its full event history.
//!
//! The event history is not part of a freshly built activity. It is
//! hydrated here from every history and live message that keys to the
//! activity, newest first. History messages of excluded event types are left
//! out, as the feed never requested them.

use std::cmp::Reverse;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tidings_core::activity::{ActivityEvent, ActivityKey, get_activity_key};
use tidings_core::config::FeedConfig;
use tidings_core::error::ErrorCode;
use tidings_core::fetch::MessageQuery;

use super::feed::{FeedArgs, load_feed};
use super::replay::TimelineEntry;
use crate::output::{CodedError, OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Activity id, e.g. "content-10" or "workspace_member-e12".
    pub id: String,

    #[command(flatten)]
    pub feed: FeedArgs,
}

#[derive(Debug, Serialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub entry: TimelineEntry,
    pub event_list: Vec<ActivityEvent>,
    pub comment_ids: Vec<u64>,
}

pub async fn run_show(args: &ShowArgs, config: &FeedConfig, output: OutputMode) -> Result<()> {
    let id: ActivityKey = args
        .id
        .parse()
        .map_err(|err| CodedError::new(ErrorCode::InvalidActivityId, format!("{err}")))?;

    let mut loaded = load_feed(&args.feed, config).await?;

    let history = MessageQuery {
        exclude_event_types: loaded.feed.config().exclude_event_types.clone(),
        ..MessageQuery::default()
    };
    let mut messages: Vec<_> = loaded
        .feed
        .api()
        .fixture()
        .messages
        .iter()
        .filter(|message| !history.excludes(&message.event_type))
        .chain(loaded.live.iter())
        .filter(|message| get_activity_key(message) == Some(id))
        .cloned()
        .collect();
    messages.sort_by_key(|message| Reverse(message.event_id));
    messages.dedup_by_key(|message| message.event_id);

    if !loaded.feed.set_event_list(id, &messages) {
        return Err(CodedError::new(
            ErrorCode::ActivityNotFound,
            format!("no activity '{id}' in the timeline"),
        )
        .into());
    }

    let Some(activity) = loaded.feed.activities().iter().find(|a| a.id == id) else {
        return Err(CodedError::new(ErrorCode::InternalUnexpected, "activity vanished").into());
    };

    let detail = ActivityDetail {
        entry: TimelineEntry::from(activity),
        event_list: activity.event_list.clone(),
        comment_ids: activity
            .comment_list
            .iter()
            .map(|comment| comment.content_id)
            .collect(),
    };

    render_mode(
        output,
        &detail,
        |d, w| {
            for event in &d.event_list {
                writeln!(
                    w,
                    "{}  {}  {}",
                    event.event_id,
                    event.event_type,
                    event.created.to_rfc3339()
                )?;
            }
            Ok(())
        },
        |d, w| {
            pretty_section(w, &d.entry.id)?;
            if let Some(label) = &d.entry.label {
                pretty_kv(w, "Content", label)?;
            }
            if !d.entry.path.is_empty() {
                pretty_kv(w, "Path", d.entry.path.join(" / "))?;
            }
            pretty_kv(w, "Available", d.entry.content_available.to_string())?;
            pretty_kv(w, "Comments", d.comment_ids.len().to_string())?;
            writeln!(w)?;
            pretty_section(w, "Events")?;
            for event in &d.event_list {
                let author = event
                    .author
                    .as_ref()
                    .map_or("unknown", |author| author.public_name.as_str());
                writeln!(
                    w,
                    "#{:<6} {:<20} {:<20} {}",
                    event.event_id,
                    event.event_type.to_string(),
                    author,
                    event.created.format("%Y-%m-%d %H:%M:%S")
                )?;
            }
            Ok(())
        },
    )
}
