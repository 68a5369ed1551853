//! `td replay`: build the activity timeline from a fixture and live stream.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tidings_core::Activity;
use tidings_core::config::FeedConfig;

use super::feed::{FeedArgs, load_feed};
use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_list};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub feed: FeedArgs,
}

/// One timeline row as rendered by `td replay`.
#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub entity_type: String,
    pub newest_event_id: u64,
    pub newest_event_type: String,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub path: Vec<String>,
    pub comments: usize,
    pub events: usize,
    pub content_available: bool,
}

impl From<&Activity> for TimelineEntry {
    fn from(activity: &Activity) -> Self {
        let newest = &activity.newest_message;
        Self {
            id: activity.id.to_string(),
            entity_type: activity.entity_type().to_string(),
            newest_event_id: newest.event_id,
            newest_event_type: newest.event_type.clone(),
            created: newest.created.to_rfc3339(),
            author: newest
                .fields
                .author
                .as_ref()
                .map(|author| author.public_name.clone()),
            label: activity
                .content
                .as_ref()
                .and_then(|content| content.label.clone()),
            path: activity
                .content_path
                .iter()
                .flatten()
                .map(|entry| entry.label.clone())
                .collect(),
            comments: activity.comment_list.len(),
            events: activity.event_list.len(),
            content_available: activity.content_available,
        }
    }
}

impl Renderable for TimelineEntry {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", self.id)?;
        pretty_rule(w)?;
        pretty_kv(
            w,
            "Latest",
            format!("#{} {}", self.newest_event_id, self.newest_event_type),
        )?;
        pretty_kv(w, "When", &self.created)?;
        if let Some(author) = &self.author {
            pretty_kv(w, "By", author)?;
        }
        if let Some(label) = &self.label {
            pretty_kv(w, "Content", label)?;
        }
        if !self.path.is_empty() {
            pretty_kv(w, "Path", self.path.join(" / "))?;
        }
        if self.entity_type == "content" {
            pretty_kv(w, "Comments", self.comments.to_string())?;
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self).map_err(io::Error::other)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id,
            self.newest_event_id,
            self.newest_event_type,
            self.comments,
            self.label.as_deref().unwrap_or("-")
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "EVENT", "TYPE", "COMMENTS", "LABEL"]
    }
}

pub async fn run_replay(args: &ReplayArgs, config: &FeedConfig, output: OutputMode) -> Result<()> {
    let loaded = load_feed(&args.feed, config).await?;
    let entries: Vec<TimelineEntry> = loaded
        .feed
        .activities()
        .iter()
        .map(TimelineEntry::from)
        .collect();
    render_list(&entries, output)?;
    Ok(())
}
