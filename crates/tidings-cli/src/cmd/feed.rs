//! Shared feed loading for `td replay` and `td show`.
//!
//! The history comes from a fixture file served through [`FixtureApi`]; the
//! optional live file is a captured server-sent event stream replayed in
//! order after the history is loaded.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tidings_core::config::FeedConfig;
use tidings_core::error::ErrorCode;
use tidings_core::fetch::FixtureApi;
use tidings_core::message::stream::{StreamError, StreamFrame, decode_event_stream};
use tidings_core::{ActivityFeed, Message};
use tracing::{info, warn};

use crate::output::CodedError;

#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// JSON fixture with contents, paths, comments and message history.
    #[arg(long, value_name = "FILE")]
    pub fixture: PathBuf,

    /// Captured live stream (server-sent events) applied after the history.
    #[arg(long, value_name = "FILE")]
    pub live: Option<PathBuf>,

    /// Minimum number of activities to page in (overrides config).
    #[arg(long)]
    pub min: Option<usize>,

    /// History page size (overrides config).
    #[arg(long)]
    pub page_size: Option<usize>,
}

impl FeedArgs {
    fn feed_config(&self, base: &FeedConfig) -> FeedConfig {
        FeedConfig {
            page_size: self.page_size.unwrap_or(base.page_size),
            min_activity_count: self.min.unwrap_or(base.min_activity_count),
            exclude_event_types: base.exclude_event_types.clone(),
        }
    }
}

/// A loaded feed plus the live messages that were applied to it.
pub struct LoadedFeed {
    pub feed: ActivityFeed<FixtureApi>,
    pub live: Vec<Message>,
}

pub async fn load_feed(args: &FeedArgs, base: &FeedConfig) -> Result<LoadedFeed> {
    let api = FixtureApi::load(&args.fixture)
        .map_err(|err| CodedError::new(ErrorCode::FixtureParseError, format!("{err:#}")))?;
    let config = args.feed_config(base);
    let min = config.min_activity_count;

    let mut feed = ActivityFeed::new(api, config);
    feed.load_until(min)
        .await
        .map_err(|err| CodedError::new(err.error_code(), err.to_string()))?;

    let live = args
        .live
        .as_deref()
        .map(read_live_stream)
        .transpose()?
        .unwrap_or_default();
    for message in &live {
        feed.apply_live(message).await;
    }

    info!(
        activities = feed.activities().len(),
        live = live.len(),
        "timeline ready"
    );
    Ok(LoadedFeed { feed, live })
}

fn read_live_stream(path: &Path) -> Result<Vec<Message>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut messages = Vec::new();

    for frame in decode_event_stream(BufReader::new(file)) {
        match frame {
            Ok(StreamFrame::Open) => {}
            Ok(StreamFrame::Message(message)) => messages.push(*message),
            Ok(StreamFrame::Error(reason)) => {
                return Err(CodedError::new(ErrorCode::LiveStreamError, reason).into());
            }
            Err(StreamError::Decode { payload, source }) => {
                warn!(error = %source, payload_len = payload.len(), "skipping undecodable live message");
            }
            Err(err @ StreamError::Io(_)) => {
                return Err(anyhow::Error::new(err))
                    .with_context(|| format!("Failed to read {}", path.display()));
            }
        }
    }

    Ok(messages)
}
