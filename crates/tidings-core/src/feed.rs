//! Paged activity feed.
//!
//! [`ActivityFeed`] owns an activity list and drives the engine the way a
//! client does: it walks the message history page by page, merging each page
//! into the list until enough activities exist, then keeps the list current
//! with live messages.
//!
//! History pages arrive newest first and each page is older than the one
//! before it, which is exactly the ordering the merge engine expects.

use tracing::{debug, info, warn};

use crate::activity::{
    Activity, ActivityKey, add_message_to_activity_list, merge_with_activity_list,
    set_activity_event_list, sort_activity_list,
};
use crate::config::FeedConfig;
use crate::error::ErrorCode;
use crate::fetch::{ContentApi, FetchError, MessageApi, MessageQuery};
use crate::message::Message;

/// Errors raised while paging the message history.
///
/// Activities loaded before the failure are kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("message history request failed with status {status}")]
    PageFetch { status: u16 },

    #[error(transparent)]
    Transport(#[from] FetchError),
}

impl FeedError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::PageFetch { .. } => ErrorCode::PageFetchFailed,
            Self::Transport(_) => ErrorCode::TransportFailed,
        }
    }
}

/// Outcome of [`ActivityFeed::load_until`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub pages: usize,
    pub messages: usize,
    pub added: usize,
}

#[derive(Debug)]
pub struct ActivityFeed<A> {
    api: A,
    config: FeedConfig,
    activities: Vec<Activity>,
    page_token: Option<String>,
    has_next_page: bool,
}

impl<A> ActivityFeed<A>
where
    A: ContentApi + MessageApi,
{
    #[must_use]
    pub const fn new(api: A, config: FeedConfig) -> Self {
        Self {
            api,
            config,
            activities: Vec::new(),
            page_token: None,
            has_next_page: true,
        }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Current activities, newest first after any load or live update.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn into_activities(self) -> Vec<Activity> {
        self.activities
    }

    /// Whether older history remains to be paged in.
    pub const fn has_more(&self) -> bool {
        self.has_next_page
    }

    /// Page in history until at least `min_count` activities exist or the
    /// history is exhausted. The list is sorted afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] when a page request fails. The list keeps the
    /// activities merged from earlier pages and is still sorted.
    pub async fn load_until(&mut self, min_count: usize) -> Result<LoadStats, FeedError> {
        let mut stats = LoadStats::default();
        let result = loop {
            if self.activities.len() >= min_count || !self.has_next_page {
                break Ok(stats);
            }
            match self.load_next_page().await {
                Ok((messages, added)) => {
                    stats.pages += 1;
                    stats.messages += messages;
                    stats.added += added;
                }
                Err(err) => break Err(err),
            }
        };

        self.activities = sort_activity_list(&self.activities);
        info!(
            activities = self.activities.len(),
            pages = stats.pages,
            has_more = self.has_next_page,
            "activity feed loaded"
        );
        result
    }

    /// Fetch and merge one page of history. Returns `(messages, added)`.
    async fn load_next_page(&mut self) -> Result<(usize, usize), FeedError> {
        let query = MessageQuery {
            count: self.config.page_size.max(1),
            page_token: self.page_token.clone(),
            exclude_event_types: self.config.exclude_event_types.clone(),
        };

        let response = self.api.get_messages(&query).await?;
        if !response.is_success() {
            warn!(status = response.status, "message history request failed");
            return Err(FeedError::PageFetch {
                status: response.status,
            });
        }
        let Some(page) = response.body else {
            self.has_next_page = false;
            return Ok((0, 0));
        };

        let before = self.activities.len();
        let activities = std::mem::take(&mut self.activities);
        self.activities = merge_with_activity_list(&page.items, activities, &self.api).await;
        let added = self.activities.len() - before;

        self.has_next_page = page.has_next;
        if page.has_next && (page.items.is_empty() || page.next_page_token.is_none()) {
            warn!("history reports more pages without a usable page token; stopping");
            self.has_next_page = false;
        }
        self.page_token = page.next_page_token;

        debug!(
            messages = page.items.len(),
            added,
            has_next = self.has_next_page,
            "merged history page"
        );
        Ok((page.items.len(), added))
    }

    /// Fold a live message into the feed and re-sort.
    pub async fn apply_live(&mut self, message: &Message) {
        let activities = std::mem::take(&mut self.activities);
        let activities = add_message_to_activity_list(message, activities, &self.api).await;
        self.activities = sort_activity_list(&activities);
    }

    /// Replace the event history of one activity. Returns `false` when no
    /// activity has that id.
    pub fn set_event_list(&mut self, activity_id: ActivityKey, messages: &[Message]) -> bool {
        let found = self.activities.iter().any(|activity| activity.id == activity_id);
        let activities = std::mem::take(&mut self.activities);
        self.activities = set_activity_event_list(activity_id, activities, messages);
        found
    }
}
