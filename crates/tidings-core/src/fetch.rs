//! Fetcher capabilities the activity engine depends on.
//!
//! The engine never talks to the network itself. It consumes two async
//! traits:
//!
//! - [`ContentApi`]: content by id, its ancestor path, and its comments.
//!   Used by the activity builder.
//! - [`MessageApi`]: pages of the user's message history. Used by the feed
//!   pager.
//!
//! Every call returns a [`FetchResult`] carrying an HTTP-like status and an
//! optional body. Status 200 is success; anything else is a failure whose
//! handling is decided by the caller. [`FetchError`] is reserved for the
//! transport itself failing (no status at all).
//!
//! [`FixtureApi`] implements both traits from an in-memory fixture and backs
//! the tests and the `td replay` command.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::message::{ContentSnapshot, Message, PathEntry};

/// Status code treated as success.
pub const STATUS_OK: u16 = 200;

/// Status returned when a fixture has no record for an id.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Response of a fetch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult<T> {
    pub status: u16,
    pub body: Option<T>,
}

impl<T> FetchResult<T> {
    #[must_use]
    pub const fn ok(body: T) -> Self {
        Self {
            status: STATUS_OK,
            body: Some(body),
        }
    }

    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The body of a successful response.
    #[must_use]
    pub fn into_success(self) -> Option<T> {
        if self.is_success() { self.body } else { None }
    }
}

/// A list response (`{"items": [...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
}

/// One page of message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
    /// Messages, newest first.
    pub items: Vec<Message>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Query for a page of message history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    pub count: usize,
    pub page_token: Option<String>,
    /// Event type prefixes to leave out (`content.modified`, `user`...).
    pub exclude_event_types: Vec<String>,
}

impl MessageQuery {
    /// True when `event_type` is filtered out by this query.
    #[must_use]
    pub fn excludes(&self, event_type: &str) -> bool {
        self.exclude_event_types.iter().any(|prefix| {
            event_type == prefix
                || event_type
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// The transport failed before producing a status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("response body could not be decoded: {0}")]
    Body(String),
}

/// Content lookups used to hydrate activities.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Comments of a content item, oldest first.
    async fn get_content_comments(
        &self,
        workspace_id: u64,
        content_id: u64,
    ) -> Result<FetchResult<Page<ContentSnapshot>>, FetchError>;

    /// A content item by id, wherever it lives now.
    async fn get_content(&self, content_id: u64) -> Result<FetchResult<ContentSnapshot>, FetchError>;

    /// Breadcrumb of a content item, root first.
    async fn get_content_path(
        &self,
        content_id: u64,
    ) -> Result<FetchResult<Page<PathEntry>>, FetchError>;
}

/// Paginated message history.
#[async_trait]
pub trait MessageApi: Send + Sync {
    async fn get_messages(&self, query: &MessageQuery)
    -> Result<FetchResult<MessagePage>, FetchError>;
}

// ---------------------------------------------------------------------------
// FixtureApi
// ---------------------------------------------------------------------------

/// Forced statuses per id. Status `0` simulates a transport failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusOverrides {
    #[serde(default)]
    pub content: BTreeMap<u64, u16>,
    #[serde(default)]
    pub path: BTreeMap<u64, u16>,
    #[serde(default)]
    pub comments: BTreeMap<u64, u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<u16>,
}

/// On-disk / in-memory fixture backing [`FixtureApi`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub contents: Vec<ContentSnapshot>,
    #[serde(default)]
    pub paths: BTreeMap<u64, Vec<PathEntry>>,
    #[serde(default)]
    pub comments: BTreeMap<u64, Vec<ContentSnapshot>>,
    /// Message history, any order; served newest first.
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub status: StatusOverrides,
}

/// In-memory implementation of [`ContentApi`] and [`MessageApi`].
///
/// Unknown content ids answer 404. A known content without an explicit path
/// answers a single-entry path built from the content itself. Missing
/// comment lists answer an empty page.
#[derive(Debug, Default)]
pub struct FixtureApi {
    fixture: Fixture,
    content_calls: AtomicUsize,
    path_calls: AtomicUsize,
    comment_calls: AtomicUsize,
    message_calls: AtomicUsize,
}

impl FixtureApi {
    #[must_use]
    pub fn new(mut fixture: Fixture) -> Self {
        fixture.messages.sort_by_key(|message| Reverse(message.event_id));
        Self {
            fixture,
            ..Self::default()
        }
    }

    /// Load a fixture from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let fixture = serde_json::from_str::<Fixture>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self::new(fixture))
    }

    #[must_use]
    pub const fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    /// Number of `get_content` calls served.
    #[must_use]
    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::Relaxed)
    }

    /// Number of `get_content_path` calls served.
    #[must_use]
    pub fn path_calls(&self) -> usize {
        self.path_calls.load(Ordering::Relaxed)
    }

    /// Number of `get_content_comments` calls served.
    #[must_use]
    pub fn comment_calls(&self) -> usize {
        self.comment_calls.load(Ordering::Relaxed)
    }

    /// Number of `get_messages` calls served.
    #[must_use]
    pub fn message_calls(&self) -> usize {
        self.message_calls.load(Ordering::Relaxed)
    }

    fn find_content(&self, content_id: u64) -> Option<&ContentSnapshot> {
        self.fixture
            .contents
            .iter()
            .find(|content| content.content_id == content_id)
    }
}

fn forced<T>(status: Option<u16>) -> Option<Result<FetchResult<T>, FetchError>> {
    match status? {
        0 => Some(Err(FetchError::Transport("connection reset".to_string()))),
        status => Some(Ok(FetchResult::status(status))),
    }
}

#[async_trait]
impl ContentApi for FixtureApi {
    async fn get_content_comments(
        &self,
        _workspace_id: u64,
        content_id: u64,
    ) -> Result<FetchResult<Page<ContentSnapshot>>, FetchError> {
        self.comment_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(result) = forced(self.fixture.status.comments.get(&content_id).copied()) {
            return result;
        }
        let items = self
            .fixture
            .comments
            .get(&content_id)
            .cloned()
            .unwrap_or_default();
        Ok(FetchResult::ok(Page { items }))
    }

    async fn get_content(&self, content_id: u64) -> Result<FetchResult<ContentSnapshot>, FetchError> {
        self.content_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(result) = forced(self.fixture.status.content.get(&content_id).copied()) {
            return result;
        }
        Ok(self
            .find_content(content_id)
            .cloned()
            .map_or_else(|| FetchResult::status(STATUS_NOT_FOUND), FetchResult::ok))
    }

    async fn get_content_path(
        &self,
        content_id: u64,
    ) -> Result<FetchResult<Page<PathEntry>>, FetchError> {
        self.path_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(result) = forced(self.fixture.status.path.get(&content_id).copied()) {
            return result;
        }
        if let Some(items) = self.fixture.paths.get(&content_id) {
            return Ok(FetchResult::ok(Page {
                items: items.clone(),
            }));
        }
        Ok(self.find_content(content_id).map_or_else(
            || FetchResult::status(STATUS_NOT_FOUND),
            |content| {
                FetchResult::ok(Page {
                    items: vec![PathEntry {
                        content_id: content.content_id,
                        label: content.label.clone().unwrap_or_default(),
                        slug: None,
                        content_type: Some(content.content_type.clone()),
                    }],
                })
            },
        ))
    }
}

#[async_trait]
impl MessageApi for FixtureApi {
    async fn get_messages(
        &self,
        query: &MessageQuery,
    ) -> Result<FetchResult<MessagePage>, FetchError> {
        self.message_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(result) = forced(self.fixture.status.messages) {
            return result;
        }

        let before = match query.page_token.as_deref().map(str::parse::<u64>) {
            None => None,
            Some(Ok(event_id)) => Some(event_id),
            Some(Err(err)) => return Err(FetchError::Body(format!("bad page token: {err}"))),
        };

        let mut remaining = self
            .fixture
            .messages
            .iter()
            .filter(|message| before.is_none_or(|event_id| message.event_id < event_id))
            .filter(|message| !query.excludes(&message.event_type));

        let items: Vec<Message> = remaining.by_ref().take(query.count).cloned().collect();
        let has_next = remaining.next().is_some();
        let next_page_token = if has_next {
            items.last().map(|message| message.event_id.to_string())
        } else {
            None
        };

        Ok(FetchResult::ok(MessagePage {
            items,
            has_next,
            next_page_token,
        }))
    }
}
