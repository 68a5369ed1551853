//! tidings-core library.
//!
//! Turns a stream of live workspace messages into a grouped, deduplicated,
//! newest-first activity timeline.
//!
//! # Conventions
//!
//! - **Errors**: core reconciliation never fails; absence is encoded as
//!   `Option` or an unchanged list. I/O boundaries use `thiserror` enums and
//!   `anyhow::Result` where appropriate.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod activity;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod message;

pub use activity::{
    Activity, ActivityEvent, ActivityEventType, ActivityKey, add_message_to_activity_list,
    get_activity_key, merge_with_activity_list, set_activity_event_list, sort_activity_list,
};
pub use feed::{ActivityFeed, FeedError};
pub use message::{Message, MessageFields};
