pub mod classify;
pub mod completions;
pub mod feed;
pub mod replay;
pub mod show;
