//! Parsed form of a live message's `event_type` string.
//!
//! The wire representation is a dotted `<entity>.<core>[.<sub>]` triple, e.g.
//! `content.created.file`, `content.modified.comment` or
//! `workspace_member.deleted`. [`EventKind`] is the closed, typed view of
//! that string used by the classifier and the event projection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level category of a live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// A content item (file, note, thread, folder, comment...).
    Content,
    /// A user was mentioned in a content item.
    Mention,
    /// An emoji reaction on a content item.
    Reaction,
    /// The shared space (workspace) itself.
    SharedSpace,
    /// Membership of a user in a shared space.
    SharedSpaceMember,
    /// A subscription request to a shared space.
    SharedSpaceSubscription,
    /// A user account.
    User,
    /// A call between users.
    UserCall,
    /// A tag definition.
    Tag,
    /// A tag attached to a content item.
    ContentTag,
}

impl EntityType {
    /// All known entity types in catalog order.
    pub const ALL: [Self; 10] = [
        Self::Content,
        Self::Mention,
        Self::Reaction,
        Self::SharedSpace,
        Self::SharedSpaceMember,
        Self::SharedSpaceSubscription,
        Self::User,
        Self::UserCall,
        Self::Tag,
        Self::ContentTag,
    ];

    /// Return the wire string for this entity type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Mention => "mention",
            Self::Reaction => "reaction",
            Self::SharedSpace => "workspace",
            Self::SharedSpaceMember => "workspace_member",
            Self::SharedSpaceSubscription => "workspace_subscription",
            Self::User => "user",
            Self::UserCall => "user_call",
            Self::Tag => "tag",
            Self::ContentTag => "content_tag",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|entity| entity.as_str() == s)
            .ok_or_else(|| UnknownEventType::new(s, "entity type"))
    }
}

impl Serialize for EntityType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The action within an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreEventType {
    Created,
    Modified,
    Deleted,
    Undeleted,
}

impl CoreEventType {
    pub const ALL: [Self; 4] = [Self::Created, Self::Modified, Self::Deleted, Self::Undeleted];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Undeleted => "undeleted",
        }
    }
}

impl fmt::Display for CoreEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoreEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|core| core.as_str() == s)
            .ok_or_else(|| UnknownEventType::new(s, "core event type"))
    }
}

/// Refinement of the entity type.
///
/// For content messages this is the content type. Only comments change how a
/// message is grouped, so every other content type is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubType {
    Comment,
    Content(String),
}

impl SubType {
    /// Content type string used for comments on the wire.
    pub const COMMENT: &'static str = "comment";

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Comment => Self::COMMENT,
            Self::Content(name) => name,
        }
    }

    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment)
    }
}

impl From<&str> for SubType {
    fn from(s: &str) -> Self {
        if s == Self::COMMENT {
            Self::Comment
        } else {
            Self::Content(s.to_string())
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `entity.core[.sub]` event type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKind {
    pub entity: EntityType,
    pub core: CoreEventType,
    pub sub: Option<SubType>,
}

impl EventKind {
    #[must_use]
    pub const fn new(entity: EntityType, core: CoreEventType, sub: Option<SubType>) -> Self {
        Self { entity, core, sub }
    }

    /// True when the sub-type is `comment`.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.sub.as_ref().is_some_and(SubType::is_comment)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.core)?;
        if let Some(sub) = &self.sub {
            write!(f, ".{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        let entity = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| UnknownEventType::new(s, "event type"))?
            .parse::<EntityType>()?;
        let core = parts
            .next()
            .ok_or_else(|| UnknownEventType::new(s, "event type"))?
            .parse::<CoreEventType>()?;
        let sub = parts.next().filter(|part| !part.is_empty()).map(SubType::from);
        Ok(Self { entity, core, sub })
    }
}

/// Error returned when an event type string (or one of its segments) is not
/// recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{raw}'")]
pub struct UnknownEventType {
    /// The unrecognised input string.
    pub raw: String,
    /// Which segment failed to parse.
    pub what: &'static str,
}

impl UnknownEventType {
    fn new(raw: &str, what: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            what,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_wire_names() {
        for entity in EntityType::ALL {
            let parsed: EntityType = entity.as_str().parse().expect("should parse");
            assert_eq!(parsed, entity);
        }
        assert_eq!(EntityType::SharedSpaceMember.as_str(), "workspace_member");
    }

    #[test]
    fn parses_full_triple() {
        let kind: EventKind = "content.created.file".parse().expect("parse");
        assert_eq!(kind.entity, EntityType::Content);
        assert_eq!(kind.core, CoreEventType::Created);
        assert_eq!(kind.sub, Some(SubType::Content("file".into())));
        assert!(!kind.is_comment());
    }

    #[test]
    fn parses_comment_sub_type() {
        let kind: EventKind = "content.modified.comment".parse().expect("parse");
        assert!(kind.is_comment());
        assert_eq!(kind.core, CoreEventType::Modified);
    }

    #[test]
    fn parses_pair_without_sub_type() {
        let kind: EventKind = "workspace_member.created".parse().expect("parse");
        assert_eq!(kind.entity, EntityType::SharedSpaceMember);
        assert_eq!(kind.sub, None);
        assert_eq!(kind.to_string(), "workspace_member.created");
    }

    #[test]
    fn sub_type_may_contain_dots() {
        let kind: EventKind = "content.created.html-document.v2".parse().expect("parse");
        assert_eq!(kind.sub, Some(SubType::Content("html-document.v2".into())));
    }

    #[test]
    fn rejects_unknown_entity() {
        let err = "planet.created".parse::<EventKind>().expect_err("should fail");
        assert_eq!(err.raw, "planet");
        assert!(err.to_string().contains("entity type"));
    }

    #[test]
    fn rejects_unknown_core() {
        let err = "content.exploded.file".parse::<EventKind>().expect_err("should fail");
        assert_eq!(err.raw, "exploded");
    }

    #[test]
    fn rejects_empty_and_bare_entity() {
        assert!("".parse::<EventKind>().is_err());
        assert!("content".parse::<EventKind>().is_err());
    }
}
