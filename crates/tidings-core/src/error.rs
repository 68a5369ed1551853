use std::fmt;

/// Machine-readable error codes surfaced by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    FixtureParseError,
    MessageParseError,
    InvalidActivityId,
    ActivityNotFound,
    PageFetchFailed,
    TransportFailed,
    LiveStreamError,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::FixtureParseError => "E1002",
            Self::MessageParseError => "E2001",
            Self::InvalidActivityId => "E2002",
            Self::ActivityNotFound => "E2003",
            Self::PageFetchFailed => "E3001",
            Self::TransportFailed => "E3002",
            Self::LiveStreamError => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::FixtureParseError => "Fixture file parse error",
            Self::MessageParseError => "Message could not be decoded",
            Self::InvalidActivityId => "Invalid activity id",
            Self::ActivityNotFound => "Activity not found",
            Self::PageFetchFailed => "Message history request failed",
            Self::TransportFailed => "Transport failure",
            Self::LiveStreamError => "Live stream reported an error",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the tidings config.toml and retry."),
            Self::FixtureParseError => {
                Some("Check the fixture JSON: contents, paths, comments, messages, status.")
            }
            Self::MessageParseError => {
                Some("Each line must be one JSON message with event_id, event_type and created.")
            }
            Self::InvalidActivityId => {
                Some("Use content-<id>, workspace_member-e<id> or workspace_subscription-e<id>.")
            }
            Self::ActivityNotFound => {
                Some("Run `td replay` to list the activity ids in the timeline.")
            }
            Self::PageFetchFailed => Some("Check the status override for messages in the fixture."),
            Self::TransportFailed => Some("Retry once. If persistent, check connectivity."),
            Self::LiveStreamError => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
