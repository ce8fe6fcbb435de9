//! Notification records
//!
//! A notification is a discrete user-facing event created server-side by
//! domain events (task overdue sweep, assignment, chat message). The client
//! never creates or deletes one; it only observes records, toggles their
//! read flag, and re-fetches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque notification identifier, assigned by the collaborator API.
///
/// Stable across delivery channels: the stream and the poll report the same
/// id for the same event, which is what makes id-based de-duplication sound.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Wrap a raw id.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NotificationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fixed vocabulary of notification types.
///
/// The kind controls severity styling and persistence policy. Unknown tags
/// decode as [`NotificationKind::Other`] so a server-side vocabulary
/// extension never becomes a client parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task passed its due date
    TaskOverdue,
    /// A task was assigned to the user
    TaskAssigned,
    /// A task was completed
    TaskCompleted,
    /// A task was edited
    TaskUpdated,
    /// Someone commented on a task
    CommentAdded,
    /// A performance review was written
    ReviewWritten,
    /// A chat message arrived
    ChatMessage,
    /// A project the user belongs to changed
    ProjectUpdate,
    /// Synthetic record used by the collaborator's diagnostics
    Test,
    /// Any tag this client does not know yet
    #[serde(other)]
    Other,
}

/// Presentation severity, keyed by notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Neutral styling
    Info,
    /// Positive styling
    Success,
    /// Error styling
    Error,
}

impl NotificationKind {
    /// Severity styling for user-visible presentation.
    #[inline]
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::TaskOverdue => Severity::Error,
            Self::TaskCompleted => Severity::Success,
            _ => Severity::Info,
        }
    }

    /// Sticky presentations stay up until the user interacts with them;
    /// everything else auto-dismisses.
    #[inline]
    #[must_use]
    pub fn is_sticky(self) -> bool {
        matches!(self, Self::TaskOverdue)
    }
}

/// A discrete user-facing event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique id, stable across delivery channels
    pub id: NotificationId,
    /// Type tag (wire name `type`)
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Short display title
    pub title: String,
    /// Display body
    pub message: String,
    /// Creation instant; doubles as the polling high-water mark
    pub created_at: DateTime<Utc>,
    /// Whether the user has seen it; mutated only by explicit user action
    #[serde(default)]
    pub is_read: bool,
    /// Kind of the originating domain object (task, chat thread, ...);
    /// opaque to the feed, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,
    /// Id of the originating domain object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
}

impl Notification {
    /// Create an unread record.
    #[must_use]
    pub fn new(
        id: impl Into<NotificationId>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            created_at,
            is_read: false,
            related_type: None,
            related_id: None,
        }
    }

    /// Attach the originating domain object reference.
    #[inline]
    #[must_use]
    pub fn with_related(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.related_type = Some(kind.into());
        self.related_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_severity_mapping() {
        assert_eq!(NotificationKind::TaskOverdue.severity(), Severity::Error);
        assert_eq!(NotificationKind::TaskCompleted.severity(), Severity::Success);
        assert_eq!(NotificationKind::ChatMessage.severity(), Severity::Info);
        assert_eq!(NotificationKind::Other.severity(), Severity::Info);
    }

    #[test]
    fn only_overdue_is_sticky() {
        assert!(NotificationKind::TaskOverdue.is_sticky());
        assert!(!NotificationKind::TaskAssigned.is_sticky());
        assert!(!NotificationKind::ChatMessage.is_sticky());
    }

    #[test]
    fn record_round_trips_with_wire_names() {
        let json = r#"{
            "id": "n-17",
            "type": "task_assigned",
            "title": "New task",
            "message": "You were assigned 'Quarterly report'",
            "created_at": "2026-03-02T09:30:00Z",
            "is_read": false,
            "related_type": "task",
            "related_id": "t-204"
        }"#;

        let record: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, NotificationId::from("n-17"));
        assert_eq!(record.kind, NotificationKind::TaskAssigned);
        assert_eq!(record.related_type.as_deref(), Some("task"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "task_assigned");
        assert_eq!(value["id"], "n-17");
    }

    #[test]
    fn unknown_kind_decodes_as_other() {
        let json = r#"{
            "id": "n-9",
            "type": "badge_unlocked",
            "title": "t",
            "message": "m",
            "created_at": "2026-03-02T09:30:00Z"
        }"#;

        let record: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, NotificationKind::Other);
        assert!(!record.is_read, "missing is_read defaults to unread");
    }
}
