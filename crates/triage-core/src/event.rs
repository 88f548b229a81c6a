use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Closed set of event discriminators. A record whose kind does not match
/// one of these is rejected at ingress; no other stage ever sees an
/// unknown kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProjectCreate,
    ProjectRename,
    ProjectTransfer,
    UserCreate,
    UserRename,
    IssueOpen,
    IssueUpdate,
    IssueClose,
    IssueReopen,
    IssueNoteCreate,
    IssueNoteUpdate,
    GroupCreate,
    GroupRename,
    SnippetCheck,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ProjectCreate => "project_create",
            EventKind::ProjectRename => "project_rename",
            EventKind::ProjectTransfer => "project_transfer",
            EventKind::UserCreate => "user_create",
            EventKind::UserRename => "user_rename",
            EventKind::IssueOpen => "issue_open",
            EventKind::IssueUpdate => "issue_update",
            EventKind::IssueClose => "issue_close",
            EventKind::IssueReopen => "issue_reopen",
            EventKind::IssueNoteCreate => "issue_note_create",
            EventKind::IssueNoteUpdate => "issue_note_update",
            EventKind::GroupCreate => "group_create",
            EventKind::GroupRename => "group_rename",
            EventKind::SnippetCheck => "snippet_check",
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(
            self,
            EventKind::ProjectCreate | EventKind::ProjectRename | EventKind::ProjectTransfer
        )
    }

    pub fn is_user(&self) -> bool {
        matches!(self, EventKind::UserCreate | EventKind::UserRename)
    }

    pub fn is_issue(&self) -> bool {
        matches!(
            self,
            EventKind::IssueOpen
                | EventKind::IssueUpdate
                | EventKind::IssueClose
                | EventKind::IssueReopen
        )
    }

    pub fn is_issue_note(&self) -> bool {
        matches!(self, EventKind::IssueNoteCreate | EventKind::IssueNoteUpdate)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, EventKind::GroupCreate | EventKind::GroupRename)
    }

    pub fn is_snippet(&self) -> bool {
        matches!(self, EventKind::SnippetCheck)
    }

    /// `issue_<action>` for action in {open, close, reopen, update}.
    pub fn from_issue_action(action: &str) -> Option<Self> {
        match action {
            "open" => Some(EventKind::IssueOpen),
            "close" => Some(EventKind::IssueClose),
            "reopen" => Some(EventKind::IssueReopen),
            "update" => Some(EventKind::IssueUpdate),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "project_create" => EventKind::ProjectCreate,
            "project_rename" => EventKind::ProjectRename,
            "project_transfer" => EventKind::ProjectTransfer,
            "user_create" => EventKind::UserCreate,
            "user_rename" => EventKind::UserRename,
            "issue_open" => EventKind::IssueOpen,
            "issue_update" => EventKind::IssueUpdate,
            "issue_close" => EventKind::IssueClose,
            "issue_reopen" => EventKind::IssueReopen,
            "issue_note_create" => EventKind::IssueNoteCreate,
            "issue_note_update" => EventKind::IssueNoteUpdate,
            "group_create" => EventKind::GroupCreate,
            "group_rename" => EventKind::GroupRename,
            "snippet_check" => EventKind::SnippetCheck,
            other => return Err(UnknownEventKind(other.to_string())),
        })
    }
}

/// One message on a stream: a kind tag plus an opaque JSON payload.
/// Fields beyond `kind` are never inspected by the runtime itself —
/// only the stage's `process` closure peeks into `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub payload: Value,
}

impl EventRecord {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}
