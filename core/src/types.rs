//! Domain types for the todo API.
//!
//! # Design
//! These types mirror the server's schema but are defined independently of
//! the mock-server crate; integration tests catch any schema drift. `Todo`
//! deserializes straight from create and list bodies, with the server's
//! `created_at` landing in `time`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a todo. Never minted locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub u64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion state of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Incomplete,
    Complete,
}

impl Status {
    pub fn flipped(self) -> Self {
        match self {
            Status::Incomplete => Status::Complete,
            Status::Complete => Status::Incomplete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Incomplete => "incomplete",
            Status::Complete => "complete",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`, expected `incomplete` or `complete`")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incomplete" => Ok(Status::Incomplete),
            "complete" => Ok(Status::Complete),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A single todo as known to the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "created_at")]
    pub time: DateTime<Utc>,
}

impl Todo {
    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }

    /// Creation time as `h:mm AM, MM/DD/YYYY`.
    pub fn display_time(&self) -> String {
        self.time.format("%-I:%M %p, %m/%d/%Y").to_string()
    }
}

/// Request body shared by create and replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPayload {
    pub title: String,
    #[serde(default)]
    pub status: Status,
}

/// The fields a replace response echoes back. The server sends the whole
/// record; only `title` and `status` are authoritative for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplacedTodo {
    pub title: String,
    pub status: Status,
}
