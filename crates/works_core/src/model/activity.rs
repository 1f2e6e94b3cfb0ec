//! Activity (audit log) domain model.
//!
//! # Invariants
//! - Activities are never updated after insert.
//! - `work_title` and `work_version` are snapshots taken at action time.

use crate::model::work::{Work, WorkId};
use serde::{Deserialize, Serialize};

/// Kind of mutation recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Added,
    Updated,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "added" => Some(Self::Added),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }
}

/// Persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub user_id: String,
    pub work_id: WorkId,
    pub work_title: String,
    pub work_version: u32,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Insert shape for one audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub kind: ActivityType,
    pub user_id: String,
    pub work_id: WorkId,
    pub work_title: String,
    pub work_version: u32,
}

impl NewActivity {
    /// Captures a snapshot of `work` as acted on by `user_id`.
    pub fn record(kind: ActivityType, user_id: impl Into<String>, work: &Work) -> Self {
        Self {
            kind,
            user_id: user_id.into(),
            work_id: work.id,
            work_title: work.title.clone(),
            work_version: work.version,
        }
    }
}
