/// Job status and snapshot definitions
///
/// A job is `Running` from creation until its crawl task ends, then `Done`
/// forever. `NotFound` is never stored; it is what lookups of unknown ids see.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The crawl is still in progress
    Running,

    /// The crawl finished (successfully or not)
    Done,

    /// No job with the requested id exists
    NotFound,
}

impl JobStatus {
    /// Returns true once no further updates can happen
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// String form used on the wire and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Done => "done",
            Self::NotFound => "not_found",
        }
    }

    /// Parses the wire form
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "not_found" => Some(Self::NotFound),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point-in-time view of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,

    /// Percent complete, 0..=100
    pub progress: u8,

    /// The domain the crawl is scoped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Set when the crawl task died instead of finishing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// A freshly created job
    pub fn running(domain: &str) -> Self {
        Self {
            status: JobStatus::Running,
            progress: 0,
            domain: Some(domain.to_string()),
            error: None,
            created_at: Some(Utc::now()),
            finished_at: None,
        }
    }

    /// The snapshot reported for unknown job ids
    pub fn not_found() -> Self {
        Self {
            status: JobStatus::NotFound,
            progress: 0,
            domain: None,
            error: None,
            created_at: None,
            finished_at: None,
        }
    }
}
