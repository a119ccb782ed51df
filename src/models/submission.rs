// src/models/submission.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Grading state of a practical submission.
///
/// Every state can move to every other one; `Submitted` is where a
/// freshly uploaded practical starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
    Completed,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Parses the lowercase wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "submitted" => Some(SubmissionStatus::Submitted),
            "completed" => Some(SubmissionStatus::Completed),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One student's deliverable for one practical of a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,

    /// Display label, e.g. "Practical 3".
    pub name: String,

    /// Where the submitted code lives (usually a GitHub repository).
    #[serde(rename = "github_link", alias = "link")]
    pub link: String,

    #[serde(alias = "submittedAt")]
    pub submitted_at: DateTime<Utc>,

    pub status: SubmissionStatus,

    /// Only meaningful when `status` is `Completed`.
    #[serde(default)]
    pub marks: Option<f64>,

    /// Only meaningful when `status` is `Rejected`.
    #[serde(default)]
    pub remarks: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

/// Body returned by `PUT /submissions/{id}`.
///
/// The server may answer with only the fields it changed. `marks` and
/// `remarks` use a nested option so an explicit `null` (clear the value)
/// is distinguishable from an absent key (keep the current value).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmissionPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "github_link", alias = "link")]
    pub link: Option<String>,
    #[serde(default, alias = "submittedAt")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default, deserialize_with = "present")]
    pub marks: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub remarks: Option<Option<String>>,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Wraps whatever value is present (including `null`) in `Some`.
/// Combined with `#[serde(default)]`, a missing key stays `None`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Submission {
    /// Shallow merge: fields present in the patch replace ours, the rest are kept.
    /// The id never changes.
    pub fn apply_patch(&mut self, patch: SubmissionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(link) = patch.link {
            self.link = link;
        }
        if let Some(submitted_at) = patch.submitted_at {
            self.submitted_at = submitted_at;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(marks) = patch.marks {
            self.marks = marks;
        }
        if let Some(remarks) = patch.remarks {
            self.remarks = remarks;
        }
        if let Some(student_id) = patch.student_id {
            self.student_id = Some(student_id);
        }
    }

    /// Marks column as rendered in the submissions table.
    pub fn marks_label(&self) -> String {
        match (self.status, self.marks) {
            (SubmissionStatus::Completed, Some(marks)) => format!("{}/100", marks),
            _ => "-".to_string(),
        }
    }
}
