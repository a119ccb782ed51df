// src/models/mod.rs

pub mod student;
pub mod subject;
pub mod submission;

pub use student::Student;
pub use subject::Subject;
pub use submission::{Submission, SubmissionPatch, SubmissionStatus};

use serde::Deserialize;

/// JSON body the API sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<String>,
}
