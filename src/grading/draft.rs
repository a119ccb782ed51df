// src/grading/draft.rs

use std::borrow::Cow;

use serde::{Serialize, Serializer};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{Submission, SubmissionStatus};

pub const MARKS_FIELD: &str = "marks";
pub const REMARKS_FIELD: &str = "remarks";

/// Reasons a draft can be refused before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftFieldError {
    InvalidMarks,
    MissingRemarks,
}

impl DraftFieldError {
    const ALL: [DraftFieldError; 2] = [DraftFieldError::InvalidMarks, DraftFieldError::MissingRemarks];

    pub fn field(&self) -> &'static str {
        match self {
            DraftFieldError::InvalidMarks => MARKS_FIELD,
            DraftFieldError::MissingRemarks => REMARKS_FIELD,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DraftFieldError::InvalidMarks => "invalid_marks",
            DraftFieldError::MissingRemarks => "missing_remarks",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DraftFieldError::InvalidMarks => "Please enter valid marks between 0 and 100.",
            DraftFieldError::MissingRemarks => "Please enter remarks explaining the rejection.",
        }
    }
}

impl From<DraftFieldError> for ValidationError {
    fn from(error: DraftFieldError) -> Self {
        ValidationError::new(error.code()).with_message(Cow::Borrowed(error.message()))
    }
}

/// Whether `errors` carries this particular failure.
pub fn reports(errors: &ValidationErrors, error: DraftFieldError) -> bool {
    errors
        .field_errors()
        .get(error.field())
        .is_some_and(|errs| errs.iter().any(|e| e.code == error.code()))
}

/// First message recorded against `field`, for display next to the input.
pub fn field_message(errors: &ValidationErrors, field: &str) -> Option<String> {
    errors
        .field_errors()
        .get(field)
        .and_then(|errs| errs.first())
        .and_then(|e| e.message.as_ref())
        .map(|m| m.to_string())
}

fn without_field(errors: &ValidationErrors, field: &str) -> ValidationErrors {
    let mut kept = ValidationErrors::new();
    for error in DraftFieldError::ALL {
        if error.field() != field && reports(errors, error) {
            kept.add(error.field(), error.into());
        }
    }
    kept
}

/// The grading rules, each field paired with the status that decides
/// whether its rule applies.
#[derive(Debug, Validate)]
struct GradingRules {
    #[validate(custom(function = marks_for_status))]
    marks: (SubmissionStatus, Option<f64>),
    #[validate(custom(function = remarks_for_status))]
    remarks: (SubmissionStatus, String),
}

fn marks_for_status(field: &(SubmissionStatus, Option<f64>)) -> Result<(), ValidationError> {
    match field {
        (SubmissionStatus::Completed, marks)
            if !marks.is_some_and(|m| m.is_finite() && (0.0..=100.0).contains(&m)) =>
        {
            Err(DraftFieldError::InvalidMarks.into())
        }
        _ => Ok(()),
    }
}

fn remarks_for_status(field: &(SubmissionStatus, String)) -> Result<(), ValidationError> {
    match field {
        (SubmissionStatus::Rejected, remarks) if remarks.trim().is_empty() => {
            Err(DraftFieldError::MissingRemarks.into())
        }
        _ => Ok(()),
    }
}

/// A single edit applied to the open draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftField {
    Status(SubmissionStatus),
    Marks(Option<f64>),
    Remarks(String),
}

/// Client-side edit buffer for one submission's grading fields.
///
/// Switching `status` keeps whatever was typed into the other fields,
/// so toggling back and forth does not lose input.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingDraft {
    pub submission_id: String,
    pub status: SubmissionStatus,
    pub marks: Option<f64>,
    pub remarks: String,
    /// Messages from the last refused save, keyed by field.
    pub errors: ValidationErrors,
}

impl GradingDraft {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id.clone(),
            status: submission.status,
            marks: submission.marks,
            remarks: submission.remarks.clone().unwrap_or_default(),
            errors: ValidationErrors::new(),
        }
    }

    pub fn apply(&mut self, field: DraftField) {
        match field {
            DraftField::Status(status) => {
                self.status = status;
                // Which rule applies depends on the status, so old messages no longer hold.
                self.errors = ValidationErrors::new();
            }
            DraftField::Marks(marks) => {
                self.marks = marks;
                self.errors = without_field(&self.errors, MARKS_FIELD);
            }
            DraftField::Remarks(remarks) => {
                self.remarks = remarks;
                self.errors = without_field(&self.errors, REMARKS_FIELD);
            }
        }
    }

    /// Checks the rule for the current status and, if it holds, builds the
    /// minimal update payload.
    pub fn validate(&self) -> Result<GradeUpdate, ValidationErrors> {
        GradingRules {
            marks: (self.status, self.marks),
            remarks: (self.status, self.remarks.clone()),
        }
        .validate()?;

        Ok(match (self.status, self.marks) {
            (SubmissionStatus::Submitted, _) => GradeUpdate::Submitted,
            (SubmissionStatus::Completed, Some(marks)) => GradeUpdate::Completed { marks },
            (SubmissionStatus::Completed, None) => {
                let mut errors = ValidationErrors::new();
                errors.add(MARKS_FIELD, DraftFieldError::InvalidMarks.into());
                return Err(errors);
            }
            (SubmissionStatus::Rejected, _) => GradeUpdate::Rejected {
                remarks: self.remarks.clone(),
            },
        })
    }
}

/// Body of `PUT /submissions/{id}`.
///
/// Only the field that belongs to the new status is sent; the other one is
/// left out entirely so the server keeps what it already stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GradeUpdate {
    Submitted,
    Completed {
        #[serde(serialize_with = "whole_marks_as_integer")]
        marks: f64,
    },
    Rejected {
        remarks: String,
    },
}

impl GradeUpdate {
    pub fn status(&self) -> SubmissionStatus {
        match self {
            GradeUpdate::Submitted => SubmissionStatus::Submitted,
            GradeUpdate::Completed { .. } => SubmissionStatus::Completed,
            GradeUpdate::Rejected { .. } => SubmissionStatus::Rejected,
        }
    }
}

// 85.0 goes out as `85`, 72.5 stays `72.5`.
fn whole_marks_as_integer<S: Serializer>(marks: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if marks.fract() == 0.0 {
        serializer.serialize_i64(*marks as i64)
    } else {
        serializer.serialize_f64(*marks)
    }
}
