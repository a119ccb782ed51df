// src/page.rs

use std::sync::Arc;

use crate::{
    client::PortalApi,
    error::ApiError,
    grading::GradingWorkflow,
    models::{Student, Subject, Submission},
};

/// Route parameters of the student practicals page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRoute {
    pub student_id: String,
    pub class_id: String,
    pub subject_id: String,
}

impl StudentRoute {
    /// Returns `None` if any id is blank.
    pub fn new(
        student_id: impl Into<String>,
        class_id: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Option<Self> {
        let route = Self {
            student_id: student_id.into(),
            class_id: class_id.into(),
            subject_id: subject_id.into(),
        };
        let blank = [&route.student_id, &route.class_id, &route.subject_id]
            .iter()
            .any(|id| id.trim().is_empty());
        (!blank).then_some(route)
    }
}

/// Data behind the student practicals page.
#[derive(Debug, Clone)]
pub struct StudentPage {
    pub route: StudentRoute,
    pub student: Student,
    pub subject: Subject,
    pub submissions: Vec<Submission>,
}

impl StudentPage {
    /// Fetches the student, the subject and the submissions concurrently.
    /// The page only renders when all three succeed.
    pub async fn load(
        api: &dyn PortalApi,
        route: StudentRoute,
        token: &str,
    ) -> Result<Self, ApiError> {
        let (student, subject, submissions) = tokio::try_join!(
            api.find_student(&route.class_id, &route.student_id, token),
            api.get_subject(&route.subject_id, token),
            api.list_submissions(&route.student_id, &route.class_id, &route.subject_id, token),
        )
        .inspect_err(|e| tracing::warn!("Failed to load student page {:?}: {}", route, e))?;

        tracing::info!(
            "Loaded {} practicals of {} for {}",
            submissions.len(),
            student.name,
            subject.name
        );

        Ok(Self {
            route,
            student,
            subject,
            submissions,
        })
    }

    /// e.g. "Asha's Operating Systems Practicals"
    pub fn heading(&self) -> String {
        format!("{}'s {} Practicals", self.student.name, self.subject.name)
    }

    /// Hands the fetched list to a workflow that grades through `api`.
    pub fn into_workflow(self, api: Arc<dyn PortalApi>) -> GradingWorkflow {
        GradingWorkflow::with_submissions(api, self.submissions)
    }
}
