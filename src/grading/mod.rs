// src/grading/mod.rs

//! Grading workflow for one student's practical submissions in one subject.
//!
//! The workflow owns the submission list and the open draft. UI code reads
//! them through the accessors (or [`GradingWorkflow::snapshot`]) and drives
//! the operations; errors are recorded as state as well as returned.

pub mod draft;

pub use draft::{
    DraftField, DraftFieldError, GradeUpdate, GradingDraft, MARKS_FIELD, REMARKS_FIELD, field_message,
    reports,
};

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::{
    client::PortalApi,
    error::{ApiError, GradingError},
    models::{Submission, SubmissionPatch},
};

pub const SAVED_MESSAGE: &str = "Practical updated successfully!";
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const SAVE_ABORTED_MESSAGE: &str = "Save failed unexpectedly, please try again.";

type SaveResult = Result<Submission, GradingError>;
type PendingSave = Shared<BoxFuture<'static, SaveResult>>;

/// Short-lived success message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    fn new(message: &str, ttl: Duration) -> Self {
        Self {
            message: message.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_visible(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Default)]
struct WorkflowState {
    submissions: Vec<Submission>,
    draft: Option<GradingDraft>,
    last_error: Option<ApiError>,
    notice: Option<Notice>,
    /// Set while an update request is in flight.
    pending_save: Option<PendingSave>,
}

/// Everything a view needs to render the page at one instant.
#[derive(Debug, Clone)]
pub struct WorkflowSnapshot {
    pub submissions: Vec<Submission>,
    pub draft: Option<GradingDraft>,
    pub is_saving: bool,
    pub last_error: Option<ApiError>,
    pub notice: Option<String>,
}

/// Cloning yields another handle onto the same state.
#[derive(Clone)]
pub struct GradingWorkflow {
    api: Arc<dyn PortalApi>,
    state: Arc<Mutex<WorkflowState>>,
    notice_ttl: Duration,
}

impl GradingWorkflow {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self::with_submissions(api, Vec::new())
    }

    /// Starts from a list that was already fetched, e.g. by the page load.
    pub fn with_submissions(api: Arc<dyn PortalApi>, submissions: Vec<Submission>) -> Self {
        let state = WorkflowState {
            submissions,
            ..Default::default()
        };
        Self {
            api,
            state: Arc::new(Mutex::new(state)),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// Replaces the list with the API's current view. On failure the list is
    /// left empty and the error is kept in `last_error`. No retry.
    pub async fn load_submissions(
        &self,
        student_id: &str,
        class_id: &str,
        subject_id: &str,
        token: &str,
    ) -> Result<(), ApiError> {
        self.state.lock().await.last_error = None;

        let outcome = self
            .api
            .list_submissions(student_id, class_id, subject_id, token)
            .await;

        let mut state = self.state.lock().await;
        match outcome {
            Ok(submissions) => {
                tracing::debug!(
                    "Loaded {} submissions for student {} in subject {}",
                    submissions.len(),
                    student_id,
                    subject_id
                );
                state.submissions = submissions;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch practical submissions: {}", e);
                state.submissions.clear();
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Opens the grading form for the listed submission with this id,
    /// replacing any open draft. The draft is seeded from the list entry,
    /// which is the freshest copy.
    pub async fn open_draft(&self, id: &str) -> Result<(), GradingError> {
        let mut state = self.state.lock().await;
        let draft = state
            .submissions
            .iter()
            .find(|s| s.id == id)
            .map(GradingDraft::from_submission)
            .ok_or_else(|| GradingError::UnknownSubmission(id.to_string()))?;
        state.draft = Some(draft);
        Ok(())
    }

    pub async fn update_draft_field(&self, field: DraftField) -> Result<(), GradingError> {
        let mut state = self.state.lock().await;
        let draft = state.draft.as_mut().ok_or(GradingError::NoDraft)?;
        draft.apply(field);
        Ok(())
    }

    /// Discards the draft without saving.
    pub async fn close_draft(&self) {
        self.state.lock().await.draft = None;
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.last_error = None;
    }

    /// Validates the open draft and sends it.
    ///
    /// While a save is in flight, further calls do not send anything; they
    /// wait for and return the result of the save already running. The list
    /// only changes once the server has confirmed the update.
    pub async fn save_draft(&self, token: &str) -> Result<Submission, GradingError> {
        let pending = {
            let mut state = self.state.lock().await;

            if let Some(pending) = &state.pending_save {
                tracing::debug!("Save already in flight, waiting on it");
                pending.clone()
            } else {
                let draft = state.draft.as_mut().ok_or(GradingError::NoDraft)?;
                let update = match draft.validate() {
                    Ok(update) => update,
                    Err(errors) => {
                        draft.errors = errors.clone();
                        return Err(GradingError::Validation(errors));
                    }
                };
                let id = draft.submission_id.clone();
                state.last_error = None;

                let task = tokio::spawn(persist_or_recover(
                    self.api.clone(),
                    self.state.clone(),
                    id,
                    update,
                    token.to_string(),
                    self.notice_ttl,
                ));
                let pending = task
                    .map(|joined| {
                        joined.unwrap_or_else(|e| {
                            Err(GradingError::Api(ApiError::NetworkOrServer(format!(
                                "Save task failed: {}",
                                e
                            ))))
                        })
                    })
                    .boxed()
                    .shared();

                state.pending_save = Some(pending.clone());
                pending
            }
        };

        pending.await
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.state.lock().await.submissions.clone()
    }

    pub async fn draft(&self) -> Option<GradingDraft> {
        self.state.lock().await.draft.clone()
    }

    pub async fn is_saving(&self) -> bool {
        self.state.lock().await.pending_save.is_some()
    }

    pub async fn last_error(&self) -> Option<ApiError> {
        self.state.lock().await.last_error.clone()
    }

    /// The success message, while it has not expired yet.
    pub async fn notice(&self) -> Option<String> {
        visible_notice(&self.state.lock().await.notice)
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let state = self.state.lock().await;
        WorkflowSnapshot {
            submissions: state.submissions.clone(),
            draft: state.draft.clone(),
            is_saving: state.pending_save.is_some(),
            last_error: state.last_error.clone(),
            notice: visible_notice(&state.notice),
        }
    }
}

fn visible_notice(notice: &Option<Notice>) -> Option<String> {
    notice
        .as_ref()
        .filter(|n| n.is_visible())
        .map(|n| n.message.clone())
}

/// Runs [`persist`], making sure a panic inside it still ends the save.
/// Otherwise `pending_save` would stay set and every later save would wait
/// on the dead task.
async fn persist_or_recover(
    api: Arc<dyn PortalApi>,
    state: Arc<Mutex<WorkflowState>>,
    id: String,
    update: GradeUpdate,
    token: String,
    notice_ttl: Duration,
) -> SaveResult {
    let run = persist(api, state.clone(), id.clone(), update, token, notice_ttl);
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Saving practical {} panicked", id);
            let e = ApiError::NetworkOrServer(SAVE_ABORTED_MESSAGE.to_string());
            let mut state = state.lock().await;
            state.pending_save = None;
            state.last_error = Some(e.clone());
            Err(GradingError::Api(e))
        }
    }
}

/// Sends one update and folds the outcome into the shared state in a single
/// critical section.
async fn persist(
    api: Arc<dyn PortalApi>,
    state: Arc<Mutex<WorkflowState>>,
    id: String,
    update: GradeUpdate,
    token: String,
    notice_ttl: Duration,
) -> SaveResult {
    let outcome = api
        .update_submission(&id, &update, &token)
        .await
        .and_then(|patch| matching_patch(&id, patch));

    let mut guard = state.lock().await;
    let state = &mut *guard;
    state.pending_save = None;

    let patch = match outcome {
        Ok(patch) => patch,
        Err(e) => {
            tracing::warn!("Error updating practical {}: {}", id, e);
            state.last_error = Some(e.clone());
            return Err(GradingError::Api(e));
        }
    };

    let Some(entry) = state.submissions.iter_mut().find(|s| s.id == id) else {
        tracing::warn!("Practical {} was saved but is no longer listed", id);
        return Err(GradingError::UnknownSubmission(id));
    };
    entry.apply_patch(patch);
    let updated = entry.clone();

    if state.draft.as_ref().is_some_and(|d| d.submission_id == id) {
        state.draft = None;
    }
    state.notice = Some(Notice::new(SAVED_MESSAGE, notice_ttl));

    tracing::info!("Practical {} updated to {}", id, updated.status);
    Ok(updated)
}

/// A patch that names a different record is a malformed response.
fn matching_patch(id: &str, patch: SubmissionPatch) -> Result<SubmissionPatch, ApiError> {
    match patch.id.as_deref() {
        Some(other) if other != id => Err(ApiError::NetworkOrServer(format!(
            "Unexpected response from server: got practical {} while updating {}",
            other, id
        ))),
        _ => Ok(patch),
    }
}
