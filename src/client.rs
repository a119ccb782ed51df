// src/client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Config,
    error::{ApiError, ConfigError},
    grading::GradeUpdate,
    models::{ApiErrorBody, Student, Subject, Submission, SubmissionPatch},
};

/// The slice of the portal REST API the teacher pages depend on.
///
/// Every call takes the bearer token explicitly; where it is stored is the
/// page shell's business.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// `GET /students/{class_id}`: roster of a class.
    async fn list_students(&self, class_id: &str, token: &str) -> Result<Vec<Student>, ApiError>;

    /// `GET /subjects/{subject_id}`
    async fn get_subject(&self, subject_id: &str, token: &str) -> Result<Subject, ApiError>;

    /// `GET /submissions?student=&class=&subject=`
    async fn list_submissions(
        &self,
        student_id: &str,
        class_id: &str,
        subject_id: &str,
        token: &str,
    ) -> Result<Vec<Submission>, ApiError>;

    /// `PUT /submissions/{id}`. The response may only contain the changed fields.
    async fn update_submission(
        &self,
        id: &str,
        update: &GradeUpdate,
        token: &str,
    ) -> Result<SubmissionPatch, ApiError>;

    /// Resolves one student from the class roster.
    async fn find_student(
        &self,
        class_id: &str,
        student_id: &str,
        token: &str,
    ) -> Result<Student, ApiError> {
        self.list_students(class_id, token)
            .await?
            .into_iter()
            .find(|s| s.id == student_id)
            .ok_or_else(|| ApiError::NotFoundOrForbidden {
                status: 404,
                message: "Student not found".to_string(),
            })
    }
}

/// `PortalApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// `base_url` is the API root every endpoint path is appended to.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::Invalid {
            name: "API_URL",
            reason: e.to_string(),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: "API_URL",
                reason: format!("expected an http(s) URL, got {}", base_url),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "API_URL",
                reason: e.to_string(),
            })?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::NetworkOrServer(format!("invalid API base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: &str) -> Result<RequestBuilder, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::Auth(
                "No authentication token found. Please log in again.".to_string(),
            ));
        }
        tracing::debug!("{} {}", method, url);
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Sends the request and decodes a 2xx body into `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| {
                tracing::warn!("Unexpected response body from {}: {:?}", url, e);
                ApiError::from(e)
            });
        }

        let server_message = serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());

        tracing::warn!(
            "Request to {} failed with {}: {:?}",
            url,
            status,
            server_message
        );

        Err(ApiError::from_status(status, server_message))
    }
}

#[async_trait]
impl PortalApi for HttpClient {
    async fn list_students(&self, class_id: &str, token: &str) -> Result<Vec<Student>, ApiError> {
        let url = self.endpoint(&["students", class_id])?;
        self.send(self.request(Method::GET, url, token)?).await
    }

    async fn get_subject(&self, subject_id: &str, token: &str) -> Result<Subject, ApiError> {
        let url = self.endpoint(&["subjects", subject_id])?;
        self.send(self.request(Method::GET, url, token)?).await
    }

    async fn list_submissions(
        &self,
        student_id: &str,
        class_id: &str,
        subject_id: &str,
        token: &str,
    ) -> Result<Vec<Submission>, ApiError> {
        let mut url = self.endpoint(&["submissions"])?;
        url.query_pairs_mut()
            .append_pair("student", student_id)
            .append_pair("class", class_id)
            .append_pair("subject", subject_id);
        self.send(self.request(Method::GET, url, token)?).await
    }

    async fn update_submission(
        &self,
        id: &str,
        update: &GradeUpdate,
        token: &str,
    ) -> Result<SubmissionPatch, ApiError> {
        let url = self.endpoint(&["submissions", id])?;
        let request = self.request(Method::PUT, url, token)?.json(update);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let c = client("http://localhost:8000/api/user/teacher/");
        let url = c.endpoint(&["submissions", "42"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/user/teacher/submissions/42");

        let c = client("http://localhost:8000/api/user/teacher");
        let url = c.endpoint(&["subjects", "s1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/user/teacher/subjects/s1");
    }

    #[test]
    fn ids_are_percent_encoded() {
        let c = client("http://localhost:8000");
        let url = c.endpoint(&["submissions", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/submissions/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(HttpClient::new("mailto:teacher@example.com", Duration::from_secs(1)).is_err());
        assert!(HttpClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn empty_token_is_an_auth_error() {
        let c = client("http://localhost:8000");
        let url = c.endpoint(&["subjects", "s1"]).unwrap();
        let err = c.request(Method::GET, url, "  ").unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }
}
