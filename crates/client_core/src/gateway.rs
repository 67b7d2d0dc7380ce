use std::sync::Arc;

use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use shared::{
    domain::{CaseId, DocumentId},
    error::ErrorBody,
    protocol::{
        AssignGpRequest, CaseRecord, CreateCaseRequest, DocumentRecord, GpDecisionRequest,
        GpSummary, MessageRecord, PostMessageRequest, QaFeedbackRequest, RegisterRequest,
        TokenResponse, UserRecord,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::session::Session;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// An authenticated endpoint was called with no stored token. Raised
    /// locally, before any network I/O.
    #[error("not signed in")]
    NotAuthenticated,
    /// Non-success HTTP status. `message` is the backend's `detail` field
    /// when the body parses, otherwise the per-call fallback.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
}

/// Typed wrapper over every backend endpoint. One best-effort round trip
/// per call: no retries, no timeout policy, no caching. Failure recovery
/// belongs to the caller.
pub struct ApiGateway {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiGateway {
    pub fn new(server_url: &str, session: Arc<Session>) -> Result<Self, GatewayError> {
        let parsed = Url::parse(server_url.trim())?;
        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        let token = self
            .session
            .token()
            .await
            .ok_or(GatewayError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    async fn success(response: Response, fallback: &str) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::message_from_body(&body, fallback);
        warn!(status = status.as_u16(), message, "gateway: request rejected");
        Err(GatewayError::Api { status, message })
    }

    /* auth */

    /// POST /login with form-encoded credentials. Does not touch the
    /// session; callers decide whether to store the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, GatewayError> {
        let response = self
            .http
            .post(self.endpoint("/login"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        Self::success(response, "Login failed").await?.json().await.map_err(Into::into)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<UserRecord, GatewayError> {
        let response = self
            .http
            .post(self.endpoint("/register"))
            .json(request)
            .send()
            .await?;
        Self::success(response, "Registration failed")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    /// Login, store the token in the session, and fetch the authenticated
    /// identity in one step.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserRecord, GatewayError> {
        let token = self.login(email, password).await?;
        self.session.set_token(token.access_token).await;
        let user = self.current_user().await?;
        debug!(user_id = user.id.0, role = ?user.role, "gateway: signed in");
        Ok(user)
    }

    pub async fn sign_out(&self) {
        self.session.clear().await;
    }

    pub async fn current_user(&self) -> Result<UserRecord, GatewayError> {
        let request = self.authorized(self.http.get(self.endpoint("/users/me"))).await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch current user")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    /* cases */

    pub async fn create_case(&self, request: &CreateCaseRequest) -> Result<CaseRecord, GatewayError> {
        let builder = self
            .authorized(self.http.post(self.endpoint("/cases")))
            .await?
            .json(request);
        let response = builder.send().await?;
        Self::success(response, "Failed to create case")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    /// GET /cases/my: the claimant's own cases.
    pub async fn my_cases(&self) -> Result<Vec<CaseRecord>, GatewayError> {
        let request = self.authorized(self.http.get(self.endpoint("/cases/my"))).await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch my cases")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    /// GET /cases, the alias listing kept for backend compatibility.
    pub async fn list_cases(&self) -> Result<Vec<CaseRecord>, GatewayError> {
        let request = self.authorized(self.http.get(self.endpoint("/cases"))).await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch cases")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn delete_case(&self, case_id: CaseId) -> Result<(), GatewayError> {
        let request = self
            .authorized(
                self.http
                    .delete(self.endpoint(&format!("/cases/{}", case_id.0))),
            )
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to delete case").await?;
        Ok(())
    }

    /* documents */

    /// POST /cases/{id}/upload/ as a multipart form with a single `file`
    /// part. Callers are expected to run the allow-list check first.
    pub async fn upload_document(
        &self,
        case_id: CaseId,
        filename: &str,
        mime_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<DocumentRecord, GatewayError> {
        let mut part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        if let Some(mime_type) = mime_type {
            part = part.mime_str(mime_type)?;
        }
        let form = multipart::Form::new().part("file", part);
        let request = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("/cases/{}/upload/", case_id.0))),
            )
            .await?
            .multipart(form);
        let response = request.send().await?;
        Self::success(response, "Upload failed")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn list_documents(&self, case_id: CaseId) -> Result<Vec<DocumentRecord>, GatewayError> {
        let request = self
            .authorized(
                self.http
                    .get(self.endpoint(&format!("/cases/{}/documents/", case_id.0))),
            )
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch documents")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    /// GET /cases/{id}/download/{fileId}. Materializes the whole binary
    /// in memory; there is no streaming path.
    pub async fn download_document(
        &self,
        case_id: CaseId,
        document_id: DocumentId,
    ) -> Result<Vec<u8>, GatewayError> {
        let request = self
            .authorized(self.http.get(self.endpoint(&format!(
                "/cases/{}/download/{}",
                case_id.0, document_id.0
            ))))
            .await?;
        let response = request.send().await?;
        let response = Self::success(response, "Failed to download document").await?;
        Ok(response.bytes().await?.to_vec())
    }

    /* discussion */

    pub async fn list_messages(&self, case_id: CaseId) -> Result<Vec<MessageRecord>, GatewayError> {
        let request = self
            .authorized(
                self.http
                    .get(self.endpoint(&format!("/cases/{}/discuss/", case_id.0))),
            )
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch messages")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn post_message(&self, case_id: CaseId, content: &str) -> Result<(), GatewayError> {
        let request = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("/cases/{}/discuss/", case_id.0))),
            )
            .await?
            .json(&PostMessageRequest {
                content: content.to_string(),
            });
        let response = request.send().await?;
        Self::success(response, "Failed to post message").await?;
        Ok(())
    }

    /* gp */

    pub async fn gp_cases(&self) -> Result<Vec<CaseRecord>, GatewayError> {
        let request = self.authorized(self.http.get(self.endpoint("/gp/cases"))).await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch assigned cases")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn gp_decision(
        &self,
        case_id: CaseId,
        request: &GpDecisionRequest,
    ) -> Result<(), GatewayError> {
        let builder = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("/gp/cases/{}/decision", case_id.0))),
            )
            .await?
            .json(request);
        let response = builder.send().await?;
        Self::success(response, "Failed to submit decision").await?;
        Ok(())
    }

    /// PUT /gp/approve/{id}, the legacy decision path kept for backends that
    /// predate the decision endpoint.
    pub async fn approve_case_legacy(&self, case_id: CaseId) -> Result<(), GatewayError> {
        let request = self
            .authorized(
                self.http
                    .put(self.endpoint(&format!("/gp/approve/{}", case_id.0))),
            )
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to approve case").await?;
        Ok(())
    }

    /* admin */

    pub async fn admin_cases(&self) -> Result<Vec<CaseRecord>, GatewayError> {
        let request = self
            .authorized(self.http.get(self.endpoint("/admin/cases/all")))
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch cases")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn admin_gps(&self) -> Result<Vec<GpSummary>, GatewayError> {
        let request = self.authorized(self.http.get(self.endpoint("/admin/gps"))).await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch GP roster")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn admin_case_detail(&self, case_id: CaseId) -> Result<CaseRecord, GatewayError> {
        let request = self
            .authorized(
                self.http
                    .get(self.endpoint(&format!("/admin/cases/{}", case_id.0))),
            )
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch case details")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn assign_gp(
        &self,
        case_id: CaseId,
        request: &AssignGpRequest,
    ) -> Result<(), GatewayError> {
        let builder = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("/admin/cases/{}/assign", case_id.0))),
            )
            .await?
            .json(request);
        let response = builder.send().await?;
        Self::success(response, "Failed to assign case").await?;
        Ok(())
    }

    /* qa */

    pub async fn qa_cases(&self) -> Result<Vec<CaseRecord>, GatewayError> {
        let request = self.authorized(self.http.get(self.endpoint("/qa/cases"))).await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch QA pool cases")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn qa_my_cases(&self) -> Result<Vec<CaseRecord>, GatewayError> {
        let request = self
            .authorized(self.http.get(self.endpoint("/qa/my-cases")))
            .await?;
        let response = request.send().await?;
        Self::success(response, "Failed to fetch QA cases")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    /// POST /qa/assign-random. Pulls one case from the pool onto the
    /// calling QA actor.
    pub async fn qa_assign_random(&self) -> Result<CaseRecord, GatewayError> {
        let request = self
            .authorized(self.http.post(self.endpoint("/qa/assign-random")))
            .await?;
        let response = request.send().await?;
        Self::success(response, "No QA cases available")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    pub async fn qa_feedback(
        &self,
        case_id: CaseId,
        request: &QaFeedbackRequest,
    ) -> Result<(), GatewayError> {
        let builder = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("/qa/cases/{}/feedback", case_id.0))),
            )
            .await?
            .json(request);
        let response = builder.send().await?;
        Self::success(response, "Failed to submit QA feedback").await?;
        Ok(())
    }
}
