#![allow(dead_code)]

//! In-process mock of the case-management backend, used by the gateway,
//! repository, and workflow tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use shared::{
    domain::{CaseId, DocumentId, MessageId, UserId},
    protocol::{
        AssignGpRequest, CaseRecord, CreateCaseRequest, DocumentRecord, GpDecision,
        GpDecisionRequest, GpSummary, MessageRecord, PostMessageRequest, QaFeedbackRequest,
    },
};
use tokio::{net::TcpListener, sync::Mutex};

pub fn token_for_role(role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","role":"{role}"}}"#).as_bytes());
    format!("{header}.{payload}.test-signature")
}

pub fn case_record(id: i64, status: Option<&str>) -> CaseRecord {
    CaseRecord {
        id: CaseId(id),
        claimant_id: Some(UserId(100)),
        description: format!("case {id} description"),
        date_of_birth: Some("1990-01-01".parse().expect("date")),
        status: status.map(str::to_string),
        created_at: Some("2026-01-05T08:00:00Z".parse().expect("timestamp")),
        assigned_gp_id: None,
        specialty: None,
        sla_deadline: None,
        qa_feedback: None,
        gp_decision_comment: None,
    }
}

#[derive(Default)]
pub struct Fixture {
    pub cases: Vec<CaseRecord>,
    pub gps: Vec<GpSummary>,
    pub documents: HashMap<i64, Vec<DocumentRecord>>,
    pub messages: HashMap<i64, Vec<MessageRecord>>,
    /// Role baked into the token /login hands out; `None` means login is
    /// rejected with a 401.
    pub login_role: Option<String>,
    /// Raw (status, body) override for GET /cases/my, for error-path
    /// tests.
    pub my_cases_error: Option<(u16, String)>,
    /// Filenames whose upload the backend rejects with a 500.
    pub failing_uploads: HashSet<String>,
    pub next_case_id: i64,
    pub next_document_id: i64,
    pub next_message_id: i64,
    pub assignments: Vec<(i64, AssignGpRequest)>,
    pub decisions: Vec<(i64, GpDecisionRequest)>,
    pub feedback: Vec<(i64, QaFeedbackRequest)>,
    pub deleted_cases: Vec<i64>,
    pub last_authorization: Option<String>,
}

impl Fixture {
    pub fn with_cases(cases: Vec<CaseRecord>) -> Self {
        Self {
            cases,
            login_role: Some("claimant".to_string()),
            next_case_id: 1000,
            next_document_id: 5000,
            next_message_id: 9000,
            ..Self::default()
        }
    }

    fn case_mut(&mut self, id: i64) -> Option<&mut CaseRecord> {
        self.cases.iter_mut().find(|case| case.id.0 == id)
    }
}

#[derive(Clone)]
pub struct Backend {
    pub state: Arc<Mutex<Fixture>>,
    hits: Arc<AtomicUsize>,
}

impl Backend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn spawn_backend(fixture: Fixture) -> (String, Backend) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let backend = Backend {
        state: Arc::new(Mutex::new(fixture)),
        hits: Arc::new(AtomicUsize::new(0)),
    };
    let app = Router::new()
        .route("/login", post(login))
        .route("/users/me", get(current_user))
        .route("/cases", post(create_case).get(my_cases))
        .route("/cases/my", get(my_cases))
        .route("/cases/:id", delete(delete_case))
        .route("/cases/:id/upload/", post(upload_document))
        .route("/cases/:id/documents/", get(list_documents))
        .route("/cases/:id/download/:file_id", get(download_document))
        .route("/cases/:id/discuss/", get(list_messages).post(post_message))
        .route("/admin/cases/all", get(all_cases))
        .route("/admin/gps", get(gp_roster))
        .route("/admin/cases/:id/assign", post(assign_gp))
        .route("/gp/cases", get(gp_cases))
        .route("/gp/cases/:id/decision", post(gp_decision))
        .route("/qa/cases", get(qa_cases))
        .route("/qa/cases/:id/feedback", post(qa_feedback))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), backend)
}

fn not_found(detail: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail })))
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(
    State(backend): State<Backend>,
    Form(_form): Form<LoginForm>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    match &fixture.login_role {
        Some(role) => Ok(Json(json!({
            "access_token": token_for_role(role),
            "token_type": "bearer",
        }))),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect email or password" })),
        )),
    }
}

async fn current_user(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    fixture.last_authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let role = fixture.login_role.clone().unwrap_or_default();
    Json(json!({
        "id": 1,
        "username": "test-user",
        "email": "test@example.com",
        "role": role,
    }))
}

async fn create_case(
    State(backend): State<Backend>,
    Json(request): Json<CreateCaseRequest>,
) -> Json<CaseRecord> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    fixture.next_case_id += 1;
    let mut record = case_record(fixture.next_case_id, Some("pending"));
    record.description = request.description;
    record.date_of_birth = Some(request.date_of_birth);
    fixture.cases.push(record.clone());
    Json(record)
}

async fn my_cases(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> Result<Json<Vec<CaseRecord>>, (StatusCode, String)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    fixture.last_authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    if let Some((status, body)) = fixture.my_cases_error.clone() {
        return Err((
            StatusCode::from_u16(status).expect("status"),
            body,
        ));
    }
    Ok(Json(fixture.cases.clone()))
}

async fn delete_case(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    let before = fixture.cases.len();
    fixture.cases.retain(|case| case.id.0 != id);
    if fixture.cases.len() == before {
        return Err(not_found("case not found"));
    }
    fixture.deleted_cases.push(id);
    Ok(Json(json!({ "ok": true })))
}

async fn upload_document(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<DocumentRecord>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut filename = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or_default().to_string();
            let _ = field.bytes().await;
        }
    }
    let mut fixture = backend.state.lock().await;
    if fixture.failing_uploads.contains(&filename) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": format!("storage rejected {filename}") })),
        ));
    }
    fixture.next_document_id += 1;
    let record = DocumentRecord {
        id: DocumentId(fixture.next_document_id),
        filename,
        uploaded_at: Some(Utc::now()),
        file_path: None,
    };
    fixture.documents.entry(id).or_default().push(record.clone());
    Ok(Json(record))
}

async fn list_documents(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
) -> Json<Vec<DocumentRecord>> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    Json(fixture.documents.get(&id).cloned().unwrap_or_default())
}

async fn download_document(
    State(backend): State<Backend>,
    Path((_id, file_id)): Path<(i64, i64)>,
) -> Result<Vec<u8>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let _ = file_id;
    Ok(b"%PDF-1.4 test binary".to_vec())
}

async fn list_messages(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
) -> Json<Vec<MessageRecord>> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    Json(fixture.messages.get(&id).cloned().unwrap_or_default())
}

async fn post_message(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(request): Json<PostMessageRequest>,
) -> Json<MessageRecord> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    fixture.next_message_id += 1;
    let record = MessageRecord {
        id: MessageId(fixture.next_message_id),
        content: request.content,
        sender_username: Some("test-user".to_string()),
        sender_role: Some("gp".to_string()),
        timestamp: Some(Utc::now()),
    };
    fixture.messages.entry(id).or_default().push(record.clone());
    Json(record)
}

async fn all_cases(State(backend): State<Backend>) -> Json<Vec<CaseRecord>> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    Json(fixture.cases.clone())
}

async fn gp_roster(State(backend): State<Backend>) -> Json<Vec<GpSummary>> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    Json(fixture.gps.clone())
}

async fn assign_gp(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(request): Json<AssignGpRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    let gp_id = request.gp_id;
    let specialty = request.specialty.clone();
    let sla_deadline = request.sla_deadline;
    fixture.assignments.push((id, request));
    match fixture.case_mut(id) {
        Some(case) => {
            case.status = Some("assigned".to_string());
            case.assigned_gp_id = Some(gp_id);
            case.specialty = Some(specialty);
            case.sla_deadline = Some(sla_deadline);
            Ok(Json(json!({ "ok": true })))
        }
        None => Err(not_found("case not found")),
    }
}

async fn gp_cases(State(backend): State<Backend>) -> Json<Vec<CaseRecord>> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    Json(fixture.cases.clone())
}

async fn gp_decision(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(request): Json<GpDecisionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    let decision = request.decision;
    let comment = request.comment.clone();
    fixture.decisions.push((id, request));
    match fixture.case_mut(id) {
        Some(case) => {
            case.status = Some(match decision {
                GpDecision::Approve => "qa_pending".to_string(),
                GpDecision::Deny => "returned".to_string(),
            });
            case.gp_decision_comment = Some(comment);
            Ok(Json(json!({ "ok": true })))
        }
        None => Err(not_found("case not found")),
    }
}

async fn qa_cases(State(backend): State<Backend>) -> Json<Vec<CaseRecord>> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let fixture = backend.state.lock().await;
    Json(fixture.cases.clone())
}

async fn qa_feedback(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(request): Json<QaFeedbackRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut fixture = backend.state.lock().await;
    let approved = request.approved;
    let feedback = request.feedback.clone();
    fixture.feedback.push((id, request));
    match fixture.case_mut(id) {
        Some(case) => {
            case.status = Some(if approved {
                "completed".to_string()
            } else {
                "returned".to_string()
            });
            case.qa_feedback = Some(feedback);
            Ok(Json(json!({ "ok": true })))
        }
        None => Err(not_found("case not found")),
    }
}
