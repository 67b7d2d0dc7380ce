use std::sync::Arc;

use shared::domain::{CaseId, DocumentId};

use crate::{
    gateway::{ApiGateway, GatewayError},
    session::Session,
    test_support::{case_record, spawn_backend, Fixture},
};

fn gateway_for(url: &str) -> (Arc<ApiGateway>, Arc<Session>) {
    let session = Session::new();
    let gateway =
        Arc::new(ApiGateway::new(url, Arc::clone(&session)).expect("valid server url"));
    (gateway, session)
}

#[tokio::test]
async fn sign_in_stores_the_token_and_sends_it_as_a_bearer_header() {
    let (url, backend) = spawn_backend(Fixture::with_cases(Vec::new())).await;
    let (gateway, session) = gateway_for(&url);

    let user = gateway
        .sign_in("claimant@example.com", "hunter2")
        .await
        .expect("sign in");
    assert_eq!(user.username.as_deref(), Some("test-user"));
    assert!(session.is_authenticated().await);

    let token = session.token().await.expect("token stored");
    let fixture = backend.state.lock().await;
    assert_eq!(
        fixture.last_authorization.as_deref(),
        Some(format!("Bearer {token}").as_str())
    );
}

#[tokio::test]
async fn login_failure_surfaces_the_backend_detail() {
    let mut fixture = Fixture::with_cases(Vec::new());
    fixture.login_role = None;
    let (url, _backend) = spawn_backend(fixture).await;
    let (gateway, session) = gateway_for(&url);

    let err = gateway
        .sign_in("claimant@example.com", "wrong")
        .await
        .expect_err("login must fail");
    match err {
        GatewayError::Api { message, .. } => {
            assert_eq!(message, "Incorrect email or password")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn authenticated_calls_without_a_token_never_reach_the_network() {
    let (url, backend) = spawn_backend(Fixture::with_cases(Vec::new())).await;
    let (gateway, _session) = gateway_for(&url);

    let err = gateway.my_cases().await.expect_err("must fail locally");
    assert!(matches!(err, GatewayError::NotAuthenticated));
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn error_bodies_yield_the_detail_field_or_the_per_call_fallback() {
    let mut fixture = Fixture::with_cases(Vec::new());
    fixture.my_cases_error = Some((403, r#"{"detail":"not yours"}"#.to_string()));
    let (url, backend) = spawn_backend(fixture).await;
    let (gateway, session) = gateway_for(&url);
    session.set_token("any-token").await;

    match gateway.my_cases().await.expect_err("403") {
        GatewayError::Api { status, message } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(message, "not yours");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    backend.state.lock().await.my_cases_error = Some((502, "<html>bad gateway</html>".to_string()));
    match gateway.my_cases().await.expect_err("502") {
        GatewayError::Api { message, .. } => {
            assert_eq!(message, "Failed to fetch my cases")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn upload_posts_multipart_and_returns_the_stored_record() {
    let (url, backend) = spawn_backend(Fixture::with_cases(vec![case_record(
        3,
        Some("pending"),
    )]))
    .await;
    let (gateway, session) = gateway_for(&url);
    session.set_token("any-token").await;

    let record = gateway
        .upload_document(
            CaseId(3),
            "mri-scan.pdf",
            Some("application/pdf"),
            b"%PDF-1.4 scan".to_vec(),
        )
        .await
        .expect("upload");
    assert_eq!(record.filename, "mri-scan.pdf");

    let fixture = backend.state.lock().await;
    let stored = fixture.documents.get(&3).expect("documents for case 3");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].filename, "mri-scan.pdf");
}

#[tokio::test]
async fn download_materializes_the_full_binary() {
    let (url, _backend) = spawn_backend(Fixture::with_cases(vec![case_record(
        3,
        Some("pending"),
    )]))
    .await;
    let (gateway, session) = gateway_for(&url);
    session.set_token("any-token").await;

    let bytes = gateway
        .download_document(CaseId(3), DocumentId(77))
        .await
        .expect("download");
    assert_eq!(bytes, b"%PDF-1.4 test binary".to_vec());
}

#[tokio::test]
async fn posting_a_message_then_listing_matches_server_state() {
    let (url, _backend) = spawn_backend(Fixture::with_cases(vec![case_record(
        3,
        Some("assigned"),
    )]))
    .await;
    let (gateway, session) = gateway_for(&url);
    session.set_token("any-token").await;

    gateway
        .post_message(CaseId(3), "please clarify the onset date")
        .await
        .expect("post");
    let messages = gateway.list_messages(CaseId(3)).await.expect("list");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "please clarify the onset date");
}

#[test]
fn rejects_invalid_server_urls() {
    let session = Session::new();
    assert!(matches!(
        ApiGateway::new("not a url", session),
        Err(GatewayError::InvalidServerUrl(_))
    ));
}
