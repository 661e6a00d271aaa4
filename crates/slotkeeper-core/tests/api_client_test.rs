//! Integration tests for login, logout and the reservation endpoints

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use slotkeeper_core::auth::{
    Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionState,
};
use slotkeeper_core::models::NewReservation;
use slotkeeper_core::validation::{RegistrationForm, ReservationForm};
use slotkeeper_core::{ApiClient, ApiError, AuthError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, store: Arc<dyn CredentialStore>) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5), store).expect("Failed to build client")
}

fn logged_in_store() -> Arc<dyn CredentialStore> {
    Arc::new(MemoryCredentialStore::with_credential(Credential::new(
        "a", "r", "u@x.com",
    )))
}

#[tokio::test]
async fn session_restored_from_store_at_startup() {
    let server = MockServer::start().await;

    let api = client(&server, logged_in_store());
    assert!(api.session().is_authenticated());

    let api = client(&server, Arc::new(MemoryCredentialStore::new()));
    assert!(!api.session().is_authenticated());
    assert_eq!(api.session().state(), SessionState::Unauthenticated);

    // Nothing was asked of the server to decide either way
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn login_stores_all_three_entries() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "u@x.com", "password": "secret1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a", "refreshToken": "r"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(dir.path()));

    //* When
    let api = client(&server, store.clone());
    api.login("u@x.com", "secret1").await.expect("Login should succeed");

    //* Then
    assert!(api.session().is_authenticated());
    assert_eq!(store.load(), Some(Credential::new("a", "r", "u@x.com")));
}

#[tokio::test]
async fn login_with_bad_password_does_not_refresh() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    //* When
    let api = client(&server, logged_in_store());
    let result = api.login("u@x.com", "wrong-password").await;

    //* Then
    assert!(matches!(result, Err(AuthError::Api(ApiError::Unauthorized))));
}

#[tokio::test]
async fn login_rejects_invalid_input_without_calling_server() {
    let server = MockServer::start().await;
    let api = client(&server, Arc::new(MemoryCredentialStore::new()));

    let result = api.login("not-an-email", "123").await;

    match result {
        Err(AuthError::Validation(e)) => {
            assert!(e.has_field("email"));
            assert!(e.has_field("password"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn login_without_token_in_response_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let api = client(&server, store.clone());
    let result = api.login("u@x.com", "secret1").await;

    assert!(matches!(result, Err(AuthError::MissingAccessToken)));
    assert!(store.load().is_none());
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn login_without_refresh_token_does_not_start_session() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(dir.path()));

    //* When
    let api = client(&server, store.clone());
    let result = api.login("u@x.com", "secret1").await;

    //* Then
    assert!(matches!(result, Err(AuthError::MissingRefreshToken)));
    assert!(store.load().is_none());
    assert!(!api.session().is_authenticated());
    assert!(matches!(
        api.session().require_authenticated(),
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn register_starts_session() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "name": "Ada",
            "lastName": "Lovelace",
            "email": "ada@x.com",
            "password": "secret1"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a", "refreshToken": "r"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let form = RegistrationForm {
        name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@x.com".into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
    };

    //* When
    let api = client(&server, store.clone());
    api.register(&form).await.expect("Registration should succeed");

    //* Then
    assert!(api.session().is_authenticated());
    assert_eq!(store.load(), Some(Credential::new("a", "r", "ada@x.com")));
}

#[tokio::test]
async fn logout_clears_store_even_when_server_fails() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(dir.path()));
    store.save(&Credential::new("a", "r", "u@x.com")).unwrap();

    //* When
    let api = client(&server, store.clone());
    assert!(api.session().is_authenticated());
    api.logout().await;

    //* Then
    assert!(store.load().is_none());
    assert!(!dir.path().join("credentials.json").exists());
    assert_eq!(api.session().state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn logout_survives_network_failure() {
    let store = logged_in_store();
    // Nothing listens on port 9
    let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2), store.clone()).unwrap();

    api.logout().await;

    assert!(store.load().is_none());
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn verify_session_downgrades_rejected_session() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/info"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    //* When
    let api = client(&server, logged_in_store());
    let user = api.verify_session().await.expect("Verification should not error");

    //* Then
    assert!(user.is_none());
    assert_eq!(api.session().state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn verify_session_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/info"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "email": "u@x.com", "name": "Ada", "lastName": "Lovelace"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let user = api.verify_session().await.unwrap().expect("User expected");

    assert_eq!(user.full_name(), "Ada Lovelace");
    assert!(api.session().is_authenticated());
}

#[tokio::test]
async fn create_reservation_conflict() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reservations"))
        .and(body_json(json!({
            "name": "Lunch match",
            "description": "2v2 finals",
            "startAt": "2025-03-01T12:00:00",
            "endAt": "2025-03-01T12:30:00"
        })))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Time slot already reserved"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(12, 30, 0).unwrap();

    //* When
    let api = client(&server, logged_in_store());
    let result = api
        .create_reservation(&NewReservation {
            name: "Lunch match".into(),
            description: "2v2 finals".into(),
            start_at: start,
            end_at: end,
        })
        .await;

    //* Then
    match result {
        Err(ApiError::Conflict(message)) => assert_eq!(message, "Time slot already reserved"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn update_and_delete_reservation() {
    //* Given
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/reservations"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "name": "Evening",
            "description": "casual games",
            "startAt": "2025-03-01T18:00:00",
            "endAt": "2025-03-01T19:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/reservations/4"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let update = ReservationForm {
        name: "Evening".into(),
        description: "casual games".into(),
        start_at: "2025-03-01T18:00".into(),
        end_at: "2025-03-01T19:00".into(),
    }
    .validate_update(4)
    .unwrap();

    //* When
    let api = client(&server, logged_in_store());
    let updated = api.update_reservation(&update).await.expect("Update should succeed");
    api.delete_reservation(4).await.expect("Delete should succeed");

    //* Then
    assert_eq!(updated.id, Some(4));
    assert_eq!(updated.name, "Evening");
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reservations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let result = api.list_reservations().await;

    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
}
