mod helpers;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use helpers::guest_store;
use moodlog::api::types::{Credentials, Settings};
use moodlog::api::{ApiClient, ApiError, JournalApi};
use moodlog::pages::HomeData;
use moodlog::reconcile::{Page, Settled};
use moodlog::session;
use moodlog::store::{keys, LocalStore};

const GOOD_TOKEN: &str = "good-token";

#[derive(Clone)]
struct Backend {
    settings: Arc<Mutex<Settings>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {GOOD_TOKEN}"))
}

fn rejected() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "right" {
        let username = body["username"].clone();
        Json(json!({
            "access_token": GOOD_TOKEN,
            "token_type": "bearer",
            "user": { "id": 1, "username": username, "email": "sam@example.com" }
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect username or password" })),
        )
            .into_response()
    }
}

async fn signup() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": "Username already registered" })),
    )
        .into_response()
}

async fn verify_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) || body["password"] != "right" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect password" })),
        )
            .into_response();
    }
    Json(json!({ "valid": true })).into_response()
}

/// Reports whether the request carried a bearer token through `total_entries`.
async fn stats_overview(headers: HeaderMap) -> Json<Value> {
    let total = if headers.contains_key("authorization") { 1 } else { 0 };
    Json(json!({
        "total_entries": total,
        "entries_this_week": 0,
        "entries_today": 0,
        "avg_sentiment_this_week": 0.5
    }))
}

async fn recent_entries() -> Json<Value> {
    Json(json!([]))
}

async fn weekly_summary(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return rejected();
    }
    Json(json!({ "insights": "", "entry_count": 0 })).into_response()
}

async fn get_settings(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return rejected();
    }
    Json(backend.settings.lock().unwrap().clone()).into_response()
}

async fn put_settings(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(settings): Json<Settings>,
) -> Response {
    if !authorized(&headers) {
        return rejected();
    }
    *backend.settings.lock().unwrap() = settings.clone();
    Json(settings).into_response()
}

async fn validation_error() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": [{ "loc": ["body", "message"], "msg": "field required" }] })),
    )
        .into_response()
}

/// Start a fake backend on an ephemeral port and return its base URL.
async fn spawn_backend(settings: Settings) -> (String, Arc<Mutex<Settings>>) {
    let backend = Backend {
        settings: Arc::new(Mutex::new(settings)),
    };
    let shared = backend.settings.clone();
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/verify-password", post(verify_password))
        .route("/api/stats/overview", get(stats_overview))
        .route("/api/entries", get(recent_entries))
        .route("/api/summary/weekly", get(weekly_summary))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/chat", post(validation_error))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), shared)
}

fn signed_in(store: &dyn LocalStore, token: &str) {
    store.set(keys::TOKEN, token).unwrap();
    store.set(keys::USER, r#"{"username":"sam"}"#).unwrap();
}

#[tokio::test]
async fn bearer_is_attached_only_with_a_session() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    let client = ApiClient::new(&url, store.clone());

    assert_eq!(client.stats_overview().await.unwrap().total_entries, 0);

    signed_in(store.as_ref(), GOOD_TOKEN);
    assert_eq!(client.stats_overview().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn unauthorized_response_ends_the_session() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    signed_in(store.as_ref(), "expired-token");
    store.set(keys::HOME_SNAPSHOT, "{}").unwrap();
    let client = ApiClient::new(&url, store.clone());

    let err = client.settings().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(store.keys().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_credential_discards_page_refresh() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    signed_in(store.as_ref(), "expired-token");
    let client = ApiClient::new(&url, store.clone());

    let page = Page::<HomeData>::mount(store.clone());
    let settled = page.refresh(&client).await;

    assert_eq!(settled, Settled::Discarded);
    assert!(page.view().data.is_none());
    assert!(!session::has_credential(store.as_ref()).unwrap());
}

#[tokio::test]
async fn guest_rejection_keeps_guest_data() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    store.set(keys::CHAT_MESSAGES, "[]").unwrap();
    let client = ApiClient::new(&url, store.clone());

    let err = client.settings().await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 401, .. }));
    assert!(store.contains(keys::CHAT_MESSAGES).unwrap());
}

#[tokio::test]
async fn failed_login_reports_detail_and_keeps_state() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    store.set(keys::CHAT_MESSAGES, "[]").unwrap();
    let client = ApiClient::new(&url, store.clone());

    let err = client
        .login(&Credentials {
            username: "sam".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.detail(), Some("Incorrect username or password"));
    assert!(store.contains(keys::CHAT_MESSAGES).unwrap());
}

#[tokio::test]
async fn successful_login_establishes_session() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    store.set(keys::DASHBOARD_SNAPSHOT, "{}").unwrap();
    let client = ApiClient::new(&url, store.clone());

    let auth = client
        .login(&Credentials {
            username: "sam".into(),
            password: "right".into(),
        })
        .await
        .unwrap();
    session::establish(store.as_ref(), &auth).unwrap();

    assert_eq!(store.keys().unwrap(), vec!["token".to_string(), "user".to_string()]);
    assert_eq!(client.settings().await.unwrap(), Settings::default());
}

#[tokio::test]
async fn signup_conflict_surfaces_detail() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let client = ApiClient::new(&url, guest_store());

    let err = client
        .signup(&moodlog::api::types::SignupRequest {
            username: "sam".into(),
            email: "sam@example.com".into(),
            password: "hunter22".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 400, .. }));
    assert_eq!(err.detail(), Some("Username already registered"));
}

#[tokio::test]
async fn wrong_password_is_not_a_logout() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let store = guest_store();
    signed_in(store.as_ref(), GOOD_TOKEN);
    let client = ApiClient::new(&url, store.clone());

    assert!(!client.verify_password("wrong").await.unwrap());
    assert!(client.verify_password("right").await.unwrap());
    assert!(session::has_credential(store.as_ref()).unwrap());
}

#[tokio::test]
async fn safe_mode_keeps_other_settings() {
    let initial = Settings {
        reminder_enabled: false,
        reminder_time: "21:30".into(),
        privacy_mode: true,
        safe_mode: false,
    };
    let (url, server_settings) = spawn_backend(initial).await;
    let store = guest_store();
    signed_in(store.as_ref(), GOOD_TOKEN);
    let client = ApiClient::new(&url, store);

    let updated = client.set_safe_mode(true).await.unwrap();

    assert!(updated.safe_mode);
    let stored = server_settings.lock().unwrap().clone();
    assert!(stored.safe_mode);
    assert_eq!(stored.reminder_time, "21:30");
    assert!(stored.privacy_mode);
    assert!(!stored.reminder_enabled);
}

#[tokio::test]
async fn validation_detail_list_is_flattened() {
    let (url, _) = spawn_backend(Settings::default()).await;
    let client = ApiClient::new(&url, guest_store());

    let err = client.chat("hi").await.unwrap_err();

    assert_eq!(err.detail(), Some("field required"));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}"), guest_store());
    let err = client.stats_overview().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}
