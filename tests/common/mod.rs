#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use serde_json::{json, Map, Value};

use productpulse::api::ApiClient;
use productpulse::config::ClientConfig;
use productpulse::session::Session;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const MEMBER_EMAIL: &str = "member@example.com";
pub const MEMBER_PASSWORD: &str = "member-pass";

pub type Shared = Arc<Mutex<BackendState>>;

pub struct FakeUser {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub nickname: Option<String>,
    pub is_admin: bool,
}

impl FakeUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "nickname": self.nickname,
            "is_admin": self.is_admin,
        })
    }
}

pub struct FakeUpload {
    pub body: Value,
    /// List calls left before the upload shows up
    pub hidden_for: u32,
}

/// Everything the fake backend knows, plus what it saw
pub struct BackendState {
    pub base_url: String,
    pub users: Vec<FakeUser>,
    pub uploads: Vec<FakeUpload>,
    next_user_id: i64,
    next_upload_id: i64,

    /// "METHOD /path" for every request, in arrival order
    pub requests: Vec<String>,
    /// Multipart parts seen by the storage target; files are recorded by file name
    pub storage_parts: Vec<Vec<(String, String)>>,
    pub storage_saw_authorization: bool,
    /// File part contents, one entry per storage submission
    pub storage_files: Vec<Vec<u8>>,

    /// Issue a session cookie instead of a bearer token
    pub cookie_login: bool,
    pub presign_fields: Vec<(String, String)>,
    /// filename -> detail returned by the pre-signed URL endpoint
    pub presign_rejections: HashMap<String, String>,
    pub storage_status: u16,
    /// How many list calls a new upload stays hidden for
    pub ingest_polls: u32,
    pub fail_uploads_list: bool,
}

impl BackendState {
    fn seeded(base_url: &str) -> Self {
        let users = vec![
            FakeUser {
                id: 1,
                email: ADMIN_EMAIL.into(),
                password: ADMIN_PASSWORD.into(),
                nickname: Some("Ada".into()),
                is_admin: true,
            },
            FakeUser {
                id: 2,
                email: MEMBER_EMAIL.into(),
                password: MEMBER_PASSWORD.into(),
                nickname: None,
                is_admin: false,
            },
        ];

        let uploads = vec![
            FakeUpload {
                body: json!({
                    "id": 1,
                    "filename": "april_reviews.csv",
                    "status": "completed",
                    "created_at": "2024-05-01T10:00:00",
                    "results": [
                        {
                            "topic": "Pricing",
                            "review_count": 12,
                            "sentiment_score": -0.12,
                            "summary": "Customers consider the plans expensive."
                        },
                        {
                            "topic": "Support",
                            "review_count": 7,
                            "sentiment_score": 0.42,
                            "summary": "Fast and friendly responses."
                        }
                    ]
                }),
                hidden_for: 0,
            },
            FakeUpload {
                body: json!({
                    "id": 2,
                    "filename": "may_reviews.csv",
                    "status": "processing",
                    "created_at": "2024-06-01T08:30:00Z",
                    "results": []
                }),
                hidden_for: 0,
            },
            FakeUpload {
                body: json!({
                    "id": 3,
                    "filename": "empty_reviews.csv",
                    "status": "completed",
                    "created_at": "2024-06-02T08:30:00Z",
                    "results": []
                }),
                hidden_for: 0,
            },
        ];

        Self {
            base_url: base_url.to_string(),
            users,
            uploads,
            next_user_id: 3,
            next_upload_id: 4,
            requests: Vec::new(),
            storage_parts: Vec::new(),
            storage_saw_authorization: false,
            storage_files: Vec::new(),
            cookie_login: false,
            presign_fields: vec![
                ("key".into(), "abc".into()),
                ("policy".into(), "p0l1cy".into()),
                ("x-amz-signature".into(), "s1g".into()),
            ],
            presign_rejections: HashMap::new(),
            storage_status: 204,
            ingest_polls: 0,
            fail_uploads_list: false,
        }
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&FakeUser> {
        let id = session_user_id(headers)?;
        self.users.iter().find(|u| u.id == id)
    }

    /// Requests matching `prefix`, e.g. "POST /api/v1/uploads"
    pub fn count(&self, prefix: &str) -> usize {
        self.requests.iter().filter(|r| r.starts_with(prefix)).count()
    }
}

fn session_user_id(headers: &HeaderMap) -> Option<i64> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return auth.strip_prefix("Bearer token-")?.parse().ok();
    }
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().strip_prefix("session=user-"))
        .find_map(|id| id.parse().ok())
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Shared,
}

impl FakeBackend {
    pub fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn requests(&self) -> Vec<String> {
        self.with(|s| s.requests.clone())
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.with(|s| s.count(prefix))
    }

    /// Client config with short refresh delays
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(self.base_url.clone());
        config.upload.refresh_delay_ms = 10;
        config.upload.refresh_attempts = 4;
        config
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("client")
    }

    pub async fn login_as(&self, email: &str, password: &str) -> Result<Session> {
        let session = Session::new(self.client());
        session.login(email, password).await?;
        Ok(session)
    }

    pub async fn admin_session(&self) -> Result<Session> {
        self.login_as(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn member_session(&self) -> Result<Session> {
        self.login_as(MEMBER_EMAIL, MEMBER_PASSWORD).await
    }
}

/// Starts a fresh fake backend on an unused port
pub async fn spawn_backend() -> Result<FakeBackend> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind fake backend")?;
    let base_url = format!("http://127.0.0.1:{}", port);
    let state: Shared = Arc::new(Mutex::new(BackendState::seeded(&base_url)));

    let app = router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(FakeBackend { base_url, state })
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/token", post(token))
        .route("/auth/users/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/uploads/", get(list_uploads))
        .route("/uploads/presigned-url", post(presign))
        .route("/uploads/:id", get(upload_detail))
        .route("/admin/analytics", get(analytics))
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/:id", put(update_user).delete(delete_user));

    Router::new()
        .nest("/api/v1", api)
        .route("/storage", post(storage))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    state.lock().unwrap().requests.push(line);
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn token(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    let state = state.lock().unwrap();
    let username = form.get("username").cloned().unwrap_or_default();
    let password = form.get("password").cloned().unwrap_or_default();

    let Some(user) = state
        .users
        .iter()
        .find(|u| u.email == username && u.password == password)
    else {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    };

    if state.cookie_login {
        let cookie = format!("session=user-{}; Path=/; HttpOnly", user.id);
        return (
            [(header::SET_COOKIE, cookie)],
            Json(json!({ "message": "Login successful" })),
        )
            .into_response();
    }
    Json(json!({ "access_token": format!("token-{}", user.id), "token_type": "bearer" })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    match state.user_for(&headers) {
        Some(user) => Json(user.to_json()).into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn logout() -> Response {
    (
        [(header::SET_COOKIE, "session=; Path=/; Max-Age=0")],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

async fn list_uploads(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    if state.user_for(&headers).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    if state.fail_uploads_list {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }

    let mut visible = Vec::new();
    for upload in state.uploads.iter_mut() {
        if upload.hidden_for == 0 {
            let mut body = upload.body.clone();
            if let Some(object) = body.as_object_mut() {
                object.remove("results");
            }
            visible.push(body);
        } else {
            upload.hidden_for -= 1;
        }
    }
    Json(Value::Array(visible)).into_response()
}

async fn upload_detail(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    if state.user_for(&headers).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    match state.uploads.iter().find(|u| u.body["id"] == json!(id)) {
        Some(upload) => Json(upload.body.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Upload not found"),
    }
}

async fn presign(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock().unwrap();
    if state.user_for(&headers).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let filename = query.get("filename").cloned().unwrap_or_default();
    if let Some(message) = state.presign_rejections.get(&filename) {
        return detail(StatusCode::BAD_REQUEST, message);
    }

    let mut fields = Map::new();
    for (name, value) in &state.presign_fields {
        fields.insert(name.clone(), Value::String(value.clone()));
    }
    Json(json!({ "url": format!("{}/storage", state.base_url), "fields": fields })).into_response()
}

async fn storage(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    let mut stored_name = None;
    let mut contents = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            contents = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            stored_name = Some(file_name.clone());
            parts.push((name, file_name));
        } else {
            let value = field.text().await.unwrap_or_default();
            parts.push((name, value));
        }
    }

    let mut state = state.lock().unwrap();
    state.storage_saw_authorization |= headers.contains_key(header::AUTHORIZATION);
    state.storage_parts.push(parts);
    state.storage_files.push(contents);

    let status = StatusCode::from_u16(state.storage_status).unwrap_or(StatusCode::NO_CONTENT);
    if status.is_success() {
        if let Some(filename) = stored_name {
            let id = state.next_upload_id;
            state.next_upload_id += 1;
            let hidden_for = state.ingest_polls;
            state.uploads.push(FakeUpload {
                body: json!({
                    "id": id,
                    "filename": filename,
                    "status": "pending",
                    "created_at": "2024-07-01T12:00:00Z",
                    "results": []
                }),
                hidden_for,
            });
        }
        return status.into_response();
    }
    (status, "<Error><Code>AccessDenied</Code></Error>").into_response()
}

fn require_admin(state: &BackendState, headers: &HeaderMap) -> Option<Response> {
    match state.user_for(headers) {
        None => Some(detail(StatusCode::UNAUTHORIZED, "Not authenticated")),
        Some(user) if !user.is_admin => Some(detail(StatusCode::FORBIDDEN, "Admin privileges required")),
        Some(_) => None,
    }
}

async fn analytics(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }
    let mut by_status: HashMap<String, u64> = HashMap::new();
    let mut results = 0;
    for upload in &state.uploads {
        let status = upload.body["status"].as_str().unwrap_or("unknown").to_string();
        *by_status.entry(status).or_default() += 1;
        results += upload.body["results"].as_array().map(Vec::len).unwrap_or(0);
    }
    Json(json!({
        "total_users": state.users.len(),
        "total_uploads": state.uploads.len(),
        "total_analysis_results": results,
        "uploads_by_status": by_status,
    }))
    .into_response()
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }
    Json(state.users.iter().map(FakeUser::to_json).collect::<Vec<_>>()).into_response()
}

async fn create_user(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.users.iter().any(|u| u.email == email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let user = FakeUser {
        id: state.next_user_id,
        email,
        password: body["password"].as_str().unwrap_or_default().to_string(),
        nickname: body["nickname"].as_str().map(str::to_string),
        is_admin: body["is_admin"].as_bool().unwrap_or(false),
    };
    state.next_user_id += 1;
    let created = user.to_json();
    state.users.push(user);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }
    let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if let Some(email) = body["email"].as_str() {
        user.email = email.to_string();
    }
    if let Some(nickname) = body["nickname"].as_str() {
        user.nickname = Some(nickname.to_string());
    }
    if let Some(is_admin) = body["is_admin"].as_bool() {
        user.is_admin = is_admin;
    }
    Json(user.to_json()).into_response()
}

async fn delete_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }
    let before = state.users.len();
    state.users.retain(|u| u.id != id);
    if state.users.len() == before {
        return detail(StatusCode::NOT_FOUND, "User not found");
    }
    StatusCode::NO_CONTENT.into_response()
}
