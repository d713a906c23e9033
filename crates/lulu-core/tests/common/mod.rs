//! In-process stand-in for the farm backend.
//!
//! Serves the handful of routes the session tests need on `127.0.0.1:0` and
//! records what the client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

use lulu_core::auth::{MemoryBackend, StoredToken, TokenBackend, TokenStore};
use lulu_core::{ClientConfig, SessionContext};

pub const VALID_TOKEN: &str = "T";

#[derive(Clone)]
pub struct MockState {
    /// Token the backend currently accepts
    pub accepted_token: Arc<Mutex<String>>,
    /// `Authorization` header of every request, in arrival order
    pub auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    /// Query strings of every request, keyed by route name
    pub queries: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    /// JSON bodies of admin writes, keyed by route name
    pub bodies: Arc<Mutex<Vec<(String, Value)>>>,
    /// When set, `/auth/me` waits for `me_release` before answering
    pub hold_me: Arc<AtomicBool>,
    pub me_release: Arc<Notify>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            accepted_token: Arc::new(Mutex::new(VALID_TOKEN.to_string())),
            auth_headers: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
            bodies: Arc::new(Mutex::new(Vec::new())),
            hold_me: Arc::new(AtomicBool::new(false)),
            me_release: Arc::new(Notify::new()),
        }
    }
}

impl MockState {
    pub fn revoke_tokens(&self) {
        *self.accepted_token.lock().unwrap() = "revoked".to_string();
    }

    pub fn last_auth_header(&self) -> Option<String> {
        self.auth_headers.lock().unwrap().last().cloned().flatten()
    }

    pub fn queries_for(&self, route: &str) -> Vec<HashMap<String, String>> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == route)
            .map(|(_, q)| q.clone())
            .collect()
    }

    pub fn bodies_for(&self, route: &str) -> Vec<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == route)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record(&self, headers: &HeaderMap) -> bool {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let expected = format!("Bearer {}", self.accepted_token.lock().unwrap());
        let authorized = header.as_deref() == Some(expected.as_str());
        self.auth_headers.lock().unwrap().push(header);
        authorized
    }
}

pub fn admin_user() -> Value {
    json!({
        "id": "u-1",
        "username": "admin",
        "email": "admin@alpaca-lulu.ru",
        "full_name": "Администратор фермы",
        "role": "admin",
        "last_login": "2024-05-01T10:00:00.123456"
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "secret" {
        Json(json!({
            "access_token": VALID_TOKEN,
            "token_type": "bearer",
            "user": admin_user()
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response()
    }
}

async fn me(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if state.hold_me.load(Ordering::SeqCst) {
        state.me_release.notified().await;
    }
    if state.record(&headers) {
        Json(admin_user()).into_response()
    } else {
        unauthorized()
    }
}

async fn admin_bookings(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !state.record(&headers) {
        return unauthorized();
    }
    Json(json!([{
        "id": "b-1",
        "name": "Мария",
        "phone": "+7 900 000-00-00",
        "email": null,
        "message": "Придём с детьми",
        "status": "new",
        "created_at": "2024-07-01T12:00:00"
    }]))
    .into_response()
}

async fn update_booking_status(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !state.record(&headers) {
        return unauthorized();
    }
    let mut recorded = query;
    recorded.insert("id".to_string(), id);
    state
        .queries
        .lock()
        .unwrap()
        .push(("booking_status".to_string(), recorded));
    Json(json!({"message": "Статус заявки обновлен"})).into_response()
}

async fn create_booking(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&headers);
    let phone = body["phone"].as_str().unwrap_or_default();
    if phone.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Phone required"})),
        )
            .into_response();
    }
    Json(json!({
        "message": "Заявка успешно отправлена! Мы свяжемся с вами в ближайшее время.",
        "id": "b-2"
    }))
    .into_response()
}

async fn reviews(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let limit: usize = query
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(20);
    state
        .queries
        .lock()
        .unwrap()
        .push(("reviews".to_string(), query));
    let all: Vec<Value> = (1..=5)
        .map(|i| {
            json!({
                "id": format!("r-{}", i),
                "name": format!("Гость {}", i),
                "text": "Очень понравилось",
                "rating": 5,
                "date": "2024-06-12T09:30:00",
                "response": null
            })
        })
        .collect();
    Json(Value::Array(all.into_iter().take(limit).collect())).into_response()
}

fn alpaca_walk() -> Value {
    json!({
        "id": "s-1",
        "title": "Прогулка с альпаками",
        "slug": "alpaca-walk",
        "description": "Часовая прогулка по ферме",
        "price": "1500 ₽",
        "image": "/images/walk.jpg",
        "duration": "1 час",
        "max_people": 6,
        "is_active": true
    })
}

async fn service_by_slug(Path(slug): Path<String>) -> Response {
    if slug == "alpaca-walk" {
        Json(alpaca_walk()).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Услуга не найдена"})),
        )
            .into_response()
    }
}

async fn create_service(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.record(&headers) {
        return unauthorized();
    }
    state
        .bodies
        .lock()
        .unwrap()
        .push(("create_service".to_string(), body));
    Json(json!({"message": "Услуга создана", "id": "s-2"})).into_response()
}

async fn update_service(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !state.record(&headers) {
        return unauthorized();
    }
    body["id"] = Value::String(id);
    state
        .bodies
        .lock()
        .unwrap()
        .push(("update_service".to_string(), body));
    Json(json!({"message": "Услуга обновлена"})).into_response()
}

async fn blog_posts(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state
        .queries
        .lock()
        .unwrap()
        .push(("blog_posts".to_string(), query));
    Json(json!([{
        "id": "p-1",
        "title": "Как мы стригли альпак",
        "slug": "shearing-day",
        "excerpt": "Весенняя стрижка",
        "content": "Каждую весну...",
        "author": "Ферма ЛуЛу",
        "publish_date": "2024-04-20T08:00:00",
        "tags": ["альпаки"],
        "image": "/images/shearing.jpg",
        "views": 12
    }]))
    .into_response()
}

async fn gallery() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn site_info() -> Response {
    Json(json!({
        "name": "Ферма ЛуЛу",
        "location": "в Космакова",
        "distance": "всего 30 км от Екатеринбурга",
        "phone": "+7 (343) 379-42-98",
        "email": "info@alpaca-lulu.ru",
        "address": "ул. Свободы, 28, д. Космакова",
        "description": "Полезное семейное развлечение на свежем воздухе и в любую погоду",
        "working_hours": "Ежедневно с 10:00 до 18:00",
        "social_media": {"vk": "https://vk.com/alpaca_lulu"}
    }))
    .into_response()
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/site-info", get(site_info))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/admin/bookings", get(admin_bookings))
        .route("/api/admin/bookings/{id}/status", put(update_booking_status))
        .route("/api/bookings", post(create_booking))
        .route("/api/reviews", get(reviews))
        .route("/api/gallery", get(gallery))
        .route("/api/services/{slug}", get(service_by_slug))
        .route("/api/blog/posts", get(blog_posts))
        .route("/api/admin/services", post(create_service))
        .route("/api/admin/services/{id}", put(update_service))
        .with_state(state)
}

/// Start the mock backend and return its base URL.
pub async fn spawn(state: MockState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Token backend that counts how often the token is cleared.
pub struct CountingBackend {
    inner: MemoryBackend,
    pub clears: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn new(token: Option<&str>) -> (Self, Arc<AtomicUsize>) {
        let inner = match token {
            Some(token) => MemoryBackend::with_token(StoredToken::new(token)),
            None => MemoryBackend::default(),
        };
        let clears = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                clears: Arc::clone(&clears),
            },
            clears,
        )
    }
}

impl TokenBackend for CountingBackend {
    fn load(&self) -> anyhow::Result<Option<StoredToken>> {
        self.inner.load()
    }

    fn store(&self, token: &StoredToken) -> anyhow::Result<()> {
        self.inner.store(token)
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

/// Session against `base_url` with an optional pre-stored token.
pub fn session(base_url: &str, token: Option<&str>) -> (SessionContext, Arc<AtomicUsize>) {
    let (backend, clears) = CountingBackend::new(token);
    let tokens = TokenStore::open(Box::new(backend));
    let config = ClientConfig::new(base_url).unwrap();
    (SessionContext::new(&config, tokens).unwrap(), clears)
}
