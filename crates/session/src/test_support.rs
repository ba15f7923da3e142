// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: token minting, a mock storefront backend, and
//! assertion helpers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::config::SessionConfig;
use crate::credential::{Credential, Role, UserProfile};
use crate::events::SessionEvent;
use crate::origin::Origin;
use crate::session::Session;
use crate::token::epoch_ms;

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// Unsigned JWT-shaped token carrying `payload`.
pub fn token_with_payload(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

/// Token labelled `label` that expires `offset_secs` from now.
pub fn token_for(label: &str, offset_secs: i64) -> String {
    let now_secs = (epoch_ms() / 1000) as i64;
    token_with_payload(&json!({ "exp": now_secs + offset_secs, "jti": label }))
}

pub fn mint_token(offset_secs: i64) -> String {
    token_for("t", offset_secs)
}

/// Label embedded in a token minted by [`token_for`].
pub fn token_label(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    value["jti"].as_str().map(str::to_owned)
}

pub fn profile() -> UserProfile {
    UserProfile {
        user_id: "u-1".to_owned(),
        full_name: "Ada Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        roles: vec![Role::Customer],
        avatar_url: None,
    }
}

pub fn credential(label: &str, offset_secs: i64) -> Credential {
    Credential { access_token: token_for(label, offset_secs), user: profile() }
}

/// Body of a successful login/register/refresh.
pub fn auth_body(label: &str, ttl_secs: i64, email: &str) -> Value {
    json!({
        "accessToken": token_for(label, ttl_secs),
        "userId": "u-1",
        "fullName": "Ada Lovelace",
        "email": email,
        "roles": ["Customer"],
    })
}

/// Collect every event currently buffered on `rx`.
pub fn drain_events(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

pub const PASSWORD: &str = "secret";
pub const TAKEN_EMAIL: &str = "taken@example.com";
pub const UNIT_PRICE: f64 = 10.0;

/// Knobs and counters of the mock backend.
pub struct BackendState {
    pub login_calls: AtomicU32,
    pub refresh_calls: AtomicU32,
    pub revoke_calls: AtomicU32,
    pub cart_calls: AtomicU32,
    /// Status the refresh endpoint answers with; 200 issues a new token.
    pub refresh_status: AtomicU16,
    pub refresh_delay_ms: AtomicU64,
    /// Lifetime of tokens issued by login/register.
    pub login_ttl_secs: AtomicI64,
    pub refresh_ttl_secs: AtomicI64,
    pub refresh_saw_bearer: AtomicBool,
    pub last_refresh_cookie: Mutex<Option<String>>,
    pub last_revoke_bearer: Mutex<Option<String>>,
    /// `(product_id, quantity)` lines of the single server-side cart.
    pub cart: Mutex<Vec<(u64, u32)>>,
    pub cart_warnings: Mutex<Vec<String>>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            login_calls: AtomicU32::new(0),
            refresh_calls: AtomicU32::new(0),
            revoke_calls: AtomicU32::new(0),
            cart_calls: AtomicU32::new(0),
            refresh_status: AtomicU16::new(200),
            refresh_delay_ms: AtomicU64::new(0),
            login_ttl_secs: AtomicI64::new(3600),
            refresh_ttl_secs: AtomicI64::new(3600),
            refresh_saw_bearer: AtomicBool::new(false),
            last_refresh_cookie: Mutex::new(None),
            last_revoke_bearer: Mutex::new(None),
            cart: Mutex::new(Vec::new()),
            cart_warnings: Mutex::new(Vec::new()),
        }
    }
}

impl BackendState {
    pub fn refreshes(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn fail_refresh(&self, status: u16) {
        self.refresh_status.store(status, Ordering::SeqCst);
    }

    pub fn delay_refresh(&self, delay: Duration) {
        self.refresh_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn issue_expired_logins(&self) {
        self.login_ttl_secs.store(-60, Ordering::SeqCst);
    }
}

/// In-process storefront API served on `127.0.0.1:0`.
pub struct MockBackend {
    addr: SocketAddr,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/refresh-token", post(refresh_token))
            .route("/api/auth/revoke-token", post(revoke_token))
            .route("/api/cart", get(get_cart).post(update_cart).delete(clear_cart))
            .route("/api/echo", get(echo))
            .route("/api/fail/{status}", get(fail))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { addr, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn config(&self) -> SessionConfig {
        SessionConfig::for_api(self.base_url())
    }

    /// Open a tab on `origin` against this backend.
    pub fn open_tab(&self, origin: &Origin) -> anyhow::Result<Session> {
        Ok(Session::open(self.config(), origin)?)
    }
}

type Shared = State<Arc<BackendState>>;

fn error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "statusCode": status.as_u16(),
        "message": message,
        "timeStamp": "2026-01-01T00:00:00Z",
    });
    (status, Json(body)).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn signed_in(body: Value) -> Response {
    let cookie = [(header::SET_COOKIE, "refreshToken=rt-1; Path=/; HttpOnly")];
    (StatusCode::OK, cookie, Json(body)).into_response()
}

async fn login(State(s): Shared, Json(body): Json<Value>) -> Response {
    s.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let email = body["identifier"].as_str().unwrap_or_default();
    signed_in(auth_body("T1", s.login_ttl_secs.load(Ordering::SeqCst), email))
}

async fn register(State(s): Shared, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == TAKEN_EMAIL {
        return error(StatusCode::CONFLICT, "Email is already registered");
    }
    if body["password"].as_str().map_or(true, str::is_empty) {
        return error(StatusCode::BAD_REQUEST, "Password is required");
    }
    signed_in(auth_body("T1", s.login_ttl_secs.load(Ordering::SeqCst), email))
}

async fn refresh_token(State(s): Shared, headers: HeaderMap) -> Response {
    let n = s.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    s.refresh_saw_bearer.store(headers.contains_key(header::AUTHORIZATION), Ordering::SeqCst);
    *s.last_refresh_cookie.lock() =
        headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).map(str::to_owned);

    let delay = s.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let status = StatusCode::from_u16(s.refresh_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !status.is_success() {
        return error(status, "Refresh token is invalid or expired");
    }
    let label = format!("T{}", n + 1);
    Json(auth_body(&label, s.refresh_ttl_secs.load(Ordering::SeqCst), "ada@example.com"))
        .into_response()
}

async fn revoke_token(State(s): Shared, headers: HeaderMap) -> Response {
    s.revoke_calls.fetch_add(1, Ordering::SeqCst);
    *s.last_revoke_bearer.lock() = bearer(&headers);
    let cookie = [(header::SET_COOKIE, "refreshToken=; Path=/; Max-Age=0")];
    (StatusCode::OK, cookie).into_response()
}

/// Cart endpoints require a live bearer token, like the real backend.
fn check_auth(headers: &HeaderMap) -> Result<(), Response> {
    match bearer(headers) {
        Some(token) if !crate::token::is_expired(&token) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}

fn cart_body(s: &BackendState) -> Value {
    let lines = s.cart.lock().clone();
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, qty)| {
            json!({
                "productId": id,
                "quantity": qty,
                "productName": format!("Product {id}"),
                "productPrice": UNIT_PRICE,
                "total": f64::from(*qty) * UNIT_PRICE,
            })
        })
        .collect();
    let total: f64 = lines.iter().map(|(_, qty)| f64::from(*qty) * UNIT_PRICE).sum();
    json!({ "items": items, "cartTotal": total, "warnings": s.cart_warnings.lock().clone() })
}

async fn get_cart(State(s): Shared, headers: HeaderMap) -> Response {
    s.cart_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    Json(cart_body(&s)).into_response()
}

async fn update_cart(State(s): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    s.cart_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    let lines: Vec<(u64, u32)> = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| Some((i["productId"].as_u64()?, i["quantity"].as_u64()? as u32)))
                .filter(|(_, qty)| *qty > 0)
                .collect()
        })
        .unwrap_or_default();
    *s.cart.lock() = lines;
    Json(cart_body(&s)).into_response()
}

async fn clear_cart(State(s): Shared, headers: HeaderMap) -> Response {
    s.cart_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    s.cart.lock().clear();
    Json(cart_body(&s)).into_response()
}

async fn echo(headers: HeaderMap) -> Json<Value> {
    let get = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({
        "authorization": get(header::AUTHORIZATION),
        "cookie": get(header::COOKIE),
    }))
}

async fn fail(Path(status): Path<u16>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error(status, &format!("failed with {}", status.as_u16()))
}
