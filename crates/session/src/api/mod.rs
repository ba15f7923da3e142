// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw HTTP client for the storefront API.
//!
//! No authorization policy lives here: the [`RequestPipeline`] decides which
//! bearer token (if any) goes on a request. Cookies always ride along through
//! the origin's shared jar.
//!
//! [`RequestPipeline`]: crate::pipeline::RequestPipeline

pub mod auth;

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::SessionConfig;
use crate::error::{ErrorCode, SessionError};

/// A request as seen by the pipeline, before authorization is applied.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `cart` or `auth/login`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, SessionError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    cookies: Arc<Jar>,
}

impl ApiClient {
    pub fn new(config: &SessionConfig, cookies: Arc<Jar>) -> Result<Self, SessionError> {
        crate::ensure_crypto();
        let http = Client::builder()
            .timeout(config.request_timeout())
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| SessionError::new(ErrorCode::Internal, format!("http client: {e}")))?;
        Ok(Self { http, base_url: config.api_base_url.trim_end_matches('/').to_owned(), cookies })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookies(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Send `req`, attaching `bearer` as the `Authorization` header when given.
    ///
    /// Non-success statuses are returned as errors built from the backend's
    /// error body.
    pub async fn execute(
        &self,
        req: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, SessionError> {
        let mut builder = self.http.request(req.method.clone(), self.url(&req.path));
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

/// Decode a JSON body. An empty body decodes as JSON `null`.
pub async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, SessionError> {
    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Turn a non-success response into a [`SessionError`].
pub async fn error_from_response(resp: reqwest::Response) -> SessionError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    SessionError::from_response(status, &body)
}
