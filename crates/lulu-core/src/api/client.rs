//! HTTP client wrapper for the farm backend.
//!
//! Every request goes to `<base_url>/api<path>` with a JSON content type and,
//! when the session has one, an `Authorization: Bearer` header. The token is
//! read through [`AuthHooks`] on each request, and a 401 response is reported
//! back through the same trait before the call fails.

use std::sync::Arc;

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;

use super::ApiError;

/// Path prefix all backend routes live under
const API_PREFIX: &str = "/api";

/// Connects the transport to whoever owns the session.
///
/// `bearer_token` is consulted on every request. `unauthorized` is called
/// once per 401 response with the token that request carried, before the
/// error is returned to the caller.
pub trait AuthHooks: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
    fn unauthorized(&self, rejected_token: Option<&str>);
}

/// Hooks for a client that only calls public endpoints.
#[derive(Debug, Default)]
pub struct NoAuth;

impl AuthHooks for NoAuth {
    fn bearer_token(&self) -> Option<String> {
        None
    }

    fn unauthorized(&self, _rejected_token: Option<&str>) {}
}

/// API client for the farm backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_base: String,
    auth: Arc<dyn AuthHooks>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ClientConfig, auth: Arc<dyn AuthHooks>) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: format!("{}{}", config.base_url, API_PREFIX),
            auth,
        })
    }

    /// Client for the public pages; never sends a token.
    pub fn anonymous(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config, Arc::new(NoAuth))
    }

    /// Full URL for a backend path such as `/auth/me`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }

    /// Issue a request and decode the JSON response.
    ///
    /// `query` is appended as URL parameters and `body`, when given, is sent
    /// as JSON. Non-2xx responses become [`ApiError`]s carrying the server's
    /// `detail`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let token = self.auth.bearer_token();

        let mut request = self.client.request(method.clone(), &url);
        if let Some(ref token) = token {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, url = %url, authenticated = token.is_some(), "Sending API request");
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            return Self::decode(&url, &text);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %url, had_token = token.is_some(), "Request rejected as unauthorized");
            self.auth.unauthorized(token.as_deref());
        } else {
            warn!(
                url = %url,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&body),
                "API request failed"
            );
        }

        Err(error)
    }

    fn decode<T: DeserializeOwned>(url: &str, text: &str) -> Result<T, ApiError> {
        // An empty body decodes as `null` so `()` and `Option<T>` work
        let text = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| {
            warn!(url = %url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("{} from {}", e, url))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, &[], None).await
    }

    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, query, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::DELETE, path, &[], None).await
    }
}
