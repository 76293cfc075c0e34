//! Request engine for the VAURMS REST API.
//!
//! Every call goes through one pipeline: build the URL from the API base,
//! attach the bearer token from the shared [`CredentialStore`], send, then
//! classify the response into an [`Outcome`] or an [`ApiError`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::auth::CredentialStore;

use super::download::{DirectorySink, DownloadSink};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default API root of a development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// TCP connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Empty parameter list for [`ApiClient::get`].
pub const NO_PARAMS: [(&str, &str); 0] = [];

/// Buffered session events per subscriber before the oldest are dropped.
const SESSION_EVENT_CAPACITY: usize = 16;

/// Settings the request engine is built from.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Where downloads are saved. `None` uses the user's download directory.
    pub download_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            download_dir: None,
        }
    }
}

/// Signal raised when the server rejects the current credential.
///
/// The composition root subscribes and turns this into "go to login".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Expired { path: String },
}

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Json(Value),
    Text(String),
}

impl Outcome {
    pub fn into_json(self) -> Value {
        match self {
            Outcome::Json(value) => value,
            Outcome::Text(text) => Value::String(text),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Json(value) => value.to_string(),
            Outcome::Text(text) => text,
        }
    }

    /// Deserialize into a typed model.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Outcome::Json(value) => serde_json::from_value(value).map_err(ApiError::Decode),
            Outcome::Text(text) => serde_json::from_str(&text).map_err(ApiError::Decode),
        }
    }
}

/// Per-call options for [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Merged over the computed defaults; these win on conflict.
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Attach a JSON body. Ignored for GET.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

enum Payload {
    Json(Option<Value>),
    Multipart(multipart::Form),
}

/// API client for the VAURMS backend.
/// Clone is cheap - the reqwest client, credential store and sink are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
    sink: Arc<dyn DownloadSink>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a new API client reading its token from `credentials`.
    pub fn new(config: &ClientConfig, credentials: Arc<CredentialStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        let sink: Arc<dyn DownloadSink> = match config.download_dir {
            Some(ref dir) => Arc::new(DirectorySink::new(dir.clone())),
            None => Arc::new(DirectorySink::default_location()),
        };

        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            sink,
            events,
        })
    }

    /// Replace the "save as" target used by [`ApiClient::download`].
    pub fn with_download_sink(mut self, sink: Arc<dyn DownloadSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Receive a [`SessionEvent`] for every request answered with 401.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ===== Core primitive =====

    /// Send a request to an API-relative `path` and decode the response.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Outcome, ApiError> {
        let response = self.send_request(path, options).await?;
        Self::decode(response).await
    }

    /// Same pipeline as [`ApiClient::request`], but the successful body is
    /// returned undecoded for endpoints whose payload is not strict JSON.
    pub(crate) async fn request_text(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<String, ApiError> {
        let response = self.send_request(path, options).await?;
        response.text().await.map_err(ApiError::NetworkUnavailable)
    }

    async fn send_request(&self, path: &str, options: RequestOptions) -> Result<Response, ApiError> {
        let mut headers = self.auth_headers()?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.extend(options.headers);

        self.send(path, options.method, headers, Payload::Json(options.body))
            .await
    }

    /// POST a multipart form. The transport sets `Content-Type` itself, so any
    /// caller-supplied one is dropped.
    pub async fn upload(&self, path: &str, form: multipart::Form) -> Result<Outcome, ApiError> {
        self.upload_with_headers(path, form, HeaderMap::new()).await
    }

    pub async fn upload_with_headers(
        &self,
        path: &str,
        form: multipart::Form,
        extra: HeaderMap,
    ) -> Result<Outcome, ApiError> {
        let mut headers = self.auth_headers()?;
        headers.extend(extra);
        headers.remove(header::CONTENT_TYPE);

        let response = self
            .send(path, Method::POST, headers, Payload::Multipart(form))
            .await?;
        Self::decode(response).await
    }

    /// Fetch a binary resource and hand it to the download sink under
    /// `suggested_name`. The bytes are never returned to the caller.
    pub async fn download(&self, path: &str, suggested_name: &str) -> Result<(), ApiError> {
        let mut headers = self.auth_headers()?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let response = self
            .send(path, Method::GET, headers, Payload::Json(None))
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(ApiError::NetworkUnavailable)?;

        let saved = self.sink.save(suggested_name, &bytes)?;
        debug!(path = path, saved = %saved.display(), bytes = bytes.len(), "Download saved");
        Ok(())
    }

    // ===== Verb helpers =====

    /// GET with `params` appended as a query string, in iteration order.
    pub async fn get<I, K, V>(&self, path: &str, params: I) -> Result<Outcome, ApiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let path = append_query(path, params);
        self.request(&path, RequestOptions::new(Method::GET)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Outcome, ApiError> {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Outcome, ApiError> {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Outcome, ApiError> {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Outcome, ApiError> {
        self.request(path, RequestOptions::new(Method::DELETE)).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Outcome, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.request(path, RequestOptions::new(method).json(body)).await
    }

    // ===== Pipeline =====

    fn url(&self, path: &str) -> Result<String, ApiError> {
        if path.contains("://") {
            return Err(ApiError::InvalidRequest(format!(
                "Expected an API-relative path, got {}",
                path
            )));
        }
        if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            Ok(format!("{}{}", self.base_url, path))
        } else {
            Ok(format!("{}/{}", self.base_url, path))
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.get() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Credential is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        path: &str,
        method: Method,
        headers: HeaderMap,
        payload: Payload,
    ) -> Result<Response, ApiError> {
        let url = self.url(path)?;
        let mut builder = self.client.request(method.clone(), &url).headers(headers);

        match payload {
            Payload::Json(Some(body)) if method != Method::GET => {
                let bytes = serde_json::to_vec(&body).map_err(ApiError::Encode)?;
                builder = builder.body(bytes);
            }
            Payload::Json(Some(_)) => debug!(path = path, "Ignoring body on GET request"),
            Payload::Json(None) => {}
            Payload::Multipart(form) => builder = builder.multipart(form),
        }

        debug!(method = %method, path = path, "Sending request");
        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::InvalidRequest(e.to_string())
            } else {
                warn!(method = %method, path = path, error = %e, "Request did not reach the server");
                ApiError::NetworkUnavailable(e)
            }
        })?;
        debug!(method = %method, path = path, status = response.status().as_u16(), "Received response");

        self.check_response(path, response).await
    }

    /// Pass successful responses through; turn everything else into an error.
    async fn check_response(&self, path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session(path);
            return Err(ApiError::AuthenticationRequired);
        }
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            path = path,
            status = status.as_u16(),
            body = %ApiError::truncate_body(&body),
            "Request failed"
        );
        Err(ApiError::from_status(status, &body))
    }

    fn expire_session(&self, path: &str) {
        warn!(path = path, "Credential rejected, clearing session");
        self.credentials.clear();
        // No subscribers is fine
        let _ = self.events.send(SessionEvent::Expired {
            path: path.to_string(),
        });
    }

    async fn decode(response: Response) -> Result<Outcome, ApiError> {
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(is_json_content_type)
            .unwrap_or(false);

        if is_json {
            let bytes = response
                .bytes()
                .await
                .map_err(ApiError::NetworkUnavailable)?;
            serde_json::from_slice(&bytes)
                .map(Outcome::Json)
                .map_err(ApiError::Decode)
        } else {
            let text = response
                .text()
                .await
                .map_err(ApiError::NetworkUnavailable)?;
            Ok(Outcome::Text(text))
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Append `params` to `path` as a percent-encoded query string.
pub fn append_query<I, K, V>(path: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let query = params
        .into_iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        path.to_string()
    } else if path.contains('?') {
        format!("{}&{}", path, query)
    } else {
        format!("{}?{}", path, query)
    }
}
