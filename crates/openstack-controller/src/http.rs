//! Thin wrapper over `reqwest` shared by the facade and every sub-client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CheckConfig;
use crate::error::{ApiError, ApiResult};

/// Bearer token header.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Header keystone returns the issued token in.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
/// Compute microversion header.
pub const NOVA_MICROVERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";
/// Baremetal microversion header.
pub const IRONIC_MICROVERSION_HEADER: &str = "X-OpenStack-Ironic-API-Version";

/// A response below 400 with its JSON body already decoded.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL.
    pub url: String,
    /// The `X-Subject-Token` header, set on keystone token responses.
    pub subject_token: Option<String>,
    /// `Null` for an empty body.
    pub body: Value,
    /// Time until the response headers arrived.
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Round-trip time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Top-level member of the body, failing with `Decode` when absent.
    pub fn field(&self, key: &str) -> ApiResult<&Value> {
        self.body
            .get(key)
            .ok_or_else(|| ApiError::missing_key(&self.url, key))
    }

    /// Top-level array member of the body.
    pub fn array(&self, key: &str) -> ApiResult<&[Value]> {
        self.field(key)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| ApiError::Decode {
                url: self.url.clone(),
                reason: format!("`{}` is not an array", key),
            })
    }

    /// Takes the top-level member `key` out of the body.
    pub fn into_field(self, key: &str) -> ApiResult<Value> {
        let HttpResponse { url, body, .. } = self;
        match body {
            Value::Object(mut map) => map
                .remove(key)
                .ok_or_else(|| ApiError::missing_key(&url, key)),
            _ => Err(ApiError::missing_key(&url, key)),
        }
    }
}

/// HTTP client carrying the microversion headers and the current bearer token.
///
/// Sub-clients borrow this per request instead of holding a copy, so replacing the
/// token after re-authorization is visible to every later call.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl HttpClient {
    /// Builds a client with the configured timeout, TLS policy and microversions.
    pub fn new(config: &CheckConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(version) = &config.nova_microversion {
            debug!("adding {} header to `{}`", NOVA_MICROVERSION_HEADER, version);
            insert_header(&mut headers, NOVA_MICROVERSION_HEADER, version)?;
        }
        if let Some(version) = &config.ironic_microversion {
            debug!("adding {} header to `{}`", IRONIC_MICROVERSION_HEADER, version);
            insert_header(&mut headers, IRONIC_MICROVERSION_HEADER, version)?;
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.ssl_verify)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_token: None,
        })
    }

    /// Current bearer token, if any.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Replaces the bearer token.
    pub fn set_auth_token(&mut self, token: String) {
        self.auth_token = Some(token);
    }

    /// Drops the bearer token.
    pub fn clear_auth_token(&mut self) {
        self.auth_token = None;
    }

    /// GETs `url`.
    pub async fn get(&self, url: &str) -> ApiResult<HttpResponse> {
        self.send(url, self.client.get(url)).await
    }

    /// POSTs `body` as JSON to `url`.
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> ApiResult<HttpResponse> {
        self.send(url, self.client.post(url).json(body)).await
    }

    async fn send(&self, url: &str, mut request: reqwest::RequestBuilder) -> ApiResult<HttpResponse> {
        if let Some(token) = &self.auth_token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let elapsed = start.elapsed();

        let status = response.status();
        // 3xx is not a failure: keystone answers its API root with 300 Multiple Choices.
        if status.is_client_error() || status.is_server_error() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let subject_token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?
        };
        debug!("{} {} in {:?}: {}", status.as_u16(), url, elapsed, body);

        Ok(HttpResponse {
            url: url.to_string(),
            subject_token,
            body,
            elapsed,
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> ApiResult<()> {
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ApiError::InvalidConfig(format!("invalid header name {}", name)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| ApiError::InvalidConfig(format!("invalid value for {}: {:?}", name, value)))?;
    headers.insert(header, value);
    Ok(())
}
