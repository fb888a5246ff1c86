//! Error types for the OpenStack API facade.

use thiserror::Error;

use crate::component::ComponentType;

/// Result type alias for facade operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error variants raised while talking to the OpenStack APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service catalog has no entry for this component under the configured interface.
    #[error("`{component}` component not found in catalog")]
    ComponentNotFound {
        /// The component type that could not be resolved.
        component: ComponentType,
    },

    /// The server answered with a 4xx or 5xx status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The request never produced a response (connect failure, timeout, TLS).
    #[error("transport error requesting {url}: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Description of the problem.
        reason: String,
    },

    /// Authentication succeeded but the response carried no `X-Subject-Token` header.
    #[error("authorization response is missing the X-Subject-Token header")]
    MissingSubjectToken,

    /// Configuration was rejected before any request was issued.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// True for 401 and 403 responses, the statuses that trigger re-authorization.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Http { status: 401 | 403, .. })
    }

    /// True for any 4xx or 5xx response.
    pub fn is_http(&self) -> bool {
        matches!(self, ApiError::Http { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn missing_key(url: &str, key: &str) -> Self {
        ApiError::Decode {
            url: url.to_string(),
            reason: format!("missing `{}`", key),
        }
    }
}
