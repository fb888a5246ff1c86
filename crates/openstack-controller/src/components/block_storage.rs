//! Cinder.

use crate::error::ApiResult;
use crate::http::HttpClient;

/// Cinder sub-client. Only the API root is timed.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStorageRest {
    endpoint: String,
}

impl BlockStorageRest {
    /// Sub-client rooted at `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Base URL from the catalog.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cinder catalog URLs end in the project id (`.../volume/v3/<project>`); the timing request drops it.
    pub fn response_time_url(&self) -> String {
        match self.endpoint.rsplit_once('/') {
            Some((root, _)) => root.to_string(),
            None => self.endpoint.clone(),
        }
    }

    /// Round-trip time of the API root request, in milliseconds.
    pub async fn get_response_time(&self, http: &HttpClient) -> ApiResult<f64> {
        let response = http.get(&self.response_time_url()).await?;
        Ok(response.elapsed_ms())
    }
}
