use futures::future::BoxFuture;
use tracing::{debug, error};

use super::ApiRest;
use crate::error::ApiResult;
use crate::session::AuthState;

/// A resource query borrowed from the facade for one attempt.
pub type ReauthFuture<'a, T> = BoxFuture<'a, ApiResult<Option<T>>>;

impl ApiRest {
    /// Runs `op`, re-authorizing and retrying it once if it fails with 401/403.
    ///
    /// - any other HTTP status is logged and yields `Ok(None)`;
    /// - a failed re-authorization propagates;
    /// - any failure of the retry is logged and yields `Ok(None)`;
    /// - a non-HTTP failure of the first attempt propagates.
    pub(crate) async fn with_reauth<T, F>(&mut self, what: &str, op: F) -> ApiResult<Option<T>>
    where
        F: for<'a> Fn(&'a mut ApiRest) -> ReauthFuture<'a, T>,
    {
        match op(self).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_auth_failure() => {
                debug!("{} failed with {}, re-authorizing", what, e);
                self.state = AuthState::Unauthenticated;
                self.authorize().await?;
                match op(self).await {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        error!("HTTPError while reporting {} after re-authorization: {}", what, e);
                        Ok(None)
                    }
                }
            }
            Err(e) if e.is_http() => {
                error!("HTTPError while reporting {}: {}", what, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
