//! Refresh-and-replay on authorization failures.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{SessionContext, TokenRefresher};

use super::transport::{HttpClient, PendingRequest};
use super::ApiError;

/// Sends requests through `HttpClient` and handles a 401 by refreshing the
/// token and replaying the request exactly once.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: HttpClient,
    session: Arc<SessionContext>,
    refresher: Arc<TokenRefresher>,
}

impl AuthorizedClient {
    pub fn new(http: HttpClient, session: Arc<SessionContext>, refresher: Arc<TokenRefresher>) -> Self {
        Self {
            http,
            session,
            refresher,
        }
    }

    /// Execute one logical request.
    ///
    /// A 401 triggers a refresh only if the request has not been retried yet
    /// and a refresh token is stored. After a successful refresh the request
    /// is replayed with the new token and the replay's outcome is returned;
    /// after a failed refresh the original 401 is returned.
    pub async fn execute(&self, mut request: PendingRequest) -> Result<reqwest::Response, ApiError> {
        let sent_with = self.http.current_token();
        let original = match self.http.send_with(&request, sent_with.as_deref()).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        if !self.should_refresh(&original, &request) {
            return Err(original);
        }

        request.mark_retried();
        info!(method = %request.method, path = %request.path, "Access token rejected, refreshing");

        match self.refresher.refresh_rejected(sent_with.as_deref()).await {
            Ok(_) => {
                debug!(path = %request.path, "Replaying request with refreshed token");
                self.http.send(&request).await
            }
            Err(e) => {
                warn!(error = %e, path = %request.path, "Refresh failed, returning original error");
                Err(original)
            }
        }
    }

    fn should_refresh(&self, error: &ApiError, request: &PendingRequest) -> bool {
        error.is_unauthorized() && !request.is_retried() && self.session.store().has_refresh_token()
    }
}
