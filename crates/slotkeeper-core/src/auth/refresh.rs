//! Refresh-token exchange.
//!
//! A failed exchange ends the session: credentials that the server refused
//! to renew are cleared rather than kept around.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::transport::{HttpClient, PendingRequest};
use crate::api::ApiError;
use crate::models::{RefreshRequest, TokenPair};

use super::{AuthError, Credential, SessionContext};

pub struct TokenRefresher {
    http: HttpClient,
    session: Arc<SessionContext>,
    // Held for the whole exchange; concurrent callers queue here.
    in_flight: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(http: HttpClient, session: Arc<SessionContext>) -> Self {
        Self {
            http,
            session,
            in_flight: Mutex::new(()),
        }
    }

    /// Exchange the stored refresh token for a new pair.
    pub async fn refresh(&self) -> Result<Credential, AuthError> {
        self.refresh_rejected(None).await
    }

    /// Refresh on behalf of a request that was refused while carrying
    /// `rejected_token`. If another caller already rotated that token while
    /// this one waited, the stored credential is returned without a second
    /// exchange.
    pub async fn refresh_rejected(
        &self,
        rejected_token: Option<&str>,
    ) -> Result<Credential, AuthError> {
        let _guard = self.in_flight.lock().await;

        let current = self
            .session
            .store()
            .load()
            .filter(|c| !c.refresh_token.is_empty() && !c.user_email.is_empty());
        let Some(current) = current else {
            warn!("No refresh token available");
            self.session.invalidate();
            return Err(AuthError::NoRefreshToken);
        };

        if let Some(rejected) = rejected_token {
            if current.access_token != rejected {
                debug!("Access token already rotated by a concurrent refresh");
                return Ok(current);
            }
        }

        match self.exchange(&current).await {
            Ok(credential) => {
                if let Err(e) = self.session.store().save(&credential) {
                    warn!(error = %e, "Failed to persist refreshed credential");
                    self.session.logout().await;
                    return Err(e.into());
                }
                info!(email = %credential.user_email, "Access token refreshed");
                Ok(credential)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.session.logout().await;
                Err(AuthError::RefreshRejected(e.to_string()))
            }
        }
    }

    /// One `POST /auth/refresh`. The request is authenticated by the refresh
    /// token in the body, so no bearer header is sent.
    async fn exchange(&self, current: &Credential) -> Result<Credential, ApiError> {
        let request = PendingRequest::post("/auth/refresh").json(&RefreshRequest {
            email: current.user_email.clone(),
            refresh_token: current.refresh_token.clone(),
        })?;

        let response = self.http.send_with(&request, None).await?;
        let pair: TokenPair = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e))
        })?;

        if !pair.has_access_token() {
            return Err(ApiError::InvalidResponse(
                "Refresh response did not include an access token".to_string(),
            ));
        }

        // Servers that do not rotate refresh tokens omit the field.
        let refresh_token = if pair.refresh_token.is_empty() {
            current.refresh_token.clone()
        } else {
            pair.refresh_token
        };

        Ok(Credential::new(
            pair.access_token,
            refresh_token,
            current.user_email.clone(),
        ))
    }
}
