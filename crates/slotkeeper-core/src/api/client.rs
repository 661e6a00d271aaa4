//! API client for the reservation service.
//!
//! This module provides the `ApiClient` struct for logging in, registering,
//! and managing reservations. Every reservation call goes through the
//! `AuthorizedClient`, so an expired access token is refreshed transparently.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, CredentialStore, SessionContext, TokenRefresher};
use crate::config::Config;
use crate::models::{
    LoginRequest, NewReservation, RegisterRequest, Reservation, ReservationUpdate, TokenPair,
    UserInfo,
};
use crate::validation::{validate_login, RegistrationForm};

use super::interceptor::AuthorizedClient;
use super::transport::{store_token_provider, HttpClient, PendingRequest};
use super::ApiError;

/// API client for the reservation service.
/// Clone is cheap - all state is shared behind Arcs.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    authorized: AuthorizedClient,
    session: Arc<SessionContext>,
    refresher: Arc<TokenRefresher>,
}

impl ApiClient {
    /// Create a client for `base_url` backed by `store`. The session is
    /// restored from the store immediately.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::new(base_url, timeout, store_token_provider(store.clone()))?;
        let session = Arc::new(SessionContext::new(store, http.clone()));
        let refresher = Arc::new(TokenRefresher::new(http.clone(), session.clone()));
        let authorized = AuthorizedClient::new(http.clone(), session.clone(), refresher.clone());

        Ok(Self {
            http,
            authorized,
            session,
            refresher,
        })
    }

    /// Create a client from configuration, opening the configured store.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = config.credential_store()?;
        Ok(Self::new(&config.api_base_url, config.request_timeout(), store)?)
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    // ===== Authentication =====

    /// Log in with email and password and start a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        validate_login(email, password)?;
        let email = email.trim();

        let request = PendingRequest::post("/auth/login").json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        // Not routed through the interceptor: a 401 here means bad
        // credentials, not an expired token.
        let pair: TokenPair = self.send_public(&request).await?;
        self.start_session(pair, email)
    }

    /// Create an account and start a session with it.
    pub async fn register(&self, form: &RegistrationForm) -> Result<(), AuthError> {
        let body: RegisterRequest = form.validate()?;
        let email = body.email.clone();

        let request = PendingRequest::post("/auth/register").json(&body)?;
        let pair: TokenPair = self.send_public(&request).await?;
        self.start_session(pair, &email)
    }

    fn start_session(&self, pair: TokenPair, email: &str) -> Result<(), AuthError> {
        if !pair.has_access_token() {
            warn!(email, "Auth response carried no access token");
            return Err(AuthError::MissingAccessToken);
        }
        if pair.refresh_token.is_empty() {
            warn!(email, "Auth response carried no refresh token");
            return Err(AuthError::MissingRefreshToken);
        }
        self.session
            .login(&pair.access_token, &pair.refresh_token, email)
    }

    /// End the session. Always succeeds locally.
    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Force a token refresh outside of a failed request.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        self.refresher.refresh().await.map(|_| ())
    }

    /// Fetch the logged-in user's profile
    pub async fn user_info(&self) -> Result<UserInfo, ApiError> {
        self.get("/auth/info").await
    }

    /// Check a restored session against the server.
    ///
    /// Returns the user if the session is good and `None` if there is no
    /// session or the server refused it (in which case it is torn down).
    /// Network errors are returned and leave the session as it was.
    pub async fn verify_session(&self) -> Result<Option<UserInfo>, ApiError> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        match self.user_info().await {
            Ok(user) => Ok(Some(user)),
            Err(ApiError::Unauthorized) => {
                info!("Stored session was rejected by the server");
                self.session.invalidate();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ===== Reservations =====

    pub async fn list_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        let reservations: Vec<Reservation> = self.get("/reservations").await?;
        debug!(count = reservations.len(), "Fetched reservations");
        Ok(reservations)
    }

    pub async fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation, ApiError> {
        let request = PendingRequest::post("/reservations").json(reservation)?;
        let created: Reservation = self.execute_json(request).await?;
        info!(id = ?created.id, "Reservation created");
        Ok(created)
    }

    pub async fn update_reservation(&self, reservation: &ReservationUpdate) -> Result<Reservation, ApiError> {
        let request = PendingRequest::put("/reservations").json(reservation)?;
        let updated: Reservation = self.execute_json(request).await?;
        info!(id = reservation.id, "Reservation updated");
        Ok(updated)
    }

    pub async fn delete_reservation(&self, id: i64) -> Result<(), ApiError> {
        let request = PendingRequest::delete(format!("/reservations/{}", id));
        self.authorized.execute(request).await?;
        info!(id, "Reservation deleted");
        Ok(())
    }

    // ===== Helpers =====

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_json(PendingRequest::get(path)).await
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.authorized.execute(request).await?;
        Self::parse(response, &path).await
    }

    async fn send_public<T: DeserializeOwned>(&self, request: &PendingRequest) -> Result<T, ApiError> {
        let response = self.http.send_with(request, None).await?;
        Self::parse(response, &request.path).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }
}
