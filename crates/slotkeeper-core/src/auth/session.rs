//! Process-wide authentication state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::transport::{HttpClient, PendingRequest};

use super::{AuthError, Credential, CredentialStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum SessionState {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Holds the session state and the credential store behind it.
///
/// The state is a projection of whether a credential is stored; it is never
/// persisted itself. Front-ends can `subscribe` to see the session drop when
/// a token refresh fails.
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
    http: HttpClient,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    /// Create the context and restore the session from the store.
    pub fn new(store: Arc<dyn CredentialStore>, http: HttpClient) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        let context = Self { store, http, state };
        context.restore();
        context
    }

    /// Re-derive the state from the store. A stored credential is trusted
    /// without asking the server.
    pub fn restore(&self) -> SessionState {
        self.state.send_replace(SessionState::Loading);
        let next = if self.store.load().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        debug!(state = ?next, "Session restored from credential store");
        self.state.send_replace(next);
        next
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.state() == SessionState::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn user_email(&self) -> Option<String> {
        self.store.load().map(|c| c.user_email)
    }

    /// Route guard for protected views.
    pub fn require_authenticated(&self) -> Result<(), AuthError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }

    /// Persist a fresh credential and enter the authenticated state.
    pub fn login(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_email: &str,
    ) -> Result<(), AuthError> {
        let credential = Credential::new(access_token, refresh_token, user_email.trim());
        if !credential.is_complete() {
            warn!("Refusing to start a session with an incomplete credential");
            return Err(AuthError::IncompleteCredential);
        }
        self.store.save(&credential)?;
        self.state.send_replace(SessionState::Authenticated);
        info!(email = user_email, "Logged in");
        Ok(())
    }

    /// Tell the server (best effort), then drop the local session no matter
    /// what the server said.
    pub async fn logout(&self) {
        if self.store.load().is_some() {
            match self.http.send(&PendingRequest::post("/auth/logout")).await {
                Ok(_) => debug!("Server acknowledged logout"),
                Err(e) => warn!(error = %e, "Logout request failed, clearing local session anyway"),
            }
        }
        self.invalidate();
        info!("Logged out");
    }

    /// Local teardown only: clear the store and mark the session
    /// unauthenticated.
    pub fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential store");
        }
        self.state.send_replace(SessionState::Unauthenticated);
    }
}
