//! Authentication module for managing the user session and its tokens.
//!
//! This module provides:
//! - `CredentialStore`: durable storage for the access/refresh token pair,
//!   backed by a JSON file, the OS keychain, or memory
//! - `SessionContext`: the `Loading -> Authenticated | Unauthenticated`
//!   state machine, with login and logout
//! - `TokenRefresher`: exchanges the refresh token for a new pair, at most
//!   one exchange in flight at a time
//!
//! A session is restored optimistically: a stored credential counts as
//! logged in until the server says otherwise.

pub mod credentials;
pub mod refresh;
pub mod session;

use thiserror::Error;

use crate::api::ApiError;
use crate::validation::ValidationError;

pub use credentials::{
    Credential, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore, StoreError,
};
pub use refresh::TokenRefresher;
pub use session::{SessionContext, SessionState};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh rejected: {0}")]
    RefreshRejected(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Server response did not include an access token")]
    MissingAccessToken,

    #[error("Server response did not include a refresh token")]
    MissingRefreshToken,

    #[error("Credential is missing an access token, refresh token or email")]
    IncompleteCredential,

    #[error("Credential storage failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
