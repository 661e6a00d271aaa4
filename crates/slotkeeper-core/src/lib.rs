//! Core library for slotkeeper.
//!
//! Provides everything a front-end needs to talk to the reservation API:
//!
//! - `auth`: credential storage, the session state machine and token refresh
//! - `api`: the bearer-token HTTP transport, the retry-on-401 coordinator and
//!   the typed endpoint client
//! - `models`: wire types for users, tokens and reservations
//! - `validation`: client-side form checks
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, Credential, CredentialStore, SessionContext, SessionState};
pub use config::Config;
