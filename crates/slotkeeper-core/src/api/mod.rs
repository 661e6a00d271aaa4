//! REST API client module for the reservation service.
//!
//! Layers, bottom up:
//! - `transport`: `HttpClient`, which attaches the stored bearer token to
//!   each request and maps error statuses to `ApiError`
//! - `interceptor`: `AuthorizedClient`, which refreshes the token once on a
//!   401 and replays the request
//! - `client`: `ApiClient`, the typed auth and reservation endpoints

pub mod client;
pub mod error;
pub mod interceptor;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::AuthorizedClient;
pub use transport::{HttpClient, PendingRequest, TokenProvider};
