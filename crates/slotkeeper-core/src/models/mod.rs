//! Wire types for the reservation API.
//!
//! - `UserInfo`, `TokenPair` and the auth request bodies
//! - `Reservation`, `NewReservation`, `ReservationUpdate`
//!
//! All types use the API's camelCase field names on the wire.

pub mod reservation;
pub mod user;

pub use reservation::{NewReservation, Reservation, ReservationUpdate};
pub use user::{LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserInfo};
