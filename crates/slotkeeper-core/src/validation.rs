//! Client-side form validation.
//!
//! Runs before any request is sent. Each check reports every failing field,
//! not just the first one.

use std::fmt;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

use crate::models::{NewReservation, RegisterRequest, ReservationUpdate};
use crate::utils::parse_local_datetime;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_RESERVATION_NAME_LEN: usize = 2;
pub const MIN_DESCRIPTION_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid input: {}", render(.0))]
pub struct ValidationError(pub Vec<FieldError>);

fn render(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

#[derive(Default)]
struct Collector(Vec<FieldError>);

impl Collector {
    fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.0.push(FieldError {
                field,
                message: message.to_string(),
            });
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(ValidationError(self.0))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email.trim()))
}

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

/// Check the login form.
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    let mut c = Collector::default();
    c.check(is_valid_email(email), "email", "Valid email address is required");
    c.check(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password must be at least 6 characters",
    );
    c.finish(|| ())
}

/// Input of the registration form, before validation.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let mut c = Collector::default();
        c.check(char_len(&self.name) >= 1, "name", "Name is required");
        c.check(char_len(&self.last_name) >= 1, "lastName", "Last name is required");
        c.check(is_valid_email(&self.email), "email", "Valid email address is required");
        c.check(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 6 characters",
        );
        c.check(
            self.password == self.confirm_password,
            "confirmPassword",
            "Passwords don't match",
        );
        c.finish(|| RegisterRequest {
            name: self.name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Input of the create/edit reservation forms, with times as typed.
#[derive(Debug, Clone, Default)]
pub struct ReservationForm {
    pub name: String,
    pub description: String,
    pub start_at: String,
    pub end_at: String,
}

struct ValidReservation {
    name: String,
    description: String,
    start_at: NaiveDateTime,
    end_at: NaiveDateTime,
}

impl ReservationForm {
    fn check(&self) -> Result<ValidReservation, ValidationError> {
        let mut c = Collector::default();
        c.check(
            char_len(&self.name) >= MIN_RESERVATION_NAME_LEN,
            "name",
            "Name must be at least 2 characters",
        );
        c.check(
            char_len(&self.description) >= MIN_DESCRIPTION_LEN,
            "description",
            "Description must be at least 5 characters",
        );

        let start = parse_local_datetime(&self.start_at);
        let end = parse_local_datetime(&self.end_at);
        c.check(start.is_some(), "startAt", "Valid start date is required");
        c.check(end.is_some(), "endAt", "Valid end date is required");
        if let (Some(start), Some(end)) = (start, end) {
            c.check(start < end, "endAt", "End time must be after start time");
        }

        match (start, end) {
            (Some(start_at), Some(end_at)) => c.finish(|| ValidReservation {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                start_at,
                end_at,
            }),
            _ => Err(ValidationError(c.0)),
        }
    }

    pub fn validate_new(&self) -> Result<NewReservation, ValidationError> {
        let v = self.check()?;
        Ok(NewReservation {
            name: v.name,
            description: v.description,
            start_at: v.start_at,
            end_at: v.end_at,
        })
    }

    pub fn validate_update(&self, id: i64) -> Result<ReservationUpdate, ValidationError> {
        let v = self.check()?;
        Ok(ReservationUpdate {
            id,
            name: v.name,
            description: v.description,
            start_at: v.start_at,
            end_at: v.end_at,
        })
    }
}
