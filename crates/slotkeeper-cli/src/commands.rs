use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::warn;

use slotkeeper_core::models::Reservation;
use slotkeeper_core::validation::{RegistrationForm, ReservationForm};
use slotkeeper_core::{ApiClient, ApiError, AuthError, Config, SessionState};

use crate::display;
use crate::Command;

pub async fn dispatch(command: Command, api: &ApiClient, config: &mut Config) -> Result<()> {
    match command {
        Command::Login { email, password } => login(api, config, email, password).await,
        Command::Register {
            name,
            last_name,
            email,
        } => register(api, config, name, last_name, email).await,
        Command::Logout => {
            api.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => whoami(api).await,
        Command::Status { verify } => status(api, verify).await,
        Command::List => list(api).await,
        Command::Create {
            name,
            description,
            start,
            end,
        } => {
            let form = ReservationForm {
                name,
                description,
                start_at: start,
                end_at: end,
            };
            create(api, form).await
        }
        Command::Update {
            id,
            name,
            description,
            start,
            end,
        } => {
            let changes = ReservationChanges {
                name,
                description,
                start_at: start,
                end_at: end,
            };
            update(api, id, changes).await
        }
        Command::Delete { ids } => delete(api, &ids).await,
    }
}

/// Turn an error into the message shown to the user.
pub fn describe_error(error: &anyhow::Error) -> String {
    let api_error = error
        .downcast_ref::<ApiError>()
        .or_else(|| match error.downcast_ref::<AuthError>() {
            Some(AuthError::Api(e)) => Some(e),
            _ => None,
        });

    match api_error {
        Some(ApiError::Conflict(_)) => {
            "Time slot unavailable. Someone has already reserved this time slot. Please choose a different time.".to_string()
        }
        Some(ApiError::Unauthorized) => {
            "Session expired or credentials rejected. Run `slotkeeper login`.".to_string()
        }
        Some(ApiError::Network(_)) => {
            "Unable to connect to server. Check the API URL and your connection.".to_string()
        }
        _ => match error.downcast_ref::<AuthError>() {
            Some(AuthError::NotAuthenticated) => {
                "Not logged in. Run `slotkeeper login` first.".to_string()
            }
            _ => format!("{:#}", error),
        },
    }
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    if input.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(input.to_string())
    }
}

// Only the email is written back; `config` may carry --api-url and
// environment overrides that must stay one-off.
fn remember_email(config: &mut Config, email: &str) {
    config.last_email = Some(email.trim().to_string());
    if let Err(e) = Config::remember_last_email(email) {
        warn!(error = %e, "Failed to save config");
    }
}

async fn login(
    api: &ApiClient,
    config: &mut Config,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email", config.last_email.as_deref())?,
    };
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    api.login(&email, &password).await?;
    remember_email(config, &email);
    println!("Logged in as {}.", email.trim());
    Ok(())
}

async fn register(
    api: &ApiClient,
    config: &mut Config,
    name: String,
    last_name: String,
    email: String,
) -> Result<()> {
    let password = rpassword::prompt_password("Password: ")?;
    let confirm_password = rpassword::prompt_password("Confirm password: ")?;

    let form = RegistrationForm {
        name,
        last_name,
        email,
        password,
        confirm_password,
    };
    api.register(&form).await?;
    remember_email(config, &form.email);
    println!("Account created. Logged in as {}.", form.email.trim());
    Ok(())
}

async fn whoami(api: &ApiClient) -> Result<()> {
    api.session().require_authenticated()?;
    let user = api.user_info().await.context("Failed to load user information")?;
    println!("{} <{}>", user.full_name(), user.email);
    Ok(())
}

async fn status(api: &ApiClient, verify: bool) -> Result<()> {
    let session = api.session();
    if verify {
        match api.verify_session().await? {
            Some(user) => println!("Verified as {} <{}>.", user.full_name(), user.email),
            None => println!("No valid session on the server."),
        }
    }

    let state = match session.state() {
        SessionState::Loading => "loading",
        SessionState::Authenticated => "logged in",
        SessionState::Unauthenticated => "logged out",
    };
    println!("API:     {}", api.base_url());
    println!("Session: {}", state);
    if let Some(email) = session.user_email() {
        println!("Email:   {}", email);
    }
    Ok(())
}

async fn list(api: &ApiClient) -> Result<()> {
    api.session().require_authenticated()?;

    let (user, reservations) = tokio::join!(api.user_info(), api.list_reservations());
    match user {
        Ok(user) => println!("Hi, {}\n", user.full_name()),
        Err(e) => warn!(error = %e, "Failed to load user information"),
    }
    let reservations = reservations.context("Failed to load reservations")?;
    print!("{}", display::reservation_table(&reservations));
    Ok(())
}

async fn create(api: &ApiClient, form: ReservationForm) -> Result<()> {
    api.session().require_authenticated()?;
    let new = form.validate_new()?;

    match api.create_reservation(&new).await {
        Ok(created) => {
            println!("Reservation created.");
            print!("{}", display::reservation_table(&[created]));
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            // Point at the user's own bookings that clash, when there are any.
            if let Ok(existing) = api.list_reservations().await {
                let clashes: Vec<Reservation> = existing
                    .into_iter()
                    .filter(|r| r.overlaps(new.start_at, new.end_at))
                    .collect();
                if !clashes.is_empty() {
                    eprintln!("Your overlapping reservations:");
                    eprint!("{}", display::reservation_table(&clashes));
                }
            }
            Err(e.into())
        }
        Err(e) => Err(e).context("Failed to create reservation"),
    }
}

/// Fields given on the command line for `update`.
#[derive(Debug, Default)]
pub struct ReservationChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
}

impl ReservationChanges {
    /// Pre-fill the edit form with the current reservation, then apply the
    /// given changes on top.
    pub fn apply_to(self, current: &Reservation) -> ReservationForm {
        ReservationForm {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            start_at: self
                .start_at
                .unwrap_or_else(|| current.start_at.format("%Y-%m-%dT%H:%M").to_string()),
            end_at: self
                .end_at
                .unwrap_or_else(|| current.end_at.format("%Y-%m-%dT%H:%M").to_string()),
        }
    }
}

async fn update(api: &ApiClient, id: i64, changes: ReservationChanges) -> Result<()> {
    api.session().require_authenticated()?;

    let reservations = api
        .list_reservations()
        .await
        .context("Failed to load reservations")?;
    let current = reservations
        .iter()
        .find(|r| r.id == Some(id))
        .ok_or_else(|| anyhow::anyhow!("No reservation with id {}", id))?;

    let update = changes.apply_to(current).validate_update(id)?;
    let updated = api.update_reservation(&update).await.map_err(|e| {
        if e.is_conflict() {
            anyhow::Error::from(e)
        } else {
            anyhow::Error::from(e).context("Failed to update reservation")
        }
    })?;

    println!("Reservation updated.");
    print!("{}", display::reservation_table(&[updated]));
    Ok(())
}

async fn delete(api: &ApiClient, ids: &[i64]) -> Result<()> {
    api.session().require_authenticated()?;

    let deletions = ids.iter().map(|&id| async move { (id, api.delete_reservation(id).await) });
    let results = futures::future::join_all(deletions).await;

    let mut first_error = None;
    for (id, result) in results {
        match result {
            Ok(()) => println!("Reservation {} deleted.", id),
            Err(e) => {
                warn!(id, error = %e, "Failed to delete reservation");
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(anyhow::Error::from(e).context("Failed to delete reservation")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reservation() -> Reservation {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        Reservation {
            id: Some(4),
            name: "Lunch".into(),
            description: "2v2 finals".into(),
            start_at: day.and_hms_opt(12, 0, 0).unwrap(),
            end_at: day.and_hms_opt(12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_changes_keep_unspecified_fields() {
        let changes = ReservationChanges {
            name: Some("Evening".into()),
            end_at: Some("2025-03-01T13:00".into()),
            ..Default::default()
        };
        let form = changes.apply_to(&reservation());
        assert_eq!(form.name, "Evening");
        assert_eq!(form.description, "2v2 finals");
        assert_eq!(form.start_at, "2025-03-01T12:00");
        assert_eq!(form.end_at, "2025-03-01T13:00");

        let update = form.validate_update(4).unwrap();
        assert_eq!(update.id, 4);
    }

    #[test]
    fn test_describe_error() {
        let conflict = anyhow::Error::from(ApiError::Conflict("taken".into()));
        assert!(describe_error(&conflict).starts_with("Time slot unavailable"));

        let wrapped = anyhow::Error::from(AuthError::Api(ApiError::Unauthorized));
        assert!(describe_error(&wrapped).contains("slotkeeper login"));

        let guard = anyhow::Error::from(AuthError::NotAuthenticated);
        assert!(describe_error(&guard).starts_with("Not logged in"));

        let other = anyhow::anyhow!("something else");
        assert_eq!(describe_error(&other), "something else");
    }

    #[test]
    fn test_describe_error_sees_through_context() {
        let err = anyhow::Error::from(ApiError::Conflict("taken".into()))
            .context("Failed to create reservation");
        assert!(describe_error(&err).starts_with("Time slot unavailable"));
    }
}
