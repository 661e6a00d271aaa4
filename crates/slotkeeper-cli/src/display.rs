//! Plain-text rendering of reservations.

use slotkeeper_core::models::Reservation;
use slotkeeper_core::utils::{format_datetime, truncate_string};

const NAME_WIDTH: usize = 20;
const DESCRIPTION_WIDTH: usize = 30;
const TIME_WIDTH: usize = 22;

pub const EMPTY_MESSAGE: &str = "No reservations found. Make your first one!";

/// Render reservations as a fixed-width table, earliest first.
pub fn reservation_table(reservations: &[Reservation]) -> String {
    if reservations.is_empty() {
        return format!("{}\n", EMPTY_MESSAGE);
    }

    let mut sorted: Vec<&Reservation> = reservations.iter().collect();
    sorted.sort_by_key(|r| r.start_at);

    let mut out = format!(
        "{:>5}  {:<nw$}  {:<dw$}  {:<tw$}  {:<tw$}\n",
        "ID",
        "NAME",
        "DESCRIPTION",
        "START",
        "END",
        nw = NAME_WIDTH,
        dw = DESCRIPTION_WIDTH,
        tw = TIME_WIDTH,
    );
    for r in sorted {
        let id = r.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
        out.push_str(&format!(
            "{:>5}  {:<nw$}  {:<dw$}  {:<tw$}  {:<tw$}\n",
            id,
            truncate_string(&r.name, NAME_WIDTH),
            truncate_string(&r.description, DESCRIPTION_WIDTH),
            format_datetime(&r.start_at),
            format_datetime(&r.end_at),
            nw = NAME_WIDTH,
            dw = DESCRIPTION_WIDTH,
            tw = TIME_WIDTH,
        ));
    }
    out
}
