//! Typed turn responses and the fixed chip sets offered with them.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tablemate_core::domain::menu::MenuItem;
use tablemate_core::domain::reservation::Reservation;

pub const WELCOME_CHIPS: &[&str] = &[
    "📅 Book a table",
    "🍴 View menu",
    "⏳ Join waitlist",
    "📋 View my reservations",
    "🥗 Dietary options",
];
pub const DEFAULT_CHIPS: &[&str] =
    &["📅 Book a table", "🍴 View menu", "⏳ Join waitlist", "📋 My reservations"];
pub const SPECIAL_REQUEST_CHIPS: &[&str] = &[
    "No special requests",
    "Window seat 🪟",
    "Birthday 🎂",
    "Anniversary 💑",
    "I have dietary needs 🥗",
];
pub const CHANGE_CHIPS: &[&str] = &["Change date", "Change time", "Change party size", "Start over"];
pub const NO_AVAILABILITY_CHIPS: &[&str] = &["Join waitlist", "Try 7:00 PM", "Try 8:00 PM"];
pub const INFO_CHIPS: &[&str] = &["Book a table", "View menu"];
pub const NO_BOOKINGS_CHIPS: &[&str] = &["Book a table for 2", "Book a table for 4"];
pub const DIETARY_CHIPS: &[&str] = &["Book a table with dietary notes"];

pub const WAITLIST_PARTY_CHIP_LIMIT: u32 = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailField {
    pub label: String,
    pub value: String,
}

impl DetailField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnResponse {
    Chips {
        message: String,
        chips: Vec<String>,
    },
    Text {
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        chips: Vec<String>,
    },
    Menu {
        message: String,
        menu: Vec<MenuItem>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        chips: Vec<String>,
    },
    Success {
        message: String,
        details: Vec<DetailField>,
        /// Notification content; generated only, never sent.
        notification_text: String,
    },
    Confirm {
        message: String,
        details: Vec<DetailField>,
    },
    Reservations {
        message: String,
        reservations: Vec<Reservation>,
    },
    Error {
        message: String,
    },
}

impl TurnResponse {
    pub fn chips(message: impl Into<String>, chips: Vec<String>) -> Self {
        Self::Chips { message: message.into(), chips }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::Text { message: message.into(), chips: Vec::new() }
    }

    pub fn text_with_chips(message: impl Into<String>, chips: Vec<String>) -> Self {
        Self::Text { message: message.into(), chips }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chips { .. } => "chips",
            Self::Text { .. } => "text",
            Self::Menu { .. } => "menu",
            Self::Success { .. } => "success",
            Self::Confirm { .. } => "confirm",
            Self::Reservations { .. } => "reservations",
            Self::Error { .. } => "error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Chips { message, .. }
            | Self::Text { message, .. }
            | Self::Menu { message, .. }
            | Self::Success { message, .. }
            | Self::Confirm { message, .. }
            | Self::Reservations { message, .. }
            | Self::Error { message } => message,
        }
    }

    pub fn chip_labels(&self) -> &[String] {
        match self {
            Self::Chips { chips, .. } | Self::Text { chips, .. } | Self::Menu { chips, .. } => {
                chips
            }
            _ => &[],
        }
    }

    pub fn detail(&self, label: &str) -> Option<&str> {
        let details = match self {
            Self::Success { details, .. } | Self::Confirm { details, .. } => details,
            _ => return None,
        };
        details.iter().find(|field| field.label == label).map(|field| field.value.as_str())
    }
}

pub fn to_chips(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| (*label).to_owned()).collect()
}

pub fn party_chips(max: u32) -> Vec<String> {
    (1..=max).map(|size| size.to_string()).collect()
}

/// "Tonight" plus the next five days, e.g. `Sat, Mar 14`.
pub fn date_chips(today: NaiveDate) -> Vec<String> {
    std::iter::once("Tonight".to_owned())
        .chain((1..=5).map(|offset| (today + Duration::days(offset)).format("%a, %b %d").to_string()))
        .collect()
}

pub fn booking_notification(reservation: &Reservation) -> String {
    format!(
        "TableMate: Reservation confirmed! {} — {} on {} at {} for {}. See you soon!",
        reservation.confirmation_code,
        reservation.restaurant,
        reservation.date,
        reservation.time,
        reservation.party_size
    )
}

pub fn waitlist_notification(position: usize, restaurant: &str, estimated_wait: &str) -> String {
    format!("TableMate: You're #{position} on the waitlist at {restaurant}. Est. wait: {estimated_wait}")
}
