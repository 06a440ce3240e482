use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::table::TableId;
use crate::errors::DomainError;

pub const CONFIRMATION_PREFIX: &str = "TM";
pub const CONFIRMATION_SUFFIX_LEN: usize = 5;

/// Practically unique, not deduplicated against existing codes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationCode(pub String);

impl ConfirmationCode {
    pub fn generate() -> Self {
        let entropy = Uuid::new_v4().simple().to_string();
        let suffix = entropy[..CONFIRMATION_SUFFIX_LEN].to_ascii_uppercase();
        Self(format!("{CONFIRMATION_PREFIX}{suffix}"))
    }

    /// Accepts only the exact `TM` + five uppercase alphanumerics shape.
    pub fn parse(value: &str) -> Option<Self> {
        let suffix = value.strip_prefix(CONFIRMATION_PREFIX)?;
        let well_formed = suffix.len() == CONFIRMATION_SUFFIX_LEN
            && suffix.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit());
        well_formed.then(|| Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationRequest {
    pub name: String,
    pub party_size: u32,
    pub date: String,
    pub time: String,
    pub restaurant: String,
    pub table_id: TableId,
    pub special: Option<String>,
    pub dietary: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub confirmation_code: ConfirmationCode,
    pub name: String,
    pub party_size: u32,
    pub date: String,
    pub time: String,
    pub restaurant: String,
    pub table_id: TableId,
    pub special: String,
    pub dietary: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn create(request: ReservationRequest) -> Result<Self, DomainError> {
        if request.party_size == 0 {
            return Err(DomainError::InvalidPartySize(request.party_size));
        }

        Ok(Self {
            confirmation_code: ConfirmationCode::generate(),
            name: request.name,
            party_size: request.party_size,
            date: request.date,
            time: request.time,
            restaurant: request.restaurant,
            table_id: request.table_id,
            special: request.special.unwrap_or_default(),
            dietary: request.dietary.unwrap_or_default(),
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
        })
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        match self.status {
            ReservationStatus::Confirmed => {
                self.status = ReservationStatus::Cancelled;
                Ok(())
            }
            ReservationStatus::Cancelled => Err(DomainError::InvariantViolation(format!(
                "reservation {} is already cancelled",
                self.confirmation_code
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::table::TableId;
    use crate::errors::DomainError;

    use super::{ConfirmationCode, Reservation, ReservationRequest, ReservationStatus};

    fn request() -> ReservationRequest {
        ReservationRequest {
            name: "Jane".to_owned(),
            party_size: 4,
            date: "Tomorrow".to_owned(),
            time: "8:00 PM".to_owned(),
            restaurant: "Test Rest".to_owned(),
            table_id: TableId::from("T2"),
            special: Some("Window seat".to_owned()),
            dietary: None,
        }
    }

    #[test]
    fn confirmation_codes_have_prefix_and_fixed_length() {
        for _ in 0..64 {
            let code = ConfirmationCode::generate();
            assert!(code.as_str().starts_with("TM"));
            assert_eq!(code.as_str().len(), 7);
            assert!(ConfirmationCode::parse(code.as_str()).is_some(), "{code} should parse");
        }
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        assert!(ConfirmationCode::parse("TM4F9A2").is_some());
        assert!(ConfirmationCode::parse("TM-4F9A").is_none());
        assert!(ConfirmationCode::parse("TM4f9a2").is_none());
        assert!(ConfirmationCode::parse("XX4F9A2").is_none());
        assert!(ConfirmationCode::parse("TM4F9A22").is_none());
    }

    #[test]
    fn new_reservation_is_confirmed_and_serializes_all_fields() {
        let reservation = Reservation::create(request()).expect("valid reservation");
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.dietary, "");

        let value = serde_json::to_value(&reservation).expect("serializable");
        assert_eq!(value["name"], "Jane");
        assert_eq!(value["party_size"], 4);
        assert_eq!(value["special"], "Window seat");
        assert_eq!(value["status"], "confirmed");
        assert_eq!(value["table_id"], "T2");
        let created_at = value["created_at"].as_str().unwrap_or_default();
        assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    }

    #[test]
    fn zero_party_size_is_rejected() {
        let error = Reservation::create(ReservationRequest { party_size: 0, ..request() })
            .expect_err("empty party");
        assert_eq!(error, DomainError::InvalidPartySize(0));
    }

    #[test]
    fn cancelling_twice_is_an_invariant_violation() {
        let mut reservation = Reservation::create(request()).expect("valid reservation");
        reservation.cancel().expect("first cancel");
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert!(matches!(reservation.cancel(), Err(DomainError::InvariantViolation(_))));
    }
}
