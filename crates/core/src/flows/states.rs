use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::table::TableId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Greeting,
    Idle,
    BookingName,
    BookingParty,
    BookingDate,
    BookingTime,
    BookingSpecial,
    BookingConfirm,
    WaitlistName,
    WaitlistParty,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Idle => "idle",
            Self::BookingName => "booking_name",
            Self::BookingParty => "booking_party",
            Self::BookingDate => "booking_date",
            Self::BookingTime => "booking_time",
            Self::BookingSpecial => "booking_special",
            Self::BookingConfirm => "booking_confirm",
            Self::WaitlistName => "waitlist_name",
            Self::WaitlistParty => "waitlist_party",
        }
    }

    pub fn is_booking(&self) -> bool {
        matches!(
            self,
            Self::BookingName
                | Self::BookingParty
                | Self::BookingDate
                | Self::BookingTime
                | Self::BookingSpecial
                | Self::BookingConfirm
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Name,
    PartySize,
    Date,
    Time,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::PartySize => "party_size",
            Self::Date => "date",
            Self::Time => "time",
        }
    }
}

/// Slots collected so far for the booking or waitlist dialog in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<TableId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
}

impl BookingDraft {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn has(&self, field: DraftField) -> bool {
        match field {
            DraftField::Name => self.name.is_some(),
            DraftField::PartySize => self.party_size.is_some(),
            DraftField::Date => self.date.is_some(),
            DraftField::Time => self.time.is_some(),
        }
    }

    pub fn missing(&self, fields: &[DraftField]) -> Vec<DraftField> {
        fields.iter().copied().filter(|field| !self.has(*field)).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub phase: Phase,
    pub draft: BookingDraft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowEvent {
    Reset,
    InfoServed,
    WaitlistRequested,
    WaitlistNameCollected,
    WaitlistJoined,
    BookingStarted,
    NameCollected { party_known: bool },
    PartySizeCollected,
    PartyTooLarge,
    DateCollected,
    TableFound,
    NoAvailability,
    SpecialCollected,
    BookingConfirmed,
    ChangeRequested,
    SlotMissing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftAction {
    Keep,
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: Phase,
    pub to: Phase,
    pub event: FlowEvent,
    pub draft: DraftAction,
}
