use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::reservation::ConfirmationCode;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub String);

/// Recorded on a reservation whose draft never had a table offered.
pub const PLACEHOLDER_TABLE: &str = "TBD";

impl TableId {
    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_TABLE.to_owned())
    }

    /// Ids are `T1..Tn`, numbered from one in inventory order.
    pub fn numbered(index: usize) -> Self {
        Self(format!("T{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TableId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Reserved,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
        }
    }
}

/// A physical table. Status only changes through booking completion and
/// cancellation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub size: u32,
    pub status: TableStatus,
    pub reservation: Option<ConfirmationCode>,
}

impl Table {
    pub fn new(id: TableId, size: u32) -> Self {
        Self { id, size, status: TableStatus::Available, reservation: None }
    }

    pub fn is_available(&self) -> bool {
        self.status == TableStatus::Available
    }
}
