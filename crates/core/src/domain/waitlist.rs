use std::collections::BTreeMap;

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MINUTES_PER_PARTY: u32 = 15;
pub const DEFAULT_BASE_WAIT_MINUTES: u32 = 10;

const LARGE_PARTY_THRESHOLD: u32 = 4;
const LARGE_PARTY_FACTOR: f64 = 1.5;
const PEAK_FACTOR: f64 = 1.3;
const PEAK_HOURS: std::ops::RangeInclusive<u32> = 18..=20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: u64,
    pub name: String,
    pub party_size: u32,
    pub joined_at: DateTime<Utc>,
    /// Fixed at insertion, never recomputed.
    pub estimated_wait: String,
    pub estimated_wait_minutes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitEstimator {
    pub minutes_per_party: u32,
    pub base_minutes: u32,
}

impl Default for WaitEstimator {
    fn default() -> Self {
        Self { minutes_per_party: DEFAULT_MINUTES_PER_PARTY, base_minutes: DEFAULT_BASE_WAIT_MINUTES }
    }
}

impl WaitEstimator {
    pub fn estimate_minutes(&self, parties_ahead: usize, party_size: u32, hour: u32) -> u32 {
        let base = (parties_ahead as f64) * f64::from(self.minutes_per_party);
        let size_factor =
            if party_size > LARGE_PARTY_THRESHOLD { LARGE_PARTY_FACTOR } else { 1.0 };
        let peak_factor = if PEAK_HOURS.contains(&hour) { PEAK_FACTOR } else { 1.0 };
        (base * size_factor * peak_factor) as u32 + self.base_minutes
    }
}

/// Waiting parties keyed by `(party_size, sequence)`: smaller parties first,
/// then arrival order. The composite key keeps FIFO within a size no matter
/// how many parties share it.
#[derive(Clone, Debug, Default)]
pub struct WaitlistQueue {
    entries: BTreeMap<(u32, u64), WaitlistEntry>,
    next_sequence: u64,
    estimator: WaitEstimator,
}

impl WaitlistQueue {
    pub fn new(estimator: WaitEstimator) -> Self {
        Self { entries: BTreeMap::new(), next_sequence: 0, estimator }
    }

    pub fn add(&mut self, name: impl Into<String>, party_size: u32) -> WaitlistEntry {
        self.add_at(name, party_size, Local::now())
    }

    pub fn add_at(
        &mut self,
        name: impl Into<String>,
        party_size: u32,
        now: DateTime<Local>,
    ) -> WaitlistEntry {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let minutes = self.estimator.estimate_minutes(self.entries.len(), party_size, now.hour());
        let entry = WaitlistEntry {
            id: sequence,
            name: name.into(),
            party_size,
            joined_at: now.with_timezone(&Utc),
            estimated_wait: format!("~{minutes} minutes"),
            estimated_wait_minutes: minutes,
        };
        self.entries.insert((party_size, sequence), entry.clone());
        entry
    }

    pub fn get_next(&mut self) -> Option<WaitlistEntry> {
        self.entries.pop_first().map(|(_, entry)| entry)
    }

    pub fn get_all(&self) -> Vec<WaitlistEntry> {
        self.entries.values().cloned().collect()
    }

    /// One-based place in service order.
    pub fn position_of(&self, entry_id: u64) -> Option<usize> {
        self.entries.values().position(|entry| entry.id == entry_id).map(|index| index + 1)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
