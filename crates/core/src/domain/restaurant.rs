use std::collections::BTreeMap;

use serde::Serialize;

use crate::allocation::TableInventory;
use crate::catalog::{RestaurantProfile, TableGroup};
use crate::domain::reservation::{ConfirmationCode, Reservation, ReservationRequest};
use crate::domain::table::TableId;
use crate::domain::waitlist::{WaitEstimator, WaitlistQueue};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RestaurantSummary {
    pub name: String,
    pub cuisine: String,
    pub hours: String,
    pub total_tables: usize,
    pub available_tables: usize,
    pub occupancy_pct: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RestaurantStats {
    pub total_tables: usize,
    pub reserved: usize,
    pub available: usize,
    pub occupancy_pct: u32,
    pub waitlist_count: usize,
    pub total_reservations: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed(Reservation),
    NoAvailability,
}

/// Live state for one restaurant. Capacity is fixed at construction.
#[derive(Debug)]
pub struct Restaurant {
    pub name: String,
    pub cuisine: String,
    pub hours: String,
    pub capacity: Vec<TableGroup>,
    pub tables: TableInventory,
    pub reservations: BTreeMap<ConfirmationCode, Reservation>,
    pub waitlist: WaitlistQueue,
}

impl Restaurant {
    pub fn new(profile: &RestaurantProfile, estimator: WaitEstimator) -> Self {
        Self {
            name: profile.name.clone(),
            cuisine: profile.cuisine.clone(),
            hours: profile.hours.clone(),
            capacity: profile.tables.clone(),
            tables: TableInventory::from_groups(profile.name.clone(), &profile.tables),
            reservations: BTreeMap::new(),
            waitlist: WaitlistQueue::new(estimator),
        }
    }

    /// Records the reservation and claims its table. A table id that is not
    /// part of this restaurant (the draft placeholder) is kept on the record
    /// without claiming anything. If the requested table was taken since it
    /// was offered, the current best fit is claimed instead.
    pub fn confirm_booking(
        &mut self,
        mut request: ReservationRequest,
    ) -> Result<BookingOutcome, DomainError> {
        let claims_table = self.tables.contains(&request.table_id);
        if claims_table && !self.table_is_free(&request.table_id) {
            match self.tables.best_fit(request.party_size, &request.date, &request.time) {
                Some(candidate) => request.table_id = candidate.table_id,
                None => return Ok(BookingOutcome::NoAvailability),
            }
        }

        let reservation = Reservation::create(request)?;
        if claims_table {
            self.tables.reserve(&reservation.table_id, &reservation.confirmation_code)?;
        }
        self.reservations.insert(reservation.confirmation_code.clone(), reservation.clone());
        Ok(BookingOutcome::Confirmed(reservation))
    }

    /// Marks the stored reservation cancelled, frees its table and drops the
    /// record. Unknown codes return `Ok(None)`.
    pub fn cancel_reservation(
        &mut self,
        code: &ConfirmationCode,
    ) -> Result<Option<Reservation>, DomainError> {
        let Some(reservation) = self.reservations.get_mut(code) else {
            return Ok(None);
        };
        reservation.cancel()?;
        let table_id = reservation.table_id.clone();
        if self.tables.contains(&table_id) {
            self.tables.release(&table_id)?;
        }
        Ok(self.reservations.remove(code))
    }

    pub fn summary(&self) -> RestaurantSummary {
        let total = self.tables.len();
        let available = self.tables.available_count();
        let occupancy_pct = if total == 0 {
            0
        } else {
            ((1.0 - available as f64 / total as f64) * 100.0).round() as u32
        };

        RestaurantSummary {
            name: self.name.clone(),
            cuisine: self.cuisine.clone(),
            hours: self.hours.clone(),
            total_tables: total,
            available_tables: available,
            occupancy_pct,
        }
    }

    pub fn stats(&self) -> RestaurantStats {
        let total = self.tables.len();
        let reserved = self.tables.reserved_count();
        let occupancy_pct =
            if total == 0 { 0 } else { (reserved as f64 / total as f64 * 100.0).round() as u32 };

        RestaurantStats {
            total_tables: total,
            reserved,
            available: total - reserved,
            occupancy_pct,
            waitlist_count: self.waitlist.size(),
            total_reservations: self.reservations.len(),
        }
    }

    fn table_is_free(&self, table_id: &TableId) -> bool {
        self.tables.get(table_id).map(|table| table.is_available()).unwrap_or(false)
    }
}
