//! Owned, process-lifetime state for every restaurant in the catalog.
//!
//! Each restaurant sits behind its own mutex; table reservation and release
//! happen while holding it. No operation holds two restaurant locks at once.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::catalog::{Catalog, RestaurantProfile};
use crate::dietary::{DietaryMatcher, Restriction};
use crate::domain::menu::MenuItem;
use crate::domain::reservation::{ConfirmationCode, Reservation};
use crate::domain::restaurant::{Restaurant, RestaurantStats, RestaurantSummary};
use crate::domain::table::Table;
use crate::domain::waitlist::{WaitEstimator, WaitlistEntry};
use crate::errors::DomainError;

pub struct RestaurantStore {
    catalog: Catalog,
    restaurants: Vec<(String, Mutex<Restaurant>)>,
}

impl RestaurantStore {
    pub fn from_catalog(catalog: Catalog, estimator: WaitEstimator) -> Self {
        let restaurants = catalog
            .restaurants
            .iter()
            .map(|profile| (profile.name.clone(), Mutex::new(Restaurant::new(profile, estimator))))
            .collect();
        Self { catalog, restaurants }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn contains(&self, name: &str) -> bool {
        self.restaurants.iter().any(|(restaurant, _)| restaurant == name)
    }

    pub fn profile(&self, name: &str) -> Result<&RestaurantProfile, DomainError> {
        self.catalog.find(name).ok_or_else(|| DomainError::UnknownRestaurant(name.to_owned()))
    }

    /// Runs `f` with exclusive access to one restaurant.
    pub fn with_restaurant<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Restaurant) -> T,
    ) -> Result<T, DomainError> {
        let slot = self
            .restaurants
            .iter()
            .find(|(restaurant, _)| restaurant == name)
            .map(|(_, slot)| slot)
            .ok_or_else(|| DomainError::UnknownRestaurant(name.to_owned()))?;
        let mut guard = lock(slot);
        Ok(f(&mut guard))
    }

    /// Looks the code up in every restaurant, frees its table and drops the
    /// stored record. Unknown codes return `Ok(None)`.
    pub fn cancel_reservation(
        &self,
        code: &ConfirmationCode,
    ) -> Result<Option<Reservation>, DomainError> {
        for (_, slot) in &self.restaurants {
            if let Some(reservation) = lock(slot).cancel_reservation(code)? {
                return Ok(Some(reservation));
            }
        }
        Ok(None)
    }

    pub fn summaries(&self) -> Vec<RestaurantSummary> {
        self.restaurants.iter().map(|(_, slot)| lock(slot).summary()).collect()
    }

    pub fn stats(&self) -> BTreeMap<String, RestaurantStats> {
        self.restaurants.iter().map(|(name, slot)| (name.clone(), lock(slot).stats())).collect()
    }

    pub fn tables(&self, name: &str) -> Result<Vec<Table>, DomainError> {
        self.with_restaurant(name, |restaurant| restaurant.tables.tables().to_vec())
    }

    pub fn waitlist(&self, name: &str) -> Result<Vec<WaitlistEntry>, DomainError> {
        self.with_restaurant(name, |restaurant| restaurant.waitlist.get_all())
    }

    pub fn serve_next(&self, name: &str) -> Result<Option<WaitlistEntry>, DomainError> {
        self.with_restaurant(name, |restaurant| restaurant.waitlist.get_next())
    }

    pub fn menu(
        &self,
        name: &str,
        restrictions: &[Restriction],
    ) -> Result<Vec<MenuItem>, DomainError> {
        let profile = self.profile(name)?;
        Ok(DietaryMatcher::filter_menu(&profile.menu, restrictions))
    }
}

fn lock(slot: &Mutex<Restaurant>) -> MutexGuard<'_, Restaurant> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;
    use crate::dietary::Restriction;
    use crate::domain::reservation::{ConfirmationCode, ReservationRequest};
    use crate::domain::restaurant::BookingOutcome;
    use crate::domain::table::{TableId, TableStatus};
    use crate::domain::waitlist::WaitEstimator;
    use crate::errors::DomainError;

    use super::RestaurantStore;

    fn store() -> RestaurantStore {
        RestaurantStore::from_catalog(Catalog::builtin(), WaitEstimator::default())
    }

    fn book(store: &RestaurantStore, restaurant: &str, table: &str) -> ConfirmationCode {
        let request = ReservationRequest {
            name: "Alice".to_owned(),
            party_size: 2,
            date: "Tonight".to_owned(),
            time: "7:00 PM".to_owned(),
            restaurant: restaurant.to_owned(),
            table_id: TableId::from(table),
            ..ReservationRequest::default()
        };
        match store.with_restaurant(restaurant, |r| r.confirm_booking(request)) {
            Ok(Ok(BookingOutcome::Confirmed(reservation))) => reservation.confirmation_code,
            other => panic!("booking failed: {other:?}"),
        }
    }

    #[test]
    fn unknown_restaurant_is_reported() {
        let error = store().tables("Nowhere").expect_err("unknown restaurant");
        assert_eq!(error, DomainError::UnknownRestaurant("Nowhere".to_owned()));
    }

    #[test]
    fn cancel_finds_the_reservation_in_any_restaurant() {
        let store = store();
        let code = book(&store, "Trattoria Roma", "T3");

        let cancelled =
            store.cancel_reservation(&code).expect("cancel succeeds").expect("known code");
        assert_eq!(cancelled.restaurant, "Trattoria Roma");

        let tables = store.tables("Trattoria Roma").expect("tables");
        let table = tables.iter().find(|table| table.id == TableId::from("T3")).expect("T3");
        assert_eq!(table.status, TableStatus::Available);
        assert_eq!(store.cancel_reservation(&code), Ok(None));
    }

    #[test]
    fn stats_are_keyed_by_restaurant() {
        let store = store();
        book(&store, "Sakura Garden", "T1");
        store.with_restaurant("Sakura Garden", |r| r.waitlist.add("Bob", 3)).expect("waitlist");

        let stats = store.stats();
        assert_eq!(stats.len(), 3);
        let sakura = &stats["Sakura Garden"];
        assert_eq!(sakura.total_tables, 11);
        assert_eq!(sakura.reserved, 1);
        assert_eq!(sakura.waitlist_count, 1);
        assert_eq!(stats["Maison Dorée"].reserved, 0);

        let summaries = store.summaries();
        assert_eq!(summaries[1].name, "Sakura Garden");
        assert_eq!(summaries[1].available_tables, 10);
    }

    #[test]
    fn serve_next_pops_the_smallest_party() {
        let store = store();
        store
            .with_restaurant("Maison Dorée", |r| {
                r.waitlist.add("Large", 6);
                r.waitlist.add("Small", 2);
            })
            .expect("waitlist");

        let served = store.serve_next("Maison Dorée").expect("restaurant").expect("entry");
        assert_eq!(served.name, "Small");
        assert_eq!(store.waitlist("Maison Dorée").expect("waitlist").len(), 1);
    }

    #[test]
    fn menu_lookup_applies_restrictions() {
        let store = store();
        let all = store.menu("Sakura Garden", &[]).expect("menu");
        let vegan = store.menu("Sakura Garden", &[Restriction::Vegan]).expect("menu");
        assert_eq!(all.len(), 5);
        assert!(vegan.len() < all.len());
        assert!(vegan.iter().all(|item| item.has_any_tag(&["V", "VG"])));
    }
}
