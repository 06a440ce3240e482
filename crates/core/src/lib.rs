//! Domain core for TableMate: restaurants, tables, reservations, the
//! waitlist, dietary matching and the conversation phase model. Everything
//! here is synchronous and transport-agnostic.

pub mod allocation;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod dietary;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod store;

pub use allocation::{Candidate, TableInventory};
pub use catalog::{Catalog, RestaurantProfile, TableGroup};
pub use dietary::{DietaryMatcher, Restriction};
pub use domain::menu::{MenuCategory, MenuItem};
pub use domain::reservation::{ConfirmationCode, Reservation, ReservationRequest, ReservationStatus};
pub use domain::restaurant::{BookingOutcome, Restaurant, RestaurantStats, RestaurantSummary};
pub use domain::table::{Table, TableId, TableStatus};
pub use domain::waitlist::{WaitEstimator, WaitlistEntry, WaitlistQueue};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{BookingDraft, ConversationState, Phase};
pub use store::RestaurantStore;
