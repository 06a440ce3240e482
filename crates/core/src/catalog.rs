//! Read-only restaurant catalog: table layout, hours, menu and policy text
//! per restaurant, plus the bookable time slots shared by all of them.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::menu::{MenuCategory, MenuItem};
use crate::errors::ApplicationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGroup {
    pub size: u32,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantProfile {
    pub name: String,
    pub cuisine: String,
    pub hours: String,
    #[serde(default)]
    pub policy: Option<String>,
    pub tables: Vec<TableGroup>,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

impl RestaurantProfile {
    pub fn policy_text(&self) -> &str {
        self.policy.as_deref().unwrap_or("Please contact us for details.")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub restaurants: Vec<RestaurantProfile>,
    #[serde(default = "default_time_slots")]
    pub time_slots: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn new(restaurants: Vec<RestaurantProfile>, time_slots: Vec<String>) -> Self {
        Self { restaurants, time_slots }
    }

    pub fn load(path: &Path) -> Result<Self, ApplicationError> {
        let raw = fs::read_to_string(path).map_err(|error| {
            ApplicationError::Catalog(format!("could not read `{}`: {error}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ApplicationError> {
        let catalog = toml::from_str::<Self>(raw)
            .map_err(|error| ApplicationError::Catalog(format!("could not parse catalog: {error}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.restaurants.is_empty() {
            return Err(ApplicationError::Catalog("catalog has no restaurants".to_string()));
        }

        let mut seen = BTreeSet::new();
        for restaurant in &self.restaurants {
            if !seen.insert(restaurant.name.as_str()) {
                return Err(ApplicationError::Catalog(format!(
                    "restaurant `{}` is listed more than once",
                    restaurant.name
                )));
            }
            if restaurant.tables.iter().any(|group| group.size == 0) {
                return Err(ApplicationError::Catalog(format!(
                    "restaurant `{}` has a table group with size 0",
                    restaurant.name
                )));
            }
            if restaurant.tables.iter().map(|group| group.count).sum::<u32>() == 0 {
                return Err(ApplicationError::Catalog(format!(
                    "restaurant `{}` has no tables",
                    restaurant.name
                )));
            }
        }

        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&RestaurantProfile> {
        self.restaurants.iter().find(|restaurant| restaurant.name == name)
    }

    pub fn menu(&self, name: &str) -> &[MenuItem] {
        self.find(name).map(|restaurant| restaurant.menu.as_slice()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.restaurants.iter().map(|restaurant| restaurant.name.as_str()).collect()
    }

    pub fn builtin() -> Self {
        use MenuCategory::{Dessert, Main, Starter};

        let maison_doree = RestaurantProfile {
            name: "Maison Dorée".to_string(),
            cuisine: "French".to_string(),
            hours: "5:00 PM – 11:00 PM".to_string(),
            policy: Some(
                "48-hour cancellation required. Smart dress code. Groups 6+ require deposit."
                    .to_string(),
            ),
            tables: groups(&[(2, 6), (4, 6), (6, 3), (8, 2)]),
            menu: vec![
                MenuItem::new("Foie Gras Torchon", "Fig compote, brioche", 28, &["GF"], Starter),
                MenuItem::new("Bouillabaisse", "Saffron broth, rouille", 42, &[], Main),
                MenuItem::new("Wagyu Tenderloin", "Truffle jus, pomme purée", 68, &["GF"], Main),
                MenuItem::new("Crème Brûlée", "Vanilla bean, berries", 16, &["V", "GF"], Dessert),
                MenuItem::new("Salade Lyonnaise", "Frisée, lardons, poached egg", 18, &[], Starter),
                MenuItem::new("Tarte Tatin", "Caramelized apple, crème fraîche", 14, &["V"], Dessert),
            ],
        };

        let sakura_garden = RestaurantProfile {
            name: "Sakura Garden".to_string(),
            cuisine: "Japanese".to_string(),
            hours: "5:30 PM – 10:30 PM".to_string(),
            policy: Some("24-hour cancellation. Walk-ins welcome when available.".to_string()),
            tables: groups(&[(2, 4), (4, 5), (6, 2)]),
            menu: vec![
                MenuItem::new("Omakase Sashimi", "12-piece chef selection", 85, &["GF"], Main),
                MenuItem::new("Wagyu Gyoza", "Pan-fried, ponzu dipping", 18, &[], Starter),
                MenuItem::new("Sakura Ramen", "Tonkotsu broth, chashu pork", 24, &[], Main),
                MenuItem::new(
                    "Mochi Ice Cream",
                    "Matcha, mango, sesame",
                    12,
                    &["V", "GF", "DF"],
                    Dessert,
                ),
                MenuItem::new("Agedashi Tofu", "Dashi broth, grated daikon", 14, &["VG", "GF"], Starter),
            ],
        };

        let trattoria_roma = RestaurantProfile {
            name: "Trattoria Roma".to_string(),
            cuisine: "Italian".to_string(),
            hours: "5:00 PM – 10:00 PM".to_string(),
            policy: Some("24-hour cancellation. Groups 6+ require deposit.".to_string()),
            tables: groups(&[(2, 5), (4, 6), (6, 3), (8, 1)]),
            menu: vec![
                MenuItem::new("Burrata Caprese", "Heirloom tomato, balsamic", 19, &["V", "GF"], Starter),
                MenuItem::new("Handmade Tagliatelle", "Wild boar ragù, pecorino", 32, &[], Main),
                MenuItem::new("Branzino al Sale", "Salt-crusted, herb butter", 44, &["GF"], Main),
                MenuItem::new("Tiramisu", "Classic mascarpone, espresso", 14, &["V"], Dessert),
                MenuItem::new(
                    "Risotto ai Funghi",
                    "Mixed wild mushrooms, truffle oil",
                    28,
                    &["V", "GF"],
                    Main,
                ),
            ],
        };

        Self::new(vec![maison_doree, sakura_garden, trattoria_roma], default_time_slots())
    }
}

fn groups(layout: &[(u32, u32)]) -> Vec<TableGroup> {
    layout.iter().map(|&(size, count)| TableGroup { size, count }).collect()
}

pub fn default_time_slots() -> Vec<String> {
    ["6:00 PM", "6:30 PM", "7:00 PM", "7:30 PM", "8:00 PM", "8:30 PM", "9:00 PM", "9:30 PM"]
        .iter()
        .map(|slot| (*slot).to_string())
        .collect()
}
