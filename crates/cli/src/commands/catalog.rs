use serde::Serialize;
use tablemate_core::catalog::Catalog;
use tablemate_core::config::{AppConfig, LoadOptions};
use tablemate_core::dietary::{DietaryMatcher, Restriction};
use tablemate_core::domain::menu::MenuItem;

use crate::commands::{load_catalog, CommandResult, EXIT_CATALOG, EXIT_CONFIG, EXIT_NOT_FOUND};

#[derive(Debug, Serialize)]
struct RestaurantListing<'a> {
    name: &'a str,
    cuisine: &'a str,
    hours: &'a str,
    policy: &'a str,
    tables: u32,
    seats: u32,
    dishes: usize,
}

#[derive(Debug, Serialize)]
struct MenuListing<'a> {
    restaurant: &'a str,
    restrictions: Vec<Restriction>,
    items: Vec<MenuItem>,
}

pub fn run(restaurant: Option<&str>, dietary: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("catalog", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };
    let catalog = match load_catalog(&config) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("catalog", "catalog_load", error.to_string(), EXIT_CATALOG)
        }
    };

    describe(&catalog, restaurant, dietary)
}

/// Lists every restaurant, or one restaurant's menu filtered by the comma
/// separated `dietary` names.
pub fn describe(catalog: &Catalog, restaurant: Option<&str>, dietary: Option<&str>) -> CommandResult {
    let Some(name) = restaurant else {
        let listings = catalog
            .restaurants
            .iter()
            .map(|profile| RestaurantListing {
                name: &profile.name,
                cuisine: &profile.cuisine,
                hours: &profile.hours,
                policy: profile.policy_text(),
                tables: profile.tables.iter().map(|group| group.count).sum(),
                seats: profile.tables.iter().map(|group| group.size * group.count).sum(),
                dishes: profile.menu.len(),
            })
            .collect::<Vec<_>>();
        return to_output(&listings);
    };

    let Some(profile) = catalog.find(name) else {
        return CommandResult::failure(
            "catalog",
            "not_found",
            format!("unknown restaurant `{name}` (known: {})", catalog.names().join(", ")),
            EXIT_NOT_FOUND,
        );
    };

    let mut restrictions = Vec::new();
    for raw in dietary.unwrap_or_default().split(',').filter(|raw| !raw.trim().is_empty()) {
        match raw.parse::<Restriction>() {
            Ok(restriction) => restrictions.push(restriction),
            Err(message) => {
                return CommandResult::failure("catalog", "invalid_argument", message, 1)
            }
        }
    }

    to_output(&MenuListing {
        restaurant: &profile.name,
        items: DietaryMatcher::filter_menu(&profile.menu, &restrictions),
        restrictions,
    })
}

fn to_output(payload: &impl Serialize) -> CommandResult {
    match serde_json::to_string_pretty(payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("catalog", "serialization", error.to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use tablemate_core::catalog::Catalog;

    use super::describe;

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).expect("json output")
    }

    #[test]
    fn lists_restaurants_with_capacity() {
        let result = describe(&Catalog::builtin(), None, None);
        assert_eq!(result.exit_code, 0);

        let listings = parse(&result.output);
        assert_eq!(listings[0]["name"], "Maison Dorée");
        assert_eq!(listings[0]["tables"], 17);
        assert_eq!(listings[0]["seats"], 70);
        assert_eq!(listings[2]["dishes"], 5);
    }

    #[test]
    fn filters_one_menu_by_restriction() {
        let result = describe(&Catalog::builtin(), Some("Trattoria Roma"), Some("gluten_free"));
        let listing = parse(&result.output);

        assert_eq!(listing["restrictions"][0], "gluten_free");
        assert_eq!(listing["items"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn rejects_unknown_names() {
        let result = describe(&Catalog::builtin(), Some("Nowhere"), None);
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse(&result.output)["error_class"], "not_found");

        let result = describe(&Catalog::builtin(), Some("Sakura Garden"), Some("paleo"));
        assert_eq!(parse(&result.output)["error_class"], "invalid_argument");
    }
}
