use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::menu::MenuItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    Vegan,
    Vegetarian,
    GlutenFree,
    NutFree,
    DairyFree,
    Halal,
    Kosher,
}

impl Restriction {
    /// Catalog order; detection results follow it.
    pub const ALL: [Restriction; 7] = [
        Restriction::Vegan,
        Restriction::Vegetarian,
        Restriction::GlutenFree,
        Restriction::NutFree,
        Restriction::DairyFree,
        Restriction::Halal,
        Restriction::Kosher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vegan => "vegan",
            Self::Vegetarian => "vegetarian",
            Self::GlutenFree => "gluten_free",
            Self::NutFree => "nut_free",
            Self::DairyFree => "dairy_free",
            Self::Halal => "halal",
            Self::Kosher => "kosher",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Vegan => "Vegan",
            Self::Vegetarian => "Vegetarian",
            Self::GlutenFree => "Gluten Free",
            Self::NutFree => "Nut Free",
            Self::DairyFree => "Dairy Free",
            Self::Halal => "Halal",
            Self::Kosher => "Kosher",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Vegan => &["vegan", "plant-based", "plant based"],
            Self::Vegetarian => &["vegetarian", "veggie", "no meat"],
            Self::GlutenFree => &["gluten", "celiac", "coeliac", "gluten-free"],
            Self::NutFree => &["nut", "peanut", "almond", "cashew", "nut allergy"],
            Self::DairyFree => &["dairy", "lactose", "milk", "cheese allergy"],
            Self::Halal => &["halal"],
            Self::Kosher => &["kosher"],
        }
    }

    /// Menu tags that satisfy this restriction.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Self::Vegan => &["V", "VG"],
            Self::Vegetarian => &["V", "VG", "Ve"],
            Self::GlutenFree => &["GF"],
            Self::NutFree => &["NF"],
            Self::DairyFree => &["DF"],
            Self::Halal => &["H"],
            Self::Kosher => &["K"],
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Restriction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|restriction| restriction.as_str() == normalized)
            .ok_or_else(|| format!("unknown dietary restriction `{value}`"))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DietaryMatcher;

impl DietaryMatcher {
    /// Every restriction with a keyword occurring anywhere in `text`.
    pub fn detect(text: &str) -> Vec<Restriction> {
        let lowered = text.to_lowercase();
        Restriction::ALL
            .into_iter()
            .filter(|restriction| {
                restriction.keywords().iter().any(|keyword| lowered.contains(keyword))
            })
            .collect()
    }

    /// Items carrying a tag of any requested restriction. No restrictions
    /// means no filtering.
    pub fn filter_menu(items: &[MenuItem], restrictions: &[Restriction]) -> Vec<MenuItem> {
        if restrictions.is_empty() {
            return items.to_vec();
        }

        let wanted =
            restrictions.iter().flat_map(|restriction| restriction.tags()).copied().collect::<Vec<_>>();
        items.iter().filter(|item| item.has_any_tag(&wanted)).cloned().collect()
    }

    pub fn join_labels(restrictions: &[Restriction], separator: &str) -> String {
        restrictions.iter().map(Restriction::label).collect::<Vec<_>>().join(separator)
    }
}
