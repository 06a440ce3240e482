use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuCategory {
    Starter,
    Main,
    Dessert,
    Drink,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(rename = "desc", alias = "description")]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: MenuCategory,
}

impl MenuItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: i64,
        tags: &[&str],
        category: MenuCategory,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price: Decimal::from(price),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            category,
        }
    }

    pub fn has_any_tag(&self, wanted: &[&str]) -> bool {
        self.tags.iter().any(|tag| wanted.contains(&tag.as_str()))
    }
}
