//! Favorites
//!
//! The user's favorite cities and cryptocurrencies. Both lists behave as
//! sets: toggling an item adds it when absent and removes it when
//! present. Insertion order is kept for display.

use serde::{Deserialize, Serialize};

/// Favorite cities and cryptocurrencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesSet {
    /// City names.
    #[serde(default)]
    pub cities: Vec<String>,
    /// Asset ids.
    #[serde(default)]
    pub cryptocurrencies: Vec<String>,
}

impl FavoritesSet {
    /// Toggle a city. Returns `true` if it is now a favorite.
    pub fn toggle_city(&mut self, city: &str) -> bool {
        toggle(&mut self.cities, city)
    }

    /// Toggle a cryptocurrency. Returns `true` if it is now a favorite.
    pub fn toggle_cryptocurrency(&mut self, id: &str) -> bool {
        toggle(&mut self.cryptocurrencies, id)
    }

    /// Whether `city` is a favorite.
    #[must_use]
    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn contains_cryptocurrency(&self, id: &str) -> bool {
        self.cryptocurrencies.iter().any(|c| c == id)
    }

    /// Whether both lists are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty() && self.cryptocurrencies.is_empty()
    }

    /// Remove duplicate entries, keeping first occurrences.
    #[must_use]
    pub fn deduplicated(mut self) -> Self {
        dedup_in_order(&mut self.cities);
        dedup_in_order(&mut self.cryptocurrencies);
        self
    }
}

fn toggle(items: &mut Vec<String>, item: &str) -> bool {
    if let Some(index) = items.iter().position(|existing| existing == item) {
        items.remove(index);
        false
    } else {
        items.push(item.to_string());
        true
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
