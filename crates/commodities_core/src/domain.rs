//! crates/commodities_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry serde derives only so they can cross the wire and the
//! client-side storage boundary unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Products with fewer units than this count toward `low_stock_items`.
pub const LOW_STOCK_THRESHOLD: u64 = 5;

/// A flat, non-hierarchical authorization tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Manager,
    StoreKeeper,
}

impl Role {
    /// The wire name, e.g. `STORE_KEEPER`.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::StoreKeeper => "STORE_KEEPER",
        }
    }

    /// Human-readable form shown next to the signed-in user.
    pub fn label(self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::StoreKeeper => "STORE KEEPER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANAGER" => Ok(Role::Manager),
            "STORE_KEEPER" => Ok(Role::StoreKeeper),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The signed-in user. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// A bearer token together with the user it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// A single catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock: u64,
    pub category: String,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        stock: u64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            category: category.into(),
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_THRESHOLD
    }
}

/// Case-insensitive match on name or category. A blank term keeps every row;
/// otherwise the term is matched as typed, surrounding spaces included.
pub fn search_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    if term.trim().is_empty() {
        return products.iter().collect();
    }
    let term = term.to_lowercase();
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&term) || p.category.to_lowercase().contains(&term)
        })
        .collect()
}

/// Aggregate catalog figures. Derived on every request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub low_stock_items: usize,
    pub total_categories: usize,
}

impl DashboardStats {
    pub fn compute(products: &[Product]) -> Self {
        let categories: HashSet<&str> = products.iter().map(|p| p.category.as_str()).collect();
        Self {
            total_products: products.len(),
            low_stock_items: products.iter().filter(|p| p.is_low_stock()).count(),
            total_categories: categories.len(),
        }
    }
}

/// Colour scheme preference kept next to the session in client storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Parses a stored value. Anything other than `light` or `dark` is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}
