//! crates/commodities_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of where sessions and products are actually kept.

use crate::domain::Product;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable client-side string storage, shaped like a browser's `localStorage`.
///
/// Writes take `&self`: implementations are handles onto storage that outlives them.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> PortResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove_item(&self, key: &str) -> PortResult<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        (**self).remove_item(key)
    }
}

/// The product collection behind the resolver. Rows are never deleted.
pub trait ProductRepository: Send {
    /// Every row, in insertion order.
    fn all(&self) -> Vec<Product>;

    fn find(&self, id: &str) -> Option<Product>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a new row.
    fn push(&mut self, product: Product);

    /// Replaces the row with the same id in place.
    fn replace(&mut self, product: Product) -> PortResult<()>;
}

impl<T: ProductRepository + ?Sized> ProductRepository for Box<T> {
    fn all(&self) -> Vec<Product> {
        (**self).all()
    }

    fn find(&self, id: &str) -> Option<Product> {
        (**self).find(id)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn push(&mut self, product: Product) {
        (**self).push(product)
    }

    fn replace(&mut self, product: Product) -> PortResult<()> {
        (**self).replace(product)
    }
}
