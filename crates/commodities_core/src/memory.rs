//! crates/commodities_core/src/memory.rs
//!
//! In-process implementations of the core ports. Nothing here survives a restart.

use crate::domain::Product;
use crate::ports::{KeyValueStorage, PortError, PortResult, ProductRepository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

//=========================================================================================
// MemoryStorage
//=========================================================================================

/// A `KeyValueStorage` kept in memory.
///
/// Clones share the same map, so a second handle can stand in for the same
/// browser storage after a simulated restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| PortError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

//=========================================================================================
// InMemoryProducts
//=========================================================================================

/// The mock product collection. Starts from fixed seed rows and is lost on restart.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProducts {
    rows: Vec<Product>,
}

impl InMemoryProducts {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The three rows every process starts with.
    pub fn seeded() -> Self {
        Self {
            rows: vec![
                Product::new("1", "Wheat", 2.5, 100, "Grains"),
                Product::new("2", "Corn", 1.8, 3, "Grains"),
                Product::new("3", "Soybeans", 4.2, 50, "Oilseeds"),
            ],
        }
    }
}

impl From<Vec<Product>> for InMemoryProducts {
    fn from(rows: Vec<Product>) -> Self {
        Self { rows }
    }
}

impl ProductRepository for InMemoryProducts {
    fn all(&self) -> Vec<Product> {
        self.rows.clone()
    }

    fn find(&self, id: &str) -> Option<Product> {
        self.rows.iter().find(|p| p.id == id).cloned()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn push(&mut self, product: Product) {
        self.rows.push(product);
    }

    fn replace(&mut self, product: Product) -> PortResult<()> {
        let slot = self
            .rows
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| PortError::NotFound(format!("product {}", product.id)))?;
        *slot = product;
        Ok(())
    }
}
