//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use commodities_core::ports::ProductRepository;
use commodities_core::resolver::Resolver;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The resolver over whichever product repository the server was started with.
pub type SharedResolver = Arc<Mutex<Resolver<Box<dyn ProductRepository>>>>;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The resolver sits behind a mutex so requests are applied one at a time.
#[derive(Clone)]
pub struct AppState {
    pub resolver: SharedResolver,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>, products: impl ProductRepository + 'static) -> Self {
        let products: Box<dyn ProductRepository> = Box::new(products);
        Self {
            resolver: Arc::new(Mutex::new(Resolver::new(products))),
            config,
        }
    }
}
