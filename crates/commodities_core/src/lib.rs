pub mod auth;
pub mod domain;
pub mod guard;
pub mod memory;
pub mod navigation;
pub mod ports;
pub mod resolver;
pub mod session;

pub use auth::{AuthGate, AuthSnapshot, Phase};
pub use domain::{
    search_products, DashboardStats, Product, Role, Session, Theme, User, LOW_STOCK_THRESHOLD,
};
pub use guard::{decide, GuardOutcome, RouteGuard};
pub use memory::{InMemoryProducts, MemoryStorage};
pub use navigation::{home_destination, menu_for, MenuItem, Route};
pub use ports::{KeyValueStorage, PortError, PortResult, ProductRepository};
pub use resolver::{Envelope, Operation, OperationData, OperationError, Resolver};
pub use session::SessionStore;
