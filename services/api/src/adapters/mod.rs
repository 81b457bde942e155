pub mod file_storage;
pub mod graphql_client;

pub use file_storage::JsonFileStorage;
pub use graphql_client::{ClientError, GraphQlClient, ProductInput, ProductPatch};
