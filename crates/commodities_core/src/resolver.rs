//! crates/commodities_core/src/resolver.rs
//!
//! The mock query/mutation endpoint. Resolves an operation tag, runs the matching
//! handler against the injected product repository and wraps the outcome in an
//! `Envelope`. Every input produces an envelope; nothing here fails outward.

use crate::domain::{DashboardStats, Product, Role, Session, User};
use crate::ports::ProductRepository;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

pub const UNKNOWN_OPERATION: &str = "Unknown operation";
pub const NAME_REQUIRED: &str = "name is required";
pub const PRODUCT_NOT_FOUND: &str = "Product not found";

pub const DEFAULT_LOGIN_EMAIL: &str = "user@example.com";
pub const MOCK_USER_ID: &str = "mock-user-1";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

//=========================================================================================
// Operation Tag
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    GetProducts,
    GetDashboardStats,
    CreateProduct,
    UpdateProduct,
}

impl Operation {
    /// Needles tested against free-form query text, in priority order.
    const INFERENCE_ORDER: [(&'static str, Operation); 5] = [
        ("Login", Operation::Login),
        ("GetProducts", Operation::GetProducts),
        ("GetDashboardStats", Operation::GetDashboardStats),
        ("createProduct", Operation::CreateProduct),
        ("updateProduct", Operation::UpdateProduct),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Login => "Login",
            Operation::GetProducts => "GetProducts",
            Operation::GetDashboardStats => "GetDashboardStats",
            Operation::CreateProduct => "CreateProduct",
            Operation::UpdateProduct => "UpdateProduct",
        }
    }

    /// Compatibility shim for clients that send no `operationName`: guesses the
    /// operation from substrings of the query text. The first match wins.
    pub fn infer(query: &str) -> Option<Self> {
        Self::INFERENCE_ORDER
            .iter()
            .find(|(needle, _)| query.contains(needle))
            .map(|&(_, op)| op)
    }

    /// An explicit operation name is used verbatim and never falls back to inference.
    pub fn resolve(operation_name: Option<&str>, query: &str) -> Option<Self> {
        match operation_name {
            Some(name) => name.parse().ok(),
            None => Self::infer(query),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::INFERENCE_ORDER
            .iter()
            .map(|&(_, op)| op)
            .find(|op| op.name() == s)
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}

//=========================================================================================
// Envelope
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub message: String,
}

/// The payload of a successful operation, keyed by its result field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationData {
    Login(Session),
    Products(Vec<Product>),
    DashboardStats(DashboardStats),
    CreateProduct(Product),
    UpdateProduct(Product),
}

/// Either `{"data": ...}` or `{"errors": [...]}`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Data(OperationData),
    Errors(Vec<OperationError>),
}

impl Envelope {
    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Errors(vec![OperationError {
            message: message.into(),
        }])
    }

    pub fn unknown_operation() -> Self {
        Self::error(UNKNOWN_OPERATION)
    }

    /// The first error message, if this is an error envelope.
    pub fn first_error(&self) -> Option<&str> {
        match self {
            Envelope::Errors(errors) => errors.first().map(|e| e.message.as_str()),
            Envelope::Data(_) => None,
        }
    }
}

//=========================================================================================
// Resolver
//=========================================================================================

pub struct Resolver<R> {
    products: R,
}

impl<R: ProductRepository> Resolver<R> {
    pub fn new(products: R) -> Self {
        Self { products }
    }

    pub fn repository(&self) -> &R {
        &self.products
    }

    /// Resolves the operation and runs it. Unrecognized operations produce an
    /// `Unknown operation` error envelope.
    pub fn execute(
        &mut self,
        operation_name: Option<&str>,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Envelope {
        self.try_execute(operation_name, query, variables)
            .unwrap_or_else(Envelope::unknown_operation)
    }

    /// Like `execute`, but returns `None` when no operation can be resolved so
    /// the caller can reject the request instead of answering in-band.
    pub fn try_execute(
        &mut self,
        operation_name: Option<&str>,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Option<Envelope> {
        let Some(op) = Operation::resolve(operation_name, query) else {
            info!("Unknown operation (name: {:?}).", operation_name);
            return None;
        };
        if operation_name.is_none() {
            debug!("Inferred {} from query text.", op);
        }
        let envelope = self.dispatch(op, variables);
        if let Some(message) = envelope.first_error() {
            info!("{} returned an error: {}", op, message);
        }
        Some(envelope)
    }

    pub fn dispatch(&mut self, op: Operation, variables: &Map<String, Value>) -> Envelope {
        debug!("Dispatching {}.", op);
        match op {
            Operation::Login => self.login(variables),
            Operation::GetProducts => Envelope::Data(OperationData::Products(self.products.all())),
            Operation::GetDashboardStats => Envelope::Data(OperationData::DashboardStats(
                DashboardStats::compute(&self.products.all()),
            )),
            Operation::CreateProduct => self.create_product(variables),
            Operation::UpdateProduct => self.update_product(variables),
        }
    }

    /// Always succeeds. The password is not checked.
    fn login(&self, variables: &Map<String, Value>) -> Envelope {
        let email = variables
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LOGIN_EMAIL)
            .to_string();
        let role = role_for_email(&email);
        info!("Issuing mock session for {} as {}.", email, role);
        Envelope::Data(OperationData::Login(Session {
            access_token: format!("mock-jwt-{}", Uuid::new_v4().simple()),
            user: User {
                id: MOCK_USER_ID.to_string(),
                email,
                role,
            },
        }))
    }

    fn create_product(&mut self, variables: &Map<String, Value>) -> Envelope {
        let input = variables.get("input");
        let field = |key: &str| input.and_then(|i| i.get(key));

        let Some(name) = field("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
            info!("Rejected createProduct without a name.");
            return Envelope::error(NAME_REQUIRED);
        };
        let product = Product {
            // Not collision-safe if rows are ever deleted.
            id: (self.products.len() + 1).to_string(),
            name: name.to_string(),
            price: coerce_number(field("price")),
            stock: coerce_count(field("stock")),
            category: field("category")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
        };
        info!("Created product {} ({}).", product.id, product.name);
        self.products.push(product.clone());
        Envelope::Data(OperationData::CreateProduct(product))
    }

    fn update_product(&mut self, variables: &Map<String, Value>) -> Envelope {
        let Some(mut product) = variables
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| self.products.find(id))
        else {
            info!("Rejected updateProduct for unknown id {:?}.", variables.get("id"));
            return Envelope::error(PRODUCT_NOT_FOUND);
        };

        let input = variables.get("input");
        let present = |key: &str| input.and_then(|i| i.get(key)).filter(|v| !v.is_null());

        if let Some(name) = present("name").and_then(Value::as_str) {
            product.name = name.to_string();
        }
        if let Some(price) = present("price") {
            product.price = coerce_number(Some(price));
        }
        if let Some(stock) = present("stock") {
            product.stock = coerce_count(Some(stock));
        }
        if let Some(category) = present("category").and_then(Value::as_str) {
            product.category = category.to_string();
        }

        if self.products.replace(product.clone()).is_err() {
            return Envelope::error(PRODUCT_NOT_FOUND);
        }
        info!("Updated product {}.", product.id);
        Envelope::Data(OperationData::UpdateProduct(product))
    }
}

/// Store keepers are recognised by `store` anywhere in their email.
pub fn role_for_email(email: &str) -> Role {
    if email.contains("store") {
        Role::StoreKeeper
    } else {
        Role::Manager
    }
}

/// Numbers pass through, numeric strings are parsed, everything else is 0.
/// Negative and non-finite values become 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

fn coerce_count(value: Option<&Value>) -> u64 {
    // Non-negative and finite after coerce_number; `as` saturates at u64::MAX.
    coerce_number(value).trunc() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProducts;
    use serde_json::json;

    fn resolver() -> Resolver<InMemoryProducts> {
        Resolver::new(InMemoryProducts::seeded())
    }

    fn vars(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("variables must be an object"),
        }
    }

    fn product_of(envelope: Envelope) -> Product {
        match envelope {
            Envelope::Data(OperationData::CreateProduct(p))
            | Envelope::Data(OperationData::UpdateProduct(p)) => p,
            other => panic!("expected a product, got {other:?}"),
        }
    }

    fn session_of(envelope: Envelope) -> Session {
        match envelope {
            Envelope::Data(OperationData::Login(s)) => s,
            other => panic!("expected a login payload, got {other:?}"),
        }
    }

    // --- operation resolution ---

    #[test]
    fn explicit_name_wins_over_query_text() {
        assert_eq!(
            Operation::resolve(Some("GetDashboardStats"), "query GetProducts { products { id } }"),
            Some(Operation::GetDashboardStats)
        );
    }

    #[test]
    fn unknown_explicit_name_does_not_fall_back() {
        assert_eq!(Operation::resolve(Some("Nope"), "query GetProducts { products }"), None);
    }

    #[test]
    fn inference_follows_priority_order() {
        let cases = [
            ("mutation Login($email: String!) { login }", Operation::Login),
            ("query GetProducts { products { id } }", Operation::GetProducts),
            ("query GetDashboardStats { x }", Operation::GetDashboardStats),
            ("mutation { createProduct(input: $i) { id } }", Operation::CreateProduct),
            ("mutation { updateProduct(id: $id) { id } }", Operation::UpdateProduct),
        ];
        for (query, expected) in cases {
            assert_eq!(Operation::infer(query), Some(expected), "{query}");
        }
        // "Login" outranks everything else present.
        assert_eq!(Operation::infer("Login GetProducts createProduct"), Some(Operation::Login));
        assert_eq!(Operation::infer("{ somethingElse }"), None);
    }

    #[test]
    fn unknown_operation_envelope() {
        let envelope = resolver().execute(None, "{ nothing }", &Map::new());
        assert_eq!(envelope.first_error(), Some(UNKNOWN_OPERATION));
    }

    #[test]
    fn try_execute_separates_unknown_from_in_band_errors() {
        let mut resolver = resolver();
        assert_eq!(resolver.try_execute(Some("Nope"), "query GetProducts", &Map::new()), None);
        let in_band = resolver
            .try_execute(None, "mutation { createProduct }", &Map::new())
            .unwrap();
        assert_eq!(in_band.first_error(), Some(NAME_REQUIRED));
    }

    // --- envelope wire shape ---

    #[test]
    fn envelope_serializes_either_data_or_errors() {
        let data = Envelope::Data(OperationData::Products(vec![]));
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({"data": {"products": []}}));

        let errors = Envelope::error(NAME_REQUIRED);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"errors": [{"message": "name is required"}]})
        );
    }

    #[test]
    fn envelope_rejects_both_keys() {
        let both = json!({"data": {"products": []}, "errors": [{"message": "x"}]});
        assert!(serde_json::from_value::<Envelope>(both).is_err());
    }

    // --- handlers ---

    #[test]
    fn list_returns_seed_unchanged() {
        let envelope = resolver().execute(Some("GetProducts"), "query GetProducts", &Map::new());
        assert_eq!(
            envelope,
            Envelope::Data(OperationData::Products(InMemoryProducts::seeded().all()))
        );
    }

    #[test]
    fn stats_on_seed() {
        let envelope = resolver().dispatch(Operation::GetDashboardStats, &Map::new());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"data": {"dashboardStats": {
                "totalProducts": 3,
                "lowStockItems": 1,
                "totalCategories": 2
            }}})
        );
    }

    #[test]
    fn login_derives_role_from_email() {
        let mut r = resolver();
        let mut login = |email: &str| {
            session_of(r.dispatch(Operation::Login, &vars(json!({ "email": email }))))
        };
        let keeper = login("store1@x.com");
        let manager = login("mgr@x.com");
        assert_eq!(keeper.user.role, Role::StoreKeeper);
        assert_eq!(manager.user.role, Role::Manager);
        assert_eq!(manager.user.id, MOCK_USER_ID);
        assert_ne!(keeper.access_token, manager.access_token);
        assert!(keeper.access_token.starts_with("mock-jwt-"));
    }

    #[test]
    fn login_defaults_email() {
        let session = session_of(resolver().dispatch(Operation::Login, &Map::new()));
        assert_eq!(session.user.email, DEFAULT_LOGIN_EMAIL);
        assert_eq!(session.user.role, Role::Manager);
    }

    #[test]
    fn create_appends_with_next_id() {
        let mut r = resolver();
        let created = product_of(r.dispatch(
            Operation::CreateProduct,
            &vars(json!({"input": {
                "name": "Rice",
                "price": 3,
                "stock": 10,
                "category": "Grains"
            }})),
        ));
        assert_eq!(created, Product::new("4", "Rice", 3.0, 10, "Grains"));
        assert_eq!(r.repository().len(), 4);
        assert_eq!(r.repository().all().last(), Some(&created));
    }

    #[test]
    fn create_without_name_is_rejected() {
        let mut r = resolver();
        let envelope = r.dispatch(Operation::CreateProduct, &vars(json!({"input": {"name": ""}})));
        assert_eq!(envelope, Envelope::error(NAME_REQUIRED));
        assert_eq!(r.repository().len(), 3);

        let envelope = r.dispatch(Operation::CreateProduct, &Map::new());
        assert_eq!(envelope.first_error(), Some(NAME_REQUIRED));
        assert_eq!(r.repository().len(), 3);
    }

    #[test]
    fn create_coerces_and_defaults() {
        let mut r = resolver();
        let created = product_of(r.dispatch(
            Operation::CreateProduct,
            &vars(json!({"input": {"name": "Oats", "price": "1.25", "stock": "lots"}})),
        ));
        assert!((created.price - 1.25).abs() < f64::EPSILON);
        assert_eq!(created.stock, 0);
        assert_eq!(created.category, DEFAULT_CATEGORY);

        let negative = product_of(r.dispatch(
            Operation::CreateProduct,
            &vars(json!({"input": {"name": "Barley", "price": -4, "stock": 7.9}})),
        ));
        assert_eq!(negative.price, 0.0);
        assert_eq!(negative.stock, 7);
        assert_eq!(negative.id, "5");
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut r = resolver();
        let original = r.repository().find("2").unwrap();
        let updated = product_of(r.dispatch(
            Operation::UpdateProduct,
            &vars(json!({"id": "2", "input": {"stock": 50, "name": null}})),
        ));
        assert_eq!(updated, Product { stock: 50, ..original });
        assert_eq!(r.repository().find("2"), Some(updated));
        assert_eq!(r.repository().len(), 3);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut r = resolver();
        let envelope = r.dispatch(
            Operation::UpdateProduct,
            &vars(json!({"id": "999", "input": {"stock": 1}})),
        );
        assert_eq!(envelope, Envelope::error(PRODUCT_NOT_FOUND));
        assert_eq!(r.repository().all(), InMemoryProducts::seeded().all());
    }

    #[test]
    fn untouched_rows_survive_writes() {
        let mut r = resolver();
        r.dispatch(Operation::UpdateProduct, &vars(json!({"id": "2", "input": {"stock": 9}})));
        r.dispatch(Operation::CreateProduct, &vars(json!({"input": {"name": "Rice"}})));
        let seed = InMemoryProducts::seeded();
        for id in ["1", "3"] {
            assert_eq!(r.repository().find(id), seed.find(id));
        }
    }
}
