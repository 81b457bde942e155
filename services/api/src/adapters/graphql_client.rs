//! services/api/src/adapters/graphql_client.rs
//!
//! An HTTP client for the operation endpoint, used by the console. It sends the
//! same query documents a browser client would, always with an explicit
//! `operationName`.

use crate::web::protocol::OperationRequest;
use commodities_core::domain::{DashboardStats, Product, Session};
use commodities_core::resolver::{Envelope, OperationData};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

pub const LOGIN: &str = "mutation Login($email: String!, $password: String!) {
  login(email: $email, password: $password) { accessToken user { id email role } }
}";

pub const GET_PRODUCTS: &str = "query GetProducts {
  products { id name price stock category }
}";

pub const GET_DASHBOARD_STATS: &str = "query GetDashboardStats {
  dashboardStats { totalProducts lowStockItems totalCategories }
}";

pub const CREATE_PRODUCT: &str = "mutation CreateProduct($input: CreateProductInput!) {
  createProduct(input: $input) { id name price stock category }
}";

pub const UPDATE_PRODUCT: &str = "mutation UpdateProduct($id: ID!, $input: UpdateProductInput!) {
  updateProduct(id: $id, input: $input) { id name price stock category }
}";

//=========================================================================================
// Errors and Inputs
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Cannot reach the server: {0}")]
    Http(#[from] reqwest::Error),
    /// The server rejected the request itself (HTTP 400).
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    /// The operation ran and reported an error in-band.
    #[error("{0}")]
    Operation(String),
    #[error("Unexpected payload; expected {0}")]
    UnexpectedPayload(&'static str),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub stock: u64,
    pub category: String,
}

/// Fields left as `None` are not sent and stay unchanged on the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

//=========================================================================================
// The Client
//=========================================================================================

#[derive(Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl GraphQlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            access_token: None,
        }
    }

    /// Sends the token as a bearer header. The mock server does not check it.
    pub fn with_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }

    pub async fn execute(&self, request: &OperationRequest) -> Result<OperationData, ClientError> {
        debug!("POST {} ({:?})", self.endpoint, request.operation_name);
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;
        let status = response.status();
        match response.json::<Envelope>().await? {
            Envelope::Data(data) => Ok(data),
            Envelope::Errors(errors) => {
                let message = errors
                    .into_iter()
                    .next()
                    .map(|e| e.message)
                    .unwrap_or_else(|| "Unknown error".to_string());
                if status.is_client_error() {
                    Err(ClientError::Rejected { status, message })
                } else {
                    Err(ClientError::Operation(message))
                }
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let variables = object(json!({ "email": email, "password": password }));
        match self.execute(&OperationRequest::new("Login", LOGIN, variables)).await? {
            OperationData::Login(session) => Ok(session),
            _ => Err(ClientError::UnexpectedPayload("login")),
        }
    }

    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let request = OperationRequest::new("GetProducts", GET_PRODUCTS, Map::new());
        match self.execute(&request).await? {
            OperationData::Products(products) => Ok(products),
            _ => Err(ClientError::UnexpectedPayload("products")),
        }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let request = OperationRequest::new("GetDashboardStats", GET_DASHBOARD_STATS, Map::new());
        match self.execute(&request).await? {
            OperationData::DashboardStats(stats) => Ok(stats),
            _ => Err(ClientError::UnexpectedPayload("dashboardStats")),
        }
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ClientError> {
        let variables = object(json!({ "input": input }));
        let request = OperationRequest::new("CreateProduct", CREATE_PRODUCT, variables);
        match self.execute(&request).await? {
            OperationData::CreateProduct(product) => Ok(product),
            _ => Err(ClientError::UnexpectedPayload("createProduct")),
        }
    }

    pub async fn update_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Product, ClientError> {
        let variables = object(json!({ "id": id, "input": patch }));
        let request = OperationRequest::new("UpdateProduct", UPDATE_PRODUCT, variables);
        match self.execute(&request).await? {
            OperationData::UpdateProduct(product) => Ok(product),
            _ => Err(ClientError::UnexpectedPayload("updateProduct")),
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
