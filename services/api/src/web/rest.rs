//! services/api/src/web/rest.rs
//!
//! Contains the plain REST handlers and the master definition for the
//! OpenAPI specification.

use crate::web::{graphql, protocol::OperationRequest};
use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        graphql::graphql_handler,
        health_handler,
    ),
    components(
        schemas(OperationRequest, HealthResponse)
    ),
    tags(
        (name = "Commodities API", description = "Mock query/mutation endpoint for the commodities catalog.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The server is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
