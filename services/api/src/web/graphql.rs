//! services/api/src/web/graphql.rs
//!
//! The single operation endpoint. Boundary failures become 400s; everything the
//! resolver returns, including in-band errors, is sent with a 200.

use crate::web::{protocol::OperationRequest, protocol::TransportError, state::AppState};
use axum::{body::Bytes, extract::State, Json};
use commodities_core::resolver::Envelope;
use std::sync::Arc;

/// Execute a query or mutation against the mock catalog.
#[utoipa::path(
    post,
    path = "/graphql",
    request_body = OperationRequest,
    responses(
        (status = 200, description = "`data` on success, `errors` for validation or lookup failures"),
        (status = 400, description = "Unparseable body, missing query, or unknown operation")
    )
)]
pub async fn graphql_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Envelope>, TransportError> {
    let request = OperationRequest::from_slice(&body)?;
    let envelope = app_state.resolver.lock().await.try_execute(
        request.operation_name.as_deref(),
        &request.query,
        &request.variables,
    );
    envelope.map(Json).ok_or(TransportError::UnknownOperation)
}
