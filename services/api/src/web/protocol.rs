//! services/api/src/web/protocol.rs
//!
//! Defines the request body accepted by the operation endpoint and the
//! boundary-level errors raised before a request ever reaches the resolver.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use commodities_core::resolver::Envelope;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use utoipa::ToSchema;

//=========================================================================================
// Request Body
//=========================================================================================

/// A query/mutation request as sent by GraphQL-style clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    /// Operation text. Used to infer the operation when `operationName` is absent.
    pub query: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl OperationRequest {
    pub fn new(
        operation_name: impl Into<String>,
        query: impl Into<String>,
        variables: Map<String, Value>,
    ) -> Self {
        Self {
            query: query.into(),
            variables,
            operation_name: Some(operation_name.into()),
        }
    }

    /// Parses a raw request body.
    ///
    /// Non-object `variables` are treated as empty. A missing or `null`
    /// `operationName` is absent; any other non-string value names no known
    /// operation and is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, TransportError> {
        let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(body) else {
            return Err(TransportError::InvalidBody);
        };
        let query = match fields.remove("query") {
            Some(Value::String(query)) if !query.is_empty() => query,
            _ => return Err(TransportError::InvalidQuery),
        };
        let variables = match fields.remove("variables") {
            Some(Value::Object(variables)) => variables,
            _ => Map::new(),
        };
        let operation_name = match fields.remove("operationName") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name),
            Some(_) => return Err(TransportError::UnknownOperation),
        };
        Ok(Self {
            query,
            variables,
            operation_name,
        })
    }
}

//=========================================================================================
// Transport Errors
//=========================================================================================

/// Failures that reject a request outright with a 400 instead of an in-band error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Missing or invalid query")]
    InvalidQuery,
    #[error("Unknown operation")]
    UnknownOperation,
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        warn!("Rejecting request: {}", self);
        (StatusCode::BAD_REQUEST, Json(Envelope::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_request() {
        let body = br#"{
            "query": "mutation Login { login }",
            "variables": {"email": "a@b.c"},
            "operationName": "Login"
        }"#;
        let request = OperationRequest::from_slice(body).unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("Login"));
        assert_eq!(request.variables["email"], "a@b.c");
    }

    #[test]
    fn lenient_optional_fields() {
        let body = br#"{"query":"query GetProducts","variables":null,"operationName":null}"#;
        let request = OperationRequest::from_slice(body).unwrap();
        assert!(request.variables.is_empty());
        assert_eq!(request.operation_name, None);

        let request = OperationRequest::from_slice(br#"{"query":"q","variables":[1]}"#).unwrap();
        assert!(request.variables.is_empty());
        assert_eq!(request.operation_name, None);
    }

    #[test]
    fn non_string_operation_name_is_unknown() {
        for name in ["7", "true", "[\"GetProducts\"]", "{}"] {
            let body = format!(r#"{{"query":"query GetProducts","operationName":{name}}}"#);
            assert_eq!(
                OperationRequest::from_slice(body.as_bytes()).unwrap_err(),
                TransportError::UnknownOperation,
                "operationName {name}"
            );
        }
    }

    #[test]
    fn rejects_bad_bodies() {
        assert_eq!(
            OperationRequest::from_slice(b"{oops").unwrap_err(),
            TransportError::InvalidBody
        );
        assert_eq!(
            OperationRequest::from_slice(b"[1,2]").unwrap_err(),
            TransportError::InvalidBody
        );
        assert_eq!(
            OperationRequest::from_slice(br#"{"variables":{}}"#).unwrap_err(),
            TransportError::InvalidQuery
        );
        assert_eq!(
            OperationRequest::from_slice(br#"{"query":""}"#).unwrap_err(),
            TransportError::InvalidQuery
        );
        assert_eq!(
            OperationRequest::from_slice(br#"{"query":42}"#).unwrap_err(),
            TransportError::InvalidQuery
        );
    }

    #[test]
    fn unknown_operation_matches_resolver_message() {
        assert_eq!(
            TransportError::UnknownOperation.to_string(),
            commodities_core::resolver::UNKNOWN_OPERATION
        );
    }

    #[test]
    fn serializes_camel_case() {
        let request = OperationRequest::new("GetProducts", "query GetProducts", Map::new());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["operationName"], "GetProducts");
        assert!(json["variables"].as_object().unwrap().is_empty());
    }
}
