//! Gateway transport — serverless function-gateway events in, canonical
//! responses out.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};

use stevie::{
    build_response, merge_query, parse_json_payload, ApiResponse, Payload, RouteHandler,
    StevieError, StevieResult,
};

use super::FailureBody;

/// The parts of a gateway proxy event the adapter reads. Other fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

/// Read a gateway event from a JSON file.
pub fn load_event(path: &Path) -> StevieResult<GatewayEvent> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Turn an event into a flat payload.
///
/// A base64 event with no body yields an empty payload. A plain event with a
/// body always parses it, so an empty string is a malformed body. Query
/// parameters are merged last and win on collision.
pub fn normalize_event(event: &GatewayEvent) -> StevieResult<Payload> {
    let mut payload = match (event.is_base64_encoded, event.body.as_deref()) {
        (true, Some(body)) if !body.is_empty() => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|e| StevieError::InvalidBase64(e.to_string()))?;
            parse_json_payload(&String::from_utf8_lossy(&bytes))?
        }
        (true, _) | (false, None) => Payload::new(),
        (false, Some(body)) => parse_json_payload(body)?,
    };

    if let Some(query) = &event.query_string_parameters {
        merge_query(
            &mut payload,
            query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
    }

    Ok(payload)
}

/// A route handler wrapped for gateway events.
#[derive(Debug, Clone)]
pub struct GatewayRouteHandler {
    handler: RouteHandler,
}

impl GatewayRouteHandler {
    pub fn new(handler: RouteHandler) -> Self {
        Self { handler }
    }

    /// Dispatch one event.
    ///
    /// Handler failures become a 500 with `{ok: false, message}`. Errors from
    /// normalizing the event are returned to the caller untouched.
    pub async fn handle(&self, event: GatewayEvent) -> StevieResult<ApiResponse> {
        let payload = normalize_event(&event)?;

        match self.handler.invoke(&payload).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!(error = %e, "route handler failed");
                let message = e.to_string();
                build_response(500, &FailureBody::new(&message))
            }
        }
    }
}

pub fn create_route_handler(handler: RouteHandler) -> GatewayRouteHandler {
    GatewayRouteHandler::new(handler)
}
