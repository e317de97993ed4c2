//! Canonical responses and the response capability handed to handlers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StevieResult;

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

/// Transport-neutral `{statusCode, body, headers}` result.
///
/// `body` always holds serialized JSON, error paths included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

/// Result every handler produces.
pub type HandlerResult = anyhow::Result<ApiResponse>;

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (CONTENT_TYPE_HEADER.to_string(), "text/plain".to_string()),
        (ALLOW_ORIGIN_HEADER.to_string(), "*".to_string()),
    ])
}

/// Build a canonical response from a status code and any serializable value.
///
/// Serialization failures propagate; there is no fallback body.
pub fn build_response<T: Serialize + ?Sized>(status_code: u16, data: &T) -> StevieResult<ApiResponse> {
    Ok(ApiResponse {
        status_code,
        body: serde_json::to_string(data)?,
        headers: default_headers(),
    })
}

/// The response capability passed as the first argument to every handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Responder;

impl Responder {
    /// `200` with `data` as the body.
    pub fn send<T: Serialize + ?Sized>(&self, data: &T) -> HandlerResult {
        Ok(build_response(200, data)?)
    }

    pub fn send_with_status_code<T: Serialize + ?Sized>(&self, code: u16, data: &T) -> HandlerResult {
        Ok(build_response(code, data)?)
    }
}
