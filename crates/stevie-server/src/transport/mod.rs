//! Dispatch adapters for the two supported transports.

pub mod gateway;
pub mod local;

use serde::Serialize;

pub use gateway::{create_route_handler, GatewayEvent, GatewayRouteHandler};
pub use local::{create_local_server, LocalServer, LocalServerRoute, RouteMethod};

/// `{ok: false, message}` body for failures rendered by an adapter.
#[derive(Debug, Serialize)]
pub(crate) struct FailureBody<'a> {
    pub ok: bool,
    pub message: &'a str,
}

impl<'a> FailureBody<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { ok: false, message }
    }
}
