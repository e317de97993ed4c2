//! Stevie server — gateway and local transports for Stevie route handlers.

pub mod config;
pub mod demo;
pub mod transport;

pub use config::resolve_listen_addr;
pub use transport::{
    create_local_server, create_route_handler, GatewayEvent, GatewayRouteHandler, LocalServer,
    LocalServerRoute, RouteMethod,
};
