//! Built-in demonstration routes served by the `stevie-server` binary.

use serde_json::json;
use stevie::{route_handler, RouteHandler};

use crate::transport::{LocalServerRoute, RouteMethod};

/// `{"hello": name}`.
pub fn hello() -> RouteHandler {
    route_handler!((res, name) => async move {
        res.send(&json!({ "hello": name }))
    })
}

/// Echo `message`, plus `tag` when sent. The underscore markers around
/// `_tag_` are stripped from the bound name.
pub fn echo() -> RouteHandler {
    route_handler!((res, message, _tag_) => async move {
        res.send(&json!({ "message": message, "tag": _tag_ }))
    })
}

/// Respond with `data` under the numeric status `code`.
pub fn status() -> RouteHandler {
    route_handler!((res, code, data) => async move {
        let code: u16 = code.parse()?;
        res.send_with_status_code(code, &data)
    })
}

pub fn fail() -> RouteHandler {
    route_handler!((_res) => async move {
        Err(anyhow::anyhow!("boom"))
    })
}

pub fn routes() -> Vec<LocalServerRoute> {
    vec![
        LocalServerRoute::new("/hello", RouteMethod::Get, hello()),
        LocalServerRoute::new("/hello", RouteMethod::Post, hello()),
        LocalServerRoute::new("/echo", RouteMethod::Post, echo()),
        LocalServerRoute::new("/status", RouteMethod::Post, status()),
        LocalServerRoute::new("/fail", RouteMethod::Get, fail()),
    ]
}

/// Look a route handler up by name, i.e. its path without the leading `/`.
pub fn find_handler(name: &str) -> Option<RouteHandler> {
    let name = name.trim_start_matches('/');
    routes()
        .into_iter()
        .find(|route| route.path.trim_start_matches('/') == name)
        .map(|route| route.handler)
}
