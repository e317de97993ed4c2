//! Local transport — an axum server that runs route handlers in-process.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use stevie::{
    build_response, merge_query, parse_json_payload, Payload, RouteHandler, StevieError,
    StevieResult,
};

use super::FailureBody;

/// HTTP methods a local route can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "get",
            RouteMethod::Put => "put",
            RouteMethod::Post => "post",
            RouteMethod::Delete => "delete",
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            RouteMethod::Get => MethodFilter::GET,
            RouteMethod::Put => MethodFilter::PUT,
            RouteMethod::Post => MethodFilter::POST,
            RouteMethod::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the local route table.
#[derive(Debug, Clone)]
pub struct LocalServerRoute {
    pub path: String,
    pub method: RouteMethod,
    pub handler: RouteHandler,
}

impl LocalServerRoute {
    pub fn new(path: impl Into<String>, method: RouteMethod, handler: RouteHandler) -> Self {
        Self {
            path: path.into(),
            method,
            handler,
        }
    }
}

/// `{message}` body sent when a handler fails on the local transport.
#[derive(Debug, Serialize)]
struct HandlerFailure<'a> {
    message: &'a str,
}

/// Local development server over a route table.
pub struct LocalServer {
    routes: Vec<LocalServerRoute>,
    merge_query: bool,
}

impl LocalServer {
    pub fn new(routes: Vec<LocalServerRoute>) -> Self {
        Self {
            routes,
            merge_query: false,
        }
    }

    /// Also merge query parameters into the payload, as the gateway does.
    /// Off by default.
    pub fn merge_query_parameters(mut self, enabled: bool) -> Self {
        self.merge_query = enabled;
        self
    }

    pub fn routes(&self) -> &[LocalServerRoute] {
        &self.routes
    }

    /// Build the axum router. The first registration of a (path, method)
    /// pair wins; duplicates are skipped with a warning. Paths without a
    /// leading `/` are registered under `/<path>`.
    pub fn router(&self) -> Router {
        let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();
        let mut seen: HashSet<(String, RouteMethod)> = HashSet::new();

        for route in &self.routes {
            let path = route_path(&route.path);

            if !seen.insert((path.clone(), route.method)) {
                tracing::warn!(path = %path, method = %route.method, "duplicate route skipped");
                continue;
            }

            let dispatch = LocalDispatch {
                handler: route.handler.clone(),
                merge_query: self.merge_query,
            };
            let endpoint = move |uri: Uri, headers: HeaderMap, body: Bytes| async move {
                dispatch.handle(&uri, &headers, &body).await
            };

            let method_router = match by_path.remove(&path) {
                Some(existing) => existing.on(route.method.filter(), endpoint),
                None => on(route.method.filter(), endpoint),
            };

            tracing::debug!(path = %path, method = %route.method, "route registered");
            by_path.insert(path, method_router);
        }

        by_path
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            })
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `addr` until Ctrl-C.
    pub async fn run(&self, addr: &str) -> StevieResult<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Local server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| StevieError::Transport(e.to_string()))?;

        tracing::info!("Local server has exited");
        Ok(())
    }
}

/// The router only accepts absolute paths.
fn route_path(path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }

    let fixed = format!("/{path}");
    tracing::warn!(path = %path, registered = %fixed, "route path missing leading '/'");
    fixed
}

pub fn create_local_server(routes: Vec<LocalServerRoute>) -> Router {
    LocalServer::new(routes).router()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

#[derive(Clone)]
struct LocalDispatch {
    handler: RouteHandler,
    merge_query: bool,
}

impl LocalDispatch {
    async fn handle(&self, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Response {
        match self.dispatch(uri, headers, body).await {
            Ok((status, value)) => (status, Json(value)).into_response(),
            Err(e) => request_error_response(&e),
        }
    }

    async fn dispatch(
        &self,
        uri: &Uri,
        headers: &HeaderMap,
        body: &[u8],
    ) -> StevieResult<(StatusCode, Value)> {
        let mut payload = normalize_body(headers, body)?;
        if self.merge_query {
            if let Some(query) = uri.query() {
                merge_query(&mut payload, url::form_urlencoded::parse(query.as_bytes()).into_owned());
            }
        }
        dispatch_local(&self.handler, &payload).await
    }
}

/// Parse a request body the way the local server's body parsers do.
///
/// Empty bodies and unrecognized content types give an empty payload. JSON
/// is assumed when no content type is sent.
pub fn normalize_body(headers: &HeaderMap, body: &[u8]) -> StevieResult<Payload> {
    if body.is_empty() {
        return Ok(Payload::new());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
            let mut payload = Payload::new();
            merge_query(&mut payload, url::form_urlencoded::parse(body).into_owned());
            Ok(payload)
        }
        None => parse_json_text(body),
        Some(ct) if ct.contains("json") => parse_json_text(body),
        Some(_) => Ok(Payload::new()),
    }
}

fn parse_json_text(body: &[u8]) -> StevieResult<Payload> {
    let text = std::str::from_utf8(body).map_err(|e| StevieError::MalformedBody(e.to_string()))?;
    parse_json_payload(text)
}

/// Invoke a handler and translate the canonical response into a status and
/// JSON value.
///
/// A failing handler is answered with `500` and `{message}`. The canonical
/// body is parsed back into JSON; a body that does not parse is an error
/// for the caller.
pub async fn dispatch_local(
    handler: &RouteHandler,
    payload: &Payload,
) -> StevieResult<(StatusCode, Value)> {
    let response = match handler.invoke(payload).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "route handler failed");
            let message = e.to_string();
            build_response(500, &HandlerFailure { message: &message })?
        }
    };

    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&response.body)?;
    Ok((status, body))
}

fn request_error_response(err: &StevieError) -> Response {
    tracing::warn!(error = %err, "request could not be dispatched");
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = err.to_string();
    (status, Json(FailureBody::new(&message))).into_response()
}
