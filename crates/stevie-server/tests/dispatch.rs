//! End-to-end dispatch tests for both transports.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use stevie::{route_handler, ApiResponse, RouteHandler, StevieError};
use stevie_server::transport::{
    create_local_server, create_route_handler, GatewayEvent, LocalServer, LocalServerRoute,
    RouteMethod,
};

// ─────────────────────── helpers ───────────────────────

fn hello_handler() -> RouteHandler {
    route_handler!((resp, name) => async move {
        resp.send(&json!({ "hello": name }))
    })
}

fn failing_handler() -> RouteHandler {
    route_handler!((_resp) => async move {
        Err(anyhow::anyhow!("boom"))
    })
}

fn expected_headers() -> Value {
    json!({
        "Access-Control-Allow-Origin": "*",
        "Content-Type": "text/plain"
    })
}

async fn gateway(handler: RouteHandler, event: GatewayEvent) -> ApiResponse {
    create_route_handler(handler)
        .handle(event)
        .await
        .expect("gateway dispatch")
}

async fn local_call(
    router: axum::Router,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ═══════════════════════════════════════════════════════
// GATEWAY TRANSPORT
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn gateway_plain_json_body() {
    let event = GatewayEvent {
        body: Some(r#"{"name":"world"}"#.into()),
        is_base64_encoded: false,
        query_string_parameters: None,
    };
    let response = gateway(hello_handler(), event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"hello":"world"}"#);
    assert_eq!(serde_json::to_value(&response.headers).unwrap(), expected_headers());
}

#[tokio::test]
async fn gateway_base64_body() {
    let encoded = base64::engine::general_purpose::STANDARD.encode(r#"{"name":"x"}"#);
    let event = GatewayEvent {
        body: Some(encoded),
        is_base64_encoded: true,
        query_string_parameters: None,
    };
    let response = gateway(hello_handler(), event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"hello":"x"}"#);
    assert_eq!(serde_json::to_value(&response.headers).unwrap(), expected_headers());
}

#[tokio::test]
async fn gateway_handler_failure() {
    let response = gateway(failing_handler(), GatewayEvent::default()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, r#"{"ok":false,"message":"boom"}"#);
    assert_eq!(serde_json::to_value(&response.headers).unwrap(), expected_headers());
}

#[tokio::test]
async fn gateway_query_over_empty_body() {
    let event = GatewayEvent {
        body: Some("{}".into()),
        is_base64_encoded: false,
        query_string_parameters: Some(HashMap::from([("name".into(), "world".into())])),
    };
    let response = gateway(hello_handler(), event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"hello":"world"}"#);
}

#[tokio::test]
async fn gateway_missing_argument_serializes_null() {
    let response = gateway(hello_handler(), GatewayEvent::default()).await;
    assert_eq!(response.body, r#"{"hello":null}"#);
}

#[tokio::test]
async fn gateway_malformed_body_is_not_caught() {
    let event = GatewayEvent {
        body: Some("{not json".into()),
        ..Default::default()
    };
    let result = create_route_handler(hello_handler()).handle(event).await;
    assert!(matches!(result, Err(StevieError::MalformedBody(_))));
}

#[tokio::test]
async fn gateway_response_wire_shape() {
    let event = GatewayEvent {
        body: Some(r#"{"name":"world"}"#.into()),
        ..Default::default()
    };
    let response = gateway(hello_handler(), event).await;
    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(
        wire,
        json!({
            "statusCode": 200,
            "body": "{\"hello\":\"world\"}",
            "headers": expected_headers()
        })
    );
}

#[tokio::test]
async fn gateway_dispatches_are_independent() {
    let handler = create_route_handler(hello_handler());
    let events = ["a", "b", "c"].map(|name| GatewayEvent {
        body: Some(json!({ "name": name }).to_string()),
        ..Default::default()
    });

    let [a, b, c] = events;
    let (ra, rb, rc) = tokio::join!(handler.handle(a), handler.handle(b), handler.handle(c));
    assert_eq!(ra.unwrap().body, r#"{"hello":"a"}"#);
    assert_eq!(rb.unwrap().body, r#"{"hello":"b"}"#);
    assert_eq!(rc.unwrap().body, r#"{"hello":"c"}"#);
}

// ═══════════════════════════════════════════════════════
// LOCAL TRANSPORT
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn local_json_body() {
    let router = create_local_server(vec![LocalServerRoute::new(
        "/hello",
        RouteMethod::Post,
        hello_handler(),
    )]);
    let (status, body) = local_call(
        router,
        "POST",
        "/hello",
        Some("application/json"),
        r#"{"name":"world"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hello": "world"}));
}

#[tokio::test]
async fn local_ignores_query_by_default() {
    let router = create_local_server(vec![LocalServerRoute::new(
        "/hello",
        RouteMethod::Get,
        hello_handler(),
    )]);
    let (status, body) = local_call(router, "GET", "/hello?name=world", None, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hello": null}));
}

#[tokio::test]
async fn local_query_merge_opt_in() {
    let router = LocalServer::new(vec![LocalServerRoute::new(
        "/hello",
        RouteMethod::Post,
        hello_handler(),
    )])
    .merge_query_parameters(true)
    .router();
    let (status, body) = local_call(
        router,
        "POST",
        "/hello?name=query",
        Some("application/json"),
        r#"{"name":"body"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hello": "query"}));
}

#[tokio::test]
async fn local_form_body() {
    let router = create_local_server(vec![LocalServerRoute::new(
        "/hello",
        RouteMethod::Put,
        hello_handler(),
    )]);
    let (status, body) = local_call(
        router,
        "PUT",
        "/hello",
        Some("application/x-www-form-urlencoded"),
        "name=form+data",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hello": "form data"}));
}

#[tokio::test]
async fn local_handler_failure() {
    let router = create_local_server(vec![LocalServerRoute::new(
        "/fail",
        RouteMethod::Delete,
        failing_handler(),
    )]);
    let (status, body) = local_call(router, "DELETE", "/fail", None, "").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "boom"}));
}

#[tokio::test]
async fn local_custom_status() {
    let handler = route_handler!((res, id) => async move {
        res.send_with_status_code(404, &json!({ "missing": id }))
    });
    let router = create_local_server(vec![LocalServerRoute::new("/item", RouteMethod::Post, handler)]);
    let (status, body) = local_call(router, "POST", "/item", None, r#"{"id":7}"#).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"missing": 7}));
}

#[tokio::test]
async fn local_malformed_body_is_rejected() {
    let router = create_local_server(vec![LocalServerRoute::new(
        "/hello",
        RouteMethod::Post,
        hello_handler(),
    )]);
    let (status, body) =
        local_call(router, "POST", "/hello", Some("application/json"), "{oops").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn local_unregistered_method() {
    let router = create_local_server(vec![LocalServerRoute::new(
        "/hello",
        RouteMethod::Get,
        hello_handler(),
    )]);
    let (status, _) = local_call(router, "POST", "/hello", None, "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn local_duplicate_route_first_wins() {
    let second = route_handler!((res) => async move { res.send("second") });
    let router = create_local_server(vec![
        LocalServerRoute::new("/hello", RouteMethod::Post, hello_handler()),
        LocalServerRoute::new("/hello", RouteMethod::Post, second),
        LocalServerRoute::new("/hello", RouteMethod::Get, failing_handler()),
    ]);

    let (status, body) =
        local_call(router.clone(), "POST", "/hello", None, r#"{"name":"first"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hello": "first"}));

    let (status, _) = local_call(router, "GET", "/hello", None, "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn local_relative_path_is_registered_absolute() {
    let router = create_local_server(vec![
        LocalServerRoute::new("hello", RouteMethod::Post, hello_handler()),
        LocalServerRoute::new("/hello", RouteMethod::Post, failing_handler()),
    ]);

    let (status, body) = local_call(router, "POST", "/hello", None, r#"{"name":"rel"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hello": "rel"}));
}

// ═══════════════════════════════════════════════════════
// BUILT-IN ROUTES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn demo_routes_over_local_transport() {
    let router = create_local_server(stevie_server::demo::routes());

    let (status, body) = local_call(
        router.clone(),
        "POST",
        "/echo",
        None,
        r#"{"message":"hi","tag":"t1"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "hi", "tag": "t1"}));

    let (status, body) = local_call(
        router.clone(),
        "POST",
        "/status",
        None,
        r#"{"code":202,"data":{"queued":true}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({"queued": true}));

    let (status, body) = local_call(router, "POST", "/status", None, r#"{"code":"202"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("code"));
}
