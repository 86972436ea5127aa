// ==========================================
// HTTP 接口测试
// ==========================================
// 测试目标: 路由、状态码、响应体字段（error / code / 上下文）
// 工具: tower::ServiceExt::oneshot 直接驱动 Router
// ==========================================


use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use factory_gantt::app::router;
use serde_json::{json, Value};
use tower::ServiceExt;

use test_helpers::{create_test_state, insert_all, operation, seed_standard_scenario, ts, work_order};

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn test_app() -> (tempfile::NamedTempFile, Router) {
    let (temp_file, state) = create_test_state().unwrap();
    seed_standard_scenario(&state).unwrap();
    (temp_file, router(state))
}

#[tokio::test]
async fn test_index_and_health() {
    let (_temp_file, app) = test_app();

    let (status, body) = send(app.clone(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Factory Gantt API");
    assert_eq!(body["version"], factory_gantt::VERSION);
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "GET /api/work_orders"));

    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_server_time_is_utc_z() {
    let (_temp_file, app) = test_app();

    let (status, body) = send(app, get("/api/server_time")).await;
    assert_eq!(status, StatusCode::OK);

    let now = body["nowUtc"].as_str().unwrap();
    assert!(now.ends_with('Z'));
    assert_eq!(now.len(), "2099-01-01T00:00:00Z".len());
}

#[tokio::test]
async fn test_list_work_orders_shape() {
    let (_temp_file, app) = test_app();

    let (status, body) = send(app, get("/api/work_orders")).await;
    assert_eq!(status, StatusCode::OK);

    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], "WO-1");
    assert_eq!(orders[0]["qty"], 10);

    let first_op = &orders[0]["operations"][0];
    assert_eq!(first_op["id"], "OP-1");
    assert_eq!(first_op["workOrderId"], "WO-1");
    assert_eq!(first_op["index"], 0);
    assert_eq!(first_op["machineId"], "M1");
    assert_eq!(first_op["start"], ts(9, 0));
    assert_eq!(first_op["end"], ts(10, 0));
    assert_eq!(orders[0]["operations"][1]["id"], "OP-2");
}

#[tokio::test]
async fn test_list_work_orders_sorted_regardless_of_insert_order() {
    let (_temp_file, state) = create_test_state().unwrap();
    insert_all(
        &state,
        vec![
            (
                work_order("WO-B"),
                vec![
                    operation("OP-B30", "WO-B", 30, "M2", (15, 0), (16, 0)),
                    operation("OP-B10", "WO-B", 10, "M1", (9, 0), (10, 0)),
                ],
            ),
            (
                work_order("WO-A"),
                vec![
                    operation("OP-A7", "WO-A", 7, "M3", (14, 0), (15, 0)),
                    operation("OP-A2", "WO-A", 2, "M3", (10, 0), (11, 0)),
                    operation("OP-A5", "WO-A", 5, "M4", (12, 0), (13, 0)),
                ],
            ),
        ],
    )
    .unwrap();

    let views = state.work_order_api.list_work_orders().unwrap();
    let nested: Vec<(&str, Vec<&str>)> = views
        .iter()
        .map(|wo| {
            (
                wo.id.as_str(),
                wo.operations.iter().map(|op| op.id.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(
        nested,
        vec![
            ("WO-A", vec!["OP-A2", "OP-A5", "OP-A7"]),
            ("WO-B", vec!["OP-B10", "OP-B30"]),
        ]
    );

    let (status, body) = send(router(state), get("/api/work_orders")).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders[0]["id"], "WO-A");
    let indexes: Vec<i64> = orders[0]["operations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|op| op["index"].as_i64().unwrap())
        .collect();
    assert_eq!(indexes, vec![2, 5, 7]);
    assert_eq!(orders[1]["id"], "WO-B");
    assert_eq!(orders[1]["operations"][0]["id"], "OP-B10");
    assert_eq!(orders[1]["operations"][1]["id"], "OP-B30");
}

#[tokio::test]
async fn test_update_success() {
    let (_temp_file, app) = test_app();

    let (status, body) = send(
        app.clone(),
        put_json(
            "/api/operations/OP-4",
            json!({ "start": "2099-01-01T15:00:00.750Z", "end": ts(16, 0) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Operation updated successfully");
    assert_eq!(body["id"], "OP-4");
    assert_eq!(body["start"], ts(15, 0));
    assert_eq!(body["end"], ts(16, 0));

    let (_, body) = send(app, get("/api/work_orders")).await;
    assert_eq!(body[1]["operations"][1]["start"], ts(15, 0));
}

#[tokio::test]
async fn test_update_unknown_operation_is_404() {
    let (_temp_file, app) = test_app();

    let (status, body) = send(
        app,
        put_json("/api/operations/OP-404", json!({ "start": ts(9, 0), "end": ts(10, 0) })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Operation not found");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_or_unparseable_body_is_missing_field() {
    let (_temp_file, app) = test_app();

    let no_body = Request::builder()
        .method(Method::PUT)
        .uri("/api/operations/OP-1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), no_body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["error"], "Both 'start' and 'end' are required");

    let bad_json = Request::builder()
        .method(Method::PUT)
        .uri("/api/operations/OP-1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, bad_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_validation_errors_carry_context() {
    let (_temp_file, app) = test_app();

    let (status, body) = send(
        app.clone(),
        put_json(
            "/api/operations/OP-1",
            json!({ "start": "2025-08-20T09:00:00", "end": ts(10, 0) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TIMESTAMP");
    assert_eq!(
        body["error"],
        "Invalid ISO-8601 datetime. Use e.g. 2025-08-20T09:00:00Z"
    );

    let (status, body) = send(
        app.clone(),
        put_json("/api/operations/OP-1", json!({ "start": ts(10, 0), "end": ts(10, 0) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");
    assert_eq!(body["start"], ts(10, 0));
    assert_eq!(body["end"], ts(10, 0));

    let (status, body) = send(
        app.clone(),
        put_json(
            "/api/operations/OP-1",
            json!({ "start": "2000-01-01T09:00:00Z", "end": "2000-01-01T10:00:00Z" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PAST_START");
    assert_eq!(body["error"], "Start cannot be before now");
    assert_eq!(body["start"], "2000-01-01T09:00:00Z");
    assert!(body["nowUtc"].as_str().unwrap().ends_with('Z'));

    let (status, body) = send(
        app.clone(),
        put_json("/api/operations/OP-2", json!({ "start": ts(9, 30), "end": ts(10, 30) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRECEDENCE_VIOLATION");
    assert_eq!(body["previousOpId"], "OP-1");
    assert_eq!(body["previousEnd"], ts(10, 0));

    let (status, body) = send(
        app,
        put_json("/api/operations/OP-2", json!({ "start": ts(11, 30), "end": ts(12, 30) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MACHINE_CONFLICT");
    assert_eq!(body["overlapOpId"], "OP-3");
    assert_eq!(body["overlapStart"], ts(12, 0));
    assert_eq!(body["overlapEnd"], ts(13, 0));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (_temp_file, app) = test_app();

    let request = Request::builder()
        .uri("/api/work_orders")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
