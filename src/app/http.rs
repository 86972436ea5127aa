// ==========================================
// 工单排程校验服务 - HTTP 路由
// ==========================================
// 职责: 将 API 层暴露为 JSON HTTP 接口
// 说明: 仓储为同步 rusqlite 调用，统一放到 spawn_blocking 中执行
// ==========================================

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{ApiError, ApiResult, OperationUpdated, ServerTime, UpdateOperationRequest, WorkOrderView};
use crate::app::state::AppState;

/// 对外公布的接口清单
const ENDPOINTS: &[&str] = &[
    "GET /api/work_orders",
    "PUT /api/operations/{op_id}",
    "GET /api/server_time",
    "GET /health",
];

/// 构建路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/server_time", get(server_time))
        .route("/api/work_orders", get(list_work_orders))
        .route("/api/operations/{op_id}", put(update_operation))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": crate::APP_NAME,
        "version": crate::VERSION,
        "endpoints": ENDPOINTS,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn server_time(State(state): State<Arc<AppState>>) -> Json<ServerTime> {
    Json(state.work_order_api.server_time())
}

async fn list_work_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WorkOrderView>>, ApiError> {
    let views = run_blocking(move || state.work_order_api.list_work_orders()).await?;
    Ok(Json(views))
}

async fn update_operation(
    State(state): State<Arc<AppState>>,
    Path(op_id): Path<String>,
    body: Bytes,
) -> Result<Json<OperationUpdated>, ApiError> {
    let request = UpdateOperationRequest::from_json_slice(&body);
    let updated =
        run_blocking(move || state.operation_api.update_operation(&op_id, &request)).await?;
    Ok(Json(updated))
}

async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("后台任务失败: {}", e)))?
}

// ==========================================
// ApiError → HTTP 响应
// ==========================================
// NotFound → 404；存储/内部错误 → 500；其余校验错误 → 400
// 响应体: { error, code, ...规则上下文字段 }
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
            self.to_string()
        };

        let mut body = self.context();
        body.insert("error".to_string(), Value::String(message));
        body.insert("code".to_string(), Value::String(self.code().to_string()));

        (status, Json(Value::Object(body))).into_response()
    }
}
