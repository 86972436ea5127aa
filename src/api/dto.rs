// ==========================================
// 工单排程校验服务 - API 数据传输对象
// ==========================================
// 字段命名: camelCase（与前端约定一致）
// 时间字段: 一律渲染为 UTC `Z` 文本
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::timestamp::utc_z;
use crate::domain::work_order::{Operation, WorkOrder};

/// 成功更新工序时的固定提示
pub const UPDATE_SUCCESS_MESSAGE: &str = "Operation updated successfully";

// ==========================================
// 请求
// ==========================================

/// 工序时间窗调整请求
///
/// 字段保留原始 JSON 值：缺失/空串与类型错误需要区分为不同的拒绝原因。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateOperationRequest {
    #[serde(default)]
    pub start: Option<Value>,
    #[serde(default)]
    pub end: Option<Value>,
}

impl UpdateOperationRequest {
    /// 由两个字符串构造（测试与内部调用使用）
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(Value::String(start.into())),
            end: Some(Value::String(end.into())),
        }
    }

    /// 宽松解析请求体：空体、非法 JSON 或非对象一律视为两个字段都缺失
    pub fn from_json_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

// ==========================================
// 响应
// ==========================================

/// 工序更新成功响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationUpdated {
    pub message: String,
    pub id: String,
    #[serde(with = "utc_z")]
    pub start: DateTime<Utc>,
    #[serde(with = "utc_z")]
    pub end: DateTime<Utc>,
}

/// 工单视图（含按 index 排序的工序）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkOrderView {
    pub id: String,
    pub product: String,
    pub qty: i64,
    pub operations: Vec<Operation>,
}

impl WorkOrderView {
    pub fn new(work_order: WorkOrder, operations: Vec<Operation>) -> Self {
        Self {
            id: work_order.id,
            product: work_order.product,
            qty: work_order.qty,
            operations,
        }
    }
}

/// 服务器时间
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerTime {
    #[serde(rename = "nowUtc", with = "utc_z")]
    pub now_utc: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_request_parsing() {
        assert_eq!(
            UpdateOperationRequest::from_json_slice(b""),
            UpdateOperationRequest::default()
        );
        assert_eq!(
            UpdateOperationRequest::from_json_slice(b"not json"),
            UpdateOperationRequest::default()
        );
        assert_eq!(
            UpdateOperationRequest::from_json_slice(b"[1, 2]"),
            UpdateOperationRequest::default()
        );

        let req = UpdateOperationRequest::from_json_slice(
            br#"{"start": "2030-01-01T09:00:00Z", "end": 5}"#,
        );
        assert_eq!(req.start, Some(Value::String("2030-01-01T09:00:00Z".to_string())));
        assert_eq!(req.end, Some(Value::from(5)));
    }
}
