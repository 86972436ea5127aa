// ==========================================
// 工单排程校验服务 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为可解释的错误
// 约束: 校验类错误的消息文本与上下文字段是对外契约，不可随意改动
// ==========================================

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::timestamp::{to_utc_z, TimestampError};
use crate::engine::conflict_checker::ScheduleConflict;
use crate::engine::schedule_lock::LockError;
use crate::repository::error::RepositoryError;

/// ISO-8601 格式指引
pub const ISO_GUIDANCE: &str = "Invalid ISO-8601 datetime. Use e.g. 2025-08-20T09:00:00Z";

/// API层错误类型
/// 所有拒绝都必须带显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("Operation not found")]
    NotFound(String),

    #[error("Both 'start' and 'end' are required")]
    MissingField,

    #[error("{}", ISO_GUIDANCE)]
    InvalidTimestamp {
        field: &'static str,
        reason: TimestampError,
    },

    #[error("End must be after start")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Start cannot be before now")]
    PastStart {
        now: DateTime<Utc>,
        start: DateTime<Utc>,
    },

    // ==========================================
    // 排程规则错误
    // ==========================================
    /// R1: 工序先后
    #[error("{}", precedence_message(.0))]
    PrecedenceViolation(ScheduleConflict),

    /// R2: 机器独占
    #[error("Lane exclusivity violation: overlaps with operation {overlap_op_id} on machine {machine_id}")]
    MachineConflict {
        machine_id: String,
        overlap_op_id: String,
        overlap_start: DateTime<Utc>,
        overlap_end: DateTime<Utc>,
    },

    // ==========================================
    // 数据访问/内部错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定的机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MissingField => "MISSING_FIELD",
            ApiError::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            ApiError::InvalidRange { .. } => "INVALID_RANGE",
            ApiError::PastStart { .. } => "PAST_START",
            ApiError::PrecedenceViolation(_) => "PRECEDENCE_VIOLATION",
            ApiError::MachineConflict { .. } => "MACHINE_CONFLICT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为内部错误（存储/锁），区别于校验类错误
    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::DatabaseError(_) | ApiError::InternalError(_))
    }

    /// 规则相关的上下文字段（不含 `error` / `code`）
    pub fn context(&self) -> Map<String, Value> {
        let value = match self {
            ApiError::InvalidRange { start, end } => json!({
                "start": to_utc_z(start),
                "end": to_utc_z(end),
            }),
            ApiError::PastStart { now, start } => json!({
                "nowUtc": to_utc_z(now),
                "start": to_utc_z(start),
            }),
            ApiError::PrecedenceViolation(ScheduleConflict::PrecedencePrevious {
                previous_op_id,
                previous_end,
            }) => json!({
                "previousOpId": previous_op_id,
                "previousEnd": to_utc_z(previous_end),
            }),
            ApiError::PrecedenceViolation(ScheduleConflict::PrecedenceNext {
                next_op_id,
                next_start,
            }) => json!({
                "nextOpId": next_op_id,
                "nextStart": to_utc_z(next_start),
            }),
            ApiError::MachineConflict {
                overlap_op_id,
                overlap_start,
                overlap_end,
                ..
            } => json!({
                "overlapOpId": overlap_op_id,
                "overlapStart": to_utc_z(overlap_start),
                "overlapEnd": to_utc_z(overlap_end),
            }),
            _ => Value::Null,
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn precedence_message(conflict: &ScheduleConflict) -> &'static str {
    match conflict {
        ScheduleConflict::PrecedenceNext { .. } => "Must end before next operation starts",
        _ => "Precedence violation: must start at or after previous operation ends",
    }
}

// ==========================================
// 从 Engine 冲突结论转换
// ==========================================
impl From<ScheduleConflict> for ApiError {
    fn from(conflict: ScheduleConflict) -> Self {
        match conflict {
            ScheduleConflict::MachineOverlap {
                machine_id,
                overlap_op_id,
                overlap_start,
                overlap_end,
            } => ApiError::MachineConflict {
                machine_id,
                overlap_op_id,
                overlap_start,
                overlap_end,
            },
            precedence => ApiError::PrecedenceViolation(precedence),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { id, .. } => ApiError::NotFound(id),
            RepositoryError::LockError(msg) => {
                ApiError::InternalError(format!("数据库锁获取失败: {}", msg))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
