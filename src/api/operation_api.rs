// ==========================================
// 工单排程校验服务 - 工序调整 API
// ==========================================
// 职责: 编排"归一化 → 时间窗校验 → 冲突校验 → 持久化"
// 红线: 任一关卡失败立即返回，失败时零写入；成功时恰好写入一行
// ==========================================

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::api::dto::{OperationUpdated, UpdateOperationRequest, UPDATE_SUCCESS_MESSAGE};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::timestamp::{normalize, TimestampError};
use crate::engine::conflict_checker::{ConflictChecker, ConflictVerdict};
use crate::engine::schedule_lock::{LaneKey, ScheduleLockRegistry};
use crate::repository::OperationRepository;

// ==========================================
// OperationApi - 工序调整 API
// ==========================================
pub struct OperationApi {
    operation_repo: Arc<OperationRepository>,
    conflict_checker: ConflictChecker,
    lock_registry: Arc<ScheduleLockRegistry>,
}

impl OperationApi {
    /// 创建新的OperationApi实例
    pub fn new(
        operation_repo: Arc<OperationRepository>,
        conflict_checker: ConflictChecker,
        lock_registry: Arc<ScheduleLockRegistry>,
    ) -> Self {
        Self {
            operation_repo,
            conflict_checker,
            lock_registry,
        }
    }

    /// 调整工序时间窗（以当前服务器时间为 now）
    pub fn update_operation(
        &self,
        op_id: &str,
        request: &UpdateOperationRequest,
    ) -> ApiResult<OperationUpdated> {
        self.update_operation_at(op_id, request, Utc::now())
    }

    /// 调整工序时间窗（now 由调用方采样，每个请求只采样一次）
    ///
    /// # 关卡（按顺序，首个失败即返回）
    /// 1. 工序存在 → NotFound
    /// 2. start/end 均已提供 → MissingField
    /// 3. 时间戳可解析且带时区 → InvalidTimestamp
    /// 4. end > start → InvalidRange
    /// 5. start >= now → PastStart
    /// 6. 冲突校验 → PrecedenceViolation / MachineConflict
    /// 7. 单事务写入
    ///
    /// 业务规则拒绝（非内部错误）统一以 info 级别记录工序 id 与规则码。
    pub fn update_operation_at(
        &self,
        op_id: &str,
        request: &UpdateOperationRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<OperationUpdated> {
        self.apply_update(op_id, request, now).map_err(|e| {
            if !e.is_internal() {
                tracing::info!(op_id, rule = e.code(), error = %e, "工序调整被拒绝");
            }
            e
        })
    }

    fn apply_update(
        &self,
        op_id: &str,
        request: &UpdateOperationRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<OperationUpdated> {
        // 1. 工序存在
        let operation = self
            .operation_repo
            .find_by_id(op_id)?
            .ok_or_else(|| ApiError::NotFound(op_id.to_string()))?;

        // 2. 必填字段
        let (raw_start, raw_end) = match (
            present(request.start.as_ref()),
            present(request.end.as_ref()),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(ApiError::MissingField),
        };

        // 3. 归一化
        let new_start = normalize_field("start", raw_start)?;
        let new_end = normalize_field("end", raw_end)?;

        // 4. 时间窗
        if new_end <= new_start {
            return Err(ApiError::InvalidRange {
                start: new_start,
                end: new_end,
            });
        }

        // 5. 不得早于当前时间
        if new_start < now {
            return Err(ApiError::PastStart {
                now,
                start: new_start,
            });
        }

        // 6-7. 在机器/工单通道锁内完成"校验 → 写入"
        let lanes = [
            LaneKey::machine(&operation.machine_id),
            LaneKey::work_order(&operation.work_order_id),
        ];
        self.lock_registry.with_lanes(&lanes, || -> ApiResult<()> {
            // 持锁后重新读取，确保基于最新已提交数据校验
            let current = self
                .operation_repo
                .find_by_id(op_id)?
                .ok_or_else(|| ApiError::NotFound(op_id.to_string()))?;

            match self
                .conflict_checker
                .check(self.operation_repo.as_ref(), &current, &new_start, &new_end)?
            {
                ConflictVerdict::Clear => {}
                ConflictVerdict::Rejected(conflict) => return Err(ApiError::from(conflict)),
            }

            self.operation_repo
                .update_window(op_id, &new_start, &new_end)?;
            Ok(())
        })??;

        tracing::info!(
            op_id,
            machine_id = %operation.machine_id,
            work_order_id = %operation.work_order_id,
            "工序时间窗已更新"
        );

        Ok(OperationUpdated {
            message: UPDATE_SUCCESS_MESSAGE.to_string(),
            id: operation.id,
            start: new_start,
            end: new_end,
        })
    }
}

/// 缺失、null、空串均视为未提供
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}

fn normalize_field(field: &'static str, value: &Value) -> ApiResult<DateTime<Utc>> {
    let result = match value {
        Value::String(raw) => normalize(raw),
        other => Err(TimestampError::Malformed(other.to_string())),
    };
    result.map_err(|reason| {
        tracing::debug!(field, %reason, "时间戳校验失败");
        ApiError::InvalidTimestamp { field, reason }
    })
}
