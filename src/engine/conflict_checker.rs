// ==========================================
// 工单排程校验服务 - 冲突校验引擎
// ==========================================
// 职责: 对工序的新时间窗执行两条排程规则
//   R1 工序先后: 只与当前直接前驱/后继比较
//   R2 机器独占: 同一机器上（跨全部工单）时间窗不得重叠
// 红线: Engine 不拼 SQL, 所有拒绝必须输出可解释的原因
// 前置条件(由调用方保证): new_end > new_start, new_start >= now
// ==========================================

use chrono::{DateTime, Utc};

use crate::domain::work_order::Operation;
use crate::repository::error::RepositoryResult;

// ==========================================
// ScheduleLookup - 排程只读查询接口
// ==========================================
/// 冲突校验所需的只读查询
///
/// Engine 层定义 trait，Repository 层实现（依赖倒置），测试可用内存实现替换。
pub trait ScheduleLookup {
    /// 工单下全部工序，按 index 升序
    fn operations_in_work_order(&self, work_order_id: &str) -> RepositoryResult<Vec<Operation>>;

    /// 同机器上与 [start, end) 重叠的第一条工序（排除 exclude_op_id）
    fn first_machine_overlap(
        &self,
        machine_id: &str,
        exclude_op_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> RepositoryResult<Option<Operation>>;
}

// ==========================================
// ScheduleConflict - 拒绝原因
// ==========================================
/// 冲突原因（带结构化上下文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleConflict {
    /// R1: 新开始时间早于前驱工序结束
    PrecedencePrevious {
        previous_op_id: String,
        previous_end: DateTime<Utc>,
    },

    /// R1: 新结束时间晚于后继工序开始
    PrecedenceNext {
        next_op_id: String,
        next_start: DateTime<Utc>,
    },

    /// R2: 与同机器上的其他工序重叠
    MachineOverlap {
        machine_id: String,
        overlap_op_id: String,
        overlap_start: DateTime<Utc>,
        overlap_end: DateTime<Utc>,
    },
}

/// 校验结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictVerdict {
    Clear,
    Rejected(ScheduleConflict),
}

// ==========================================
// ConflictChecker - 冲突校验引擎
// ==========================================
/// 冲突校验引擎（无状态，纯读取与判定，无副作用）
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictChecker;

impl ConflictChecker {
    pub fn new() -> Self {
        Self
    }

    /// 校验工序的新时间窗
    ///
    /// 先执行 R1，再执行 R2；任一规则命中即返回 `Rejected`。
    /// 存储错误原样向上传播。
    pub fn check<L: ScheduleLookup + ?Sized>(
        &self,
        lookup: &L,
        op: &Operation,
        new_start: &DateTime<Utc>,
        new_end: &DateTime<Utc>,
    ) -> RepositoryResult<ConflictVerdict> {
        if let Some(conflict) = self.check_precedence(lookup, op, new_start, new_end)? {
            return Ok(ConflictVerdict::Rejected(conflict));
        }

        if let Some(conflict) = self.check_machine_exclusivity(lookup, op, new_start, new_end)? {
            return Ok(ConflictVerdict::Rejected(conflict));
        }

        Ok(ConflictVerdict::Clear)
    }

    /// R1: 工序先后
    ///
    /// 在按 index 排序的列表中按 id 定位工序自身，取直接前驱/后继比较。
    /// 不做传递性检查，也不因新时间窗重新排序。
    pub fn check_precedence<L: ScheduleLookup + ?Sized>(
        &self,
        lookup: &L,
        op: &Operation,
        new_start: &DateTime<Utc>,
        new_end: &DateTime<Utc>,
    ) -> RepositoryResult<Option<ScheduleConflict>> {
        let ordered = lookup.operations_in_work_order(&op.work_order_id)?;

        let position = match ordered.iter().position(|o| o.id == op.id) {
            Some(p) => p,
            None => return Ok(None),
        };

        if let Some(prev) = position.checked_sub(1).and_then(|i| ordered.get(i)) {
            if *new_start < prev.end {
                return Ok(Some(ScheduleConflict::PrecedencePrevious {
                    previous_op_id: prev.id.clone(),
                    previous_end: prev.end,
                }));
            }
        }

        if let Some(next) = ordered.get(position + 1) {
            if *new_end > next.start {
                return Ok(Some(ScheduleConflict::PrecedenceNext {
                    next_op_id: next.id.clone(),
                    next_start: next.start,
                }));
            }
        }

        Ok(None)
    }

    /// R2: 机器独占（跨全部工单）
    pub fn check_machine_exclusivity<L: ScheduleLookup + ?Sized>(
        &self,
        lookup: &L,
        op: &Operation,
        new_start: &DateTime<Utc>,
        new_end: &DateTime<Utc>,
    ) -> RepositoryResult<Option<ScheduleConflict>> {
        let overlap = lookup.first_machine_overlap(&op.machine_id, &op.id, new_start, new_end)?;

        Ok(overlap.map(|other| ScheduleConflict::MachineOverlap {
            machine_id: op.machine_id.clone(),
            overlap_op_id: other.id,
            overlap_start: other.start,
            overlap_end: other.end,
        }))
    }
}
