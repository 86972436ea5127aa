// ==========================================
// 工单排程校验服务 - 引擎层
// ==========================================
// 职责: 实现排程规则校验,不拼 SQL
// 红线: Engine 不拼 SQL, 所有规则必须输出 reason
// ==========================================

pub mod conflict_checker;
pub mod schedule_lock;

// 重导出核心引擎
pub use conflict_checker::{ConflictChecker, ConflictVerdict, ScheduleConflict, ScheduleLookup};
pub use schedule_lock::{LaneKey, LockError, ScheduleLockRegistry};
