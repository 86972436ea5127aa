// ==========================================
// 工单排程校验服务 - 领域模型层
// ==========================================
// 职责: 定义领域实体与时间归一化规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod timestamp;
pub mod work_order;

// 重导出核心类型
pub use timestamp::{normalize, to_utc_z, TimestampError};
pub use work_order::{Operation, WorkOrder};
