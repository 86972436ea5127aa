// ==========================================
// 工单排程校验服务 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 甘特图拖拽调整的服务端规则校验
// (工序先后顺序 / 机台独占)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与时间戳
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排程规则与串行化
pub mod engine;

// 导入层 - 种子数据
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{normalize, to_utc_z, Operation, TimestampError, WorkOrder};

// 引擎
pub use engine::{ConflictChecker, ConflictVerdict, ScheduleConflict, ScheduleLockRegistry};

// API
pub use api::{ApiError, OperationApi, WorkOrderApi};

// 应用
pub use app::{router, AppState};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Factory Gantt API";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "Factory Gantt API");
    }
}
