// ==========================================
// 工单排程校验服务 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 显式传递，不使用全局单例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{OperationApi, WorkOrderApi};
use crate::db::{configure_sqlite_connection, migrate, open_sqlite_connection};
use crate::engine::{ConflictChecker, ScheduleLockRegistry};
use crate::repository::{OperationRepository, WorkOrderRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源，由 HTTP 路由以 `Arc<AppState>` 共享
pub struct AppState {
    /// 工单查询API
    pub work_order_api: Arc<WorkOrderApi>,

    /// 工序调整API
    pub operation_api: Arc<OperationApi>,

    /// 工单仓储（用于种子导入/测试数据准备）
    pub work_order_repo: Arc<WorkOrderRepository>,

    /// 工序仓储
    pub operation_repo: Arc<OperationRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并应用内置 schema
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: &str) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        migrate(&conn).map_err(|e| format!("数据库 schema 初始化失败: {}", e))?;

        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&guard).map_err(|e| format!("连接配置失败: {}", e))?;
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let work_order_repo = Arc::new(WorkOrderRepository::new(conn.clone()));
        let operation_repo = Arc::new(OperationRepository::new(conn));

        // ==========================================
        // 初始化Engine层与API层
        // ==========================================
        let lock_registry = Arc::new(ScheduleLockRegistry::new());

        let work_order_api = Arc::new(WorkOrderApi::new(
            work_order_repo.clone(),
            operation_repo.clone(),
        ));
        let operation_api = Arc::new(OperationApi::new(
            operation_repo.clone(),
            ConflictChecker::new(),
            lock_registry,
        ));

        tracing::info!("AppState初始化成功");

        Ok(Self {
            work_order_api,
            operation_api,
            work_order_repo,
            operation_repo,
        })
    }
}
