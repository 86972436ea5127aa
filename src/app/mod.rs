// ==========================================
// 工单排程校验服务 - 应用层
// ==========================================
// 职责: HTTP 集成,连接前端与后端
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::router;
pub use state::AppState;
