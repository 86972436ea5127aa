// ==========================================
// 工单排程校验服务 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 处理器调用
// ==========================================

pub mod dto;
pub mod error;
pub mod operation_api;
pub mod work_order_api;

// 重导出核心类型
pub use dto::{OperationUpdated, ServerTime, UpdateOperationRequest, WorkOrderView};
pub use error::{ApiError, ApiResult};
pub use operation_api::OperationApi;
pub use work_order_api::WorkOrderApi;
